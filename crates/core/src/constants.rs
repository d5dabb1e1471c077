/// Decimal precision for displayed ARS and USD amounts
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Decimal precision for displayed dollar rates
pub const RATE_DECIMAL_PRECISION: u32 = 6;

/// Source label for records entered by hand
pub const SOURCE_MANUAL: &str = "manual";
