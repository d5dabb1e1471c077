use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};
use crate::fx::UsdValueWithFx;
use crate::prices::normalize_ticker;

/// A brokerage trade in ARS. Positive quantities are buys.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub trade_date: NaiveDate,
    pub ticker: String,
    pub quantity: Decimal,
    pub price_ars: Decimal,
    #[serde(default)]
    pub fees_ars: Option<Decimal>,
}

impl Operation {
    /// Quantity × price plus fees; absent fees count as zero.
    pub fn ars_cost(&self) -> Decimal {
        self.quantity * self.price_ars + self.fees_ars.unwrap_or(Decimal::ZERO)
    }
}

/// Operation as submitted by a caller, before validation.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewOperation {
    pub ticker: String,
    pub quantity: Decimal,
    pub price_ars: Decimal,
    pub fees_ars: Option<Decimal>,
    pub operation_date: NaiveDate,
}

impl NewOperation {
    /// Checks the operation and returns it with a normalized ticker.
    pub fn validate(self) -> Result<Operation> {
        let ticker = normalize_ticker(self.ticker.trim());
        if ticker.is_empty() {
            return Err(ValidationError::MissingField("ticker".to_string()).into());
        }
        if self.quantity.is_zero() {
            return Err(
                ValidationError::InvalidInput(format!("Quantity for {} is zero", ticker)).into(),
            );
        }
        if self.price_ars <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "Price for {} must be positive, got {}",
                ticker, self.price_ars
            ))
            .into());
        }
        if let Some(fees) = self.fees_ars {
            if fees < Decimal::ZERO {
                return Err(ValidationError::InvalidInput(format!(
                    "Fees for {} must not be negative, got {}",
                    ticker, fees
                ))
                .into());
            }
        }

        Ok(Operation {
            trade_date: self.operation_date,
            ticker,
            quantity: self.quantity,
            price_ars: self.price_ars,
            fees_ars: self.fees_ars,
        })
    }
}

/// Cost of one operation in ARS and, when a historical quote applied, in each USD methodology.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OperationCost {
    pub operation: Operation,
    pub ars_cost: Decimal,
    pub usd_cost_mep: Option<UsdValueWithFx>,
    pub usd_cost_ccl: Option<UsdValueWithFx>,
    pub is_complete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn new_operation(ticker: &str, quantity: Decimal, price: Decimal) -> NewOperation {
        NewOperation {
            ticker: ticker.to_string(),
            quantity,
            price_ars: price,
            fees_ars: None,
            operation_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        }
    }

    #[test]
    fn test_ars_cost_includes_fees() {
        let mut operation = new_operation("ko", dec!(3), dec!(250.5)).validate().unwrap();
        assert_eq!(operation.ars_cost(), dec!(751.5));
        operation.fees_ars = Some(dec!(8.25));
        assert_eq!(operation.ars_cost(), dec!(759.75));
    }

    #[test]
    fn test_validate_normalizes_ticker() {
        let operation = new_operation("  meli ", dec!(1), dec!(10)).validate().unwrap();
        assert_eq!(operation.ticker, "MELI");
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        assert!(new_operation("   ", dec!(1), dec!(10)).validate().is_err());
        assert!(new_operation("KO", dec!(0), dec!(10)).validate().is_err());
        assert!(new_operation("KO", dec!(1), dec!(0)).validate().is_err());

        let mut negative_fees = new_operation("KO", dec!(1), dec!(10));
        negative_fees.fees_ars = Some(dec!(-1));
        assert!(negative_fees.validate().is_err());
    }

    #[test]
    fn test_sells_are_valid_operations() {
        let operation = new_operation("KO", dec!(-2), dec!(10)).validate().unwrap();
        assert_eq!(operation.quantity, dec!(-2));
    }
}
