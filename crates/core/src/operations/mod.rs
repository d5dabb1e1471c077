//! Operations module - trades and their per-operation cost.

mod operation_cost;
mod operations_model;

pub use operation_cost::build_operation_cost;
pub use operations_model::{NewOperation, Operation, OperationCost};
