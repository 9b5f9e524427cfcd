//! Domain layer - Core marketplace types.
//!
//! Pure data: operations, task defaults and the records decoded from
//! responses. No I/O happens here.

pub mod defaults;
pub mod operation;
pub mod task;

// Re-export core types for convenience
pub use defaults::{OperationDefaults, TaskOverrides};
pub use operation::Operation;
pub use task::{AssignmentRecord, Balance, BalanceRecord, TaskRecord};
