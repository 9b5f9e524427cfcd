//! Result records decoded from marketplace responses.
//!
//! These are plain data carriers. Decoding lives in
//! `adapters::api::parser`; nothing here talks to the network.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier of a task (HIT).
pub type TaskId = String;

/// Identifier of an assignment.
pub type AssignmentId = String;

/// A task as reported by the marketplace.
///
/// Listings only carry the identifier; `GetHIT` fills the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: TaskId,
    pub task_type_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub max_assignments: Option<u32>,
    pub reward: Option<Decimal>,
}

impl TaskRecord {
    /// A record carrying only an identifier.
    pub fn with_id(task_id: impl Into<TaskId>) -> Self {
        Self {
            task_id: task_id.into(),
            task_type_id: None,
            title: None,
            description: None,
            status: None,
            max_assignments: None,
            reward: None,
        }
    }
}

/// The record created when a worker accepts a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub assignment_id: AssignmentId,
    /// Task the assignment was accepted against.
    pub task_id: TaskId,
    pub worker_id: Option<String>,
    /// `Submitted`, `Approved` or `Rejected`.
    pub status: Option<String>,
    /// Raw answer document as submitted by the worker.
    pub answer: Option<String>,
}

/// Available prepaid balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub amount: Decimal,
    pub currency_code: Option<String>,
    /// Display form, e.g. `$10.00`.
    pub formatted_price: String,
}

/// Balance in the form the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Balance {
    /// Pre-formatted display string.
    Formatted(String),
    /// Raw numeric amount.
    Amount(Decimal),
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Formatted(text) => f.write_str(text),
            Self::Amount(amount) => write!(f, "{amount}"),
        }
    }
}
