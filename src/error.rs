//! Error types for marketplace client operations.
//!
//! Every failure surfaces to the immediate caller. Nothing is retried
//! or swallowed inside the client.

use thiserror::Error;

use crate::domain::operation::Operation;
use crate::ports::transport::TransportError;

/// Main error type for client operations.
#[derive(Debug, Error)]
pub enum MarketplaceError {
    /// Missing or unusable credentials. Raised at construction.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network or HTTP failure, passed through unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Malformed envelope or a required element missing.
    #[error("failed to parse {operation} response at {path}: {message}")]
    Parse {
        operation: Operation,
        /// Element path that could not be resolved.
        path: String,
        message: String,
    },

    /// Well-formed envelope flagged invalid by the marketplace.
    #[error("{operation} rejected by marketplace ({code}): {message}")]
    Rejected {
        operation: Operation,
        code: String,
        message: String,
    },

    /// A composed operation's precondition was not met.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

/// Preconditions of multi-step operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// No worker has accepted the task yet.
    #[error("task {task_id} has no accepted assignment")]
    NoAssignment { task_id: String },
}

impl MarketplaceError {
    pub(crate) fn parse(
        operation: Operation,
        path: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        Self::Parse {
            operation,
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Short label used for the `outcome` metric dimension.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Transport(_) => "transport",
            Self::Parse { .. } => "parse",
            Self::Rejected { .. } => "rejected",
            Self::Workflow(_) => "workflow",
        }
    }
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, MarketplaceError>;
