//! Marketplace operation names.
//!
//! Every request carries exactly one operation name, both as the
//! `Operation` query parameter and as part of the signed message.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One remote procedure exposed by the requester API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Publish a new task (HIT).
    CreateHit,
    /// List tasks with submitted work awaiting review.
    GetReviewableHits,
    /// List the assignments accepted against one task.
    GetAssignmentsForHit,
    /// Fetch the full description of one task.
    GetHit,
    /// Approve (and pay) a submitted assignment.
    ApproveAssignment,
    /// Remove a reviewed task from the marketplace.
    DisposeHit,
    /// Read the requester's prepaid balance.
    GetAccountBalance,
}

impl Operation {
    /// Wire name, as sent in the `Operation` parameter.
    pub const fn name(self) -> &'static str {
        match self {
            Self::CreateHit => "CreateHIT",
            Self::GetReviewableHits => "GetReviewableHITs",
            Self::GetAssignmentsForHit => "GetAssignmentsForHIT",
            Self::GetHit => "GetHIT",
            Self::ApproveAssignment => "ApproveAssignment",
            Self::DisposeHit => "DisposeHIT",
            Self::GetAccountBalance => "GetAccountBalance",
        }
    }

    /// Name of the envelope's root element.
    pub fn response_element(self) -> String {
        format!("{}Response", self.name())
    }

    /// Name of the result element wrapped by the envelope.
    pub fn result_element(self) -> String {
        format!("{}Result", self.name())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
