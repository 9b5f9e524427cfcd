//! Task creation defaults and per-call overrides.
//!
//! `OperationDefaults` is set once when the client is built and never
//! mutated afterwards. Each `CreateHIT` call merges its `TaskOverrides`
//! into a fresh resolved value via [`OperationDefaults::merge`].

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Process-wide defaults used when creating tasks.
///
/// Deserialized from the `[defaults]` table of `config.toml`; any key
/// missing from the table keeps its stock value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationDefaults {
    /// Task title shown to workers.
    pub title: String,
    /// Longer description shown to workers.
    pub description: String,
    /// Search keywords, sent joined by `", "`.
    pub keywords: Vec<String>,
    /// Payment per assignment.
    pub reward: Decimal,
    /// ISO currency code of the reward.
    pub reward_currency: String,
    /// Time a worker has to complete the task once accepted.
    pub duration_seconds: u64,
    /// Time the task stays listed before expiring unaccepted.
    pub lifetime_seconds: u64,
    /// Delay after submission before the work is auto-approved.
    pub auto_approve_delay_seconds: u64,
    /// Minimum approval percentage a worker must hold to qualify.
    pub min_approval_percentage: u32,
    /// Number of distinct workers that may complete the task.
    pub max_assignments: u32,
    /// Private note attached to the task, never shown to workers.
    pub requester_annotation: Option<String>,
}

impl Default for OperationDefaults {
    fn default() -> Self {
        Self {
            title: "My default title".to_string(),
            description: "My default description".to_string(),
            keywords: vec![
                "some".to_string(),
                "descriptive".to_string(),
                "keywords".to_string(),
            ],
            reward: dec!(0.02),
            reward_currency: "USD".to_string(),
            duration_seconds: 180,
            lifetime_seconds: 86_400,
            auto_approve_delay_seconds: 86_400,
            min_approval_percentage: 90,
            max_assignments: 1,
            requester_annotation: None,
        }
    }
}

/// Per-call overrides for a task creation.
///
/// A field takes effect only when it is `Some` and, for text and lists,
/// non-empty. Everything else falls back to the client's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskOverrides {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub reward: Option<Decimal>,
    pub reward_currency: Option<String>,
    pub duration_seconds: Option<u64>,
    pub lifetime_seconds: Option<u64>,
    pub auto_approve_delay_seconds: Option<u64>,
    pub min_approval_percentage: Option<u32>,
    pub max_assignments: Option<u32>,
    pub requester_annotation: Option<String>,
}

impl TaskOverrides {
    /// Override the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Override the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Override the keyword list.
    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = Some(keywords.into_iter().map(Into::into).collect());
        self
    }

    /// Override the reward amount.
    pub const fn reward(mut self, reward: Decimal) -> Self {
        self.reward = Some(reward);
        self
    }

    /// Override the lifetime.
    pub const fn lifetime_seconds(mut self, seconds: u64) -> Self {
        self.lifetime_seconds = Some(seconds);
        self
    }

    /// Override the qualification threshold.
    pub const fn min_approval_percentage(mut self, percentage: u32) -> Self {
        self.min_approval_percentage = Some(percentage);
        self
    }

    /// Override the number of assignments.
    pub const fn max_assignments(mut self, count: u32) -> Self {
        self.max_assignments = Some(count);
        self
    }

    /// Attach a requester annotation.
    pub fn requester_annotation(mut self, note: impl Into<String>) -> Self {
        self.requester_annotation = Some(note.into());
        self
    }
}

impl OperationDefaults {
    /// Resolve `overrides` against these defaults into a new value.
    ///
    /// `self` is left untouched.
    pub fn merge(&self, overrides: &TaskOverrides) -> Self {
        Self {
            title: pick_text(overrides.title.as_deref(), &self.title),
            description: pick_text(overrides.description.as_deref(), &self.description),
            keywords: match &overrides.keywords {
                Some(keywords) if !keywords.is_empty() => keywords.clone(),
                _ => self.keywords.clone(),
            },
            reward: overrides.reward.unwrap_or(self.reward),
            reward_currency: pick_text(
                overrides.reward_currency.as_deref(),
                &self.reward_currency,
            ),
            duration_seconds: overrides.duration_seconds.unwrap_or(self.duration_seconds),
            lifetime_seconds: overrides.lifetime_seconds.unwrap_or(self.lifetime_seconds),
            auto_approve_delay_seconds: overrides
                .auto_approve_delay_seconds
                .unwrap_or(self.auto_approve_delay_seconds),
            min_approval_percentage: overrides
                .min_approval_percentage
                .unwrap_or(self.min_approval_percentage),
            max_assignments: overrides.max_assignments.unwrap_or(self.max_assignments),
            requester_annotation: match overrides.requester_annotation.as_deref() {
                Some(note) if !note.is_empty() => Some(note.to_string()),
                _ => self.requester_annotation.clone(),
            },
        }
    }

    /// Keywords in their wire form.
    pub fn joined_keywords(&self) -> String {
        self.keywords.join(", ")
    }
}

fn pick_text(candidate: Option<&str>, fallback: &str) -> String {
    match candidate {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => fallback.to_string(),
    }
}
