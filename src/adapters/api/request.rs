//! Signed Request Construction
//!
//! A request is an ordered list of `(key, value)` pairs assembled by
//! pure functions and rendered to a query string in one serialization
//! step. Text values are percent-encoded exactly once at that step;
//! values that are already URL-safe (numbers, the signature, the
//! caller's pre-encoded question) are marked `Encoded` and emitted
//! verbatim.

use std::borrow::Cow;
use std::sync::Arc;

use tracing::debug;

use super::auth::CredentialSigner;
use crate::domain::defaults::{OperationDefaults, TaskOverrides};
use crate::domain::operation::Operation;
use crate::ports::clock::{format_timestamp, Clock};

/// Qualification type id of the "percent assignments approved" system
/// qualification.
pub const APPROVAL_RATE_QUALIFICATION: &str = "000000000000000000L0";

/// Comparator used for the approval-rate requirement.
pub const APPROVAL_RATE_COMPARATOR: &str = "GreaterThan";

/// Form-encode a value for a query string.
///
/// Alphanumerics and `*-._` pass through, space becomes `+`,
/// everything else `%XX`.
pub fn percent_encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// One query parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// Free text; encoded during serialization.
    Text(String),
    /// Already URL-safe; emitted as-is.
    Encoded(String),
}

impl QueryValue {
    /// Free-text value.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Numeric value; always URL-safe.
    pub fn number(value: impl ToString) -> Self {
        Self::Encoded(value.to_string())
    }

    /// Wire form of the value.
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Self::Text(raw) => Cow::Owned(percent_encode(raw)),
            Self::Encoded(safe) => Cow::Borrowed(safe),
        }
    }
}

/// Ordered operation-specific parameters.
pub type Fields = Vec<(&'static str, QueryValue)>;

/// A fully signed request, built fresh for every call.
///
/// The timestamp and signature are produced together by
/// [`RequestBuilder::build`] and cannot be replaced afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    operation: Operation,
    timestamp: String,
    signature: String,
    parameters: Fields,
}

impl SignedRequest {
    pub const fn operation(&self) -> Operation {
        self.operation
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Percent-encoded signature, as sent.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// All parameters in wire order.
    pub fn parameters(&self) -> &[(&'static str, QueryValue)] {
        &self.parameters
    }

    /// First value for `key`, if any.
    pub fn parameter(&self, key: &str) -> Option<&QueryValue> {
        self.parameters
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Render the query string (without leading `?`).
    pub fn query_string(&self) -> String {
        let mut query = String::new();
        for (i, (key, value)) in self.parameters.iter().enumerate() {
            if i > 0 {
                query.push('&');
            }
            query.push_str(key);
            query.push('=');
            query.push_str(&value.render());
        }
        query
    }

    /// Full URL against `endpoint`.
    pub fn url(&self, endpoint: &str) -> String {
        let separator = if endpoint.contains('?') {
            if endpoint.ends_with('?') || endpoint.ends_with('&') {
                ""
            } else {
                "&"
            }
        } else {
            "?"
        };
        format!("{endpoint}{separator}{}", self.query_string())
    }
}

/// Builds signed requests from credentials, defaults and a clock.
pub struct RequestBuilder {
    signer: CredentialSigner,
    service: String,
    defaults: OperationDefaults,
    clock: Arc<dyn Clock>,
}

impl RequestBuilder {
    /// Create a builder.
    pub fn new(
        signer: CredentialSigner,
        service: impl Into<String>,
        defaults: OperationDefaults,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            signer,
            service: service.into(),
            defaults,
            clock,
        }
    }

    /// Defaults applied to task creation.
    pub const fn defaults(&self) -> &OperationDefaults {
        &self.defaults
    }

    /// Sign `operation` at the current instant and attach `fields`.
    ///
    /// Parameter order: access key, operation, signature, timestamp,
    /// then `fields` in the given order.
    pub fn build(&self, operation: Operation, fields: Fields) -> SignedRequest {
        let timestamp = format_timestamp(self.clock.now());
        let signature = self.signer.sign(&self.service, operation.name(), &timestamp);

        let mut parameters = Vec::with_capacity(4 + fields.len());
        parameters.push((
            "AWSAccessKeyId",
            QueryValue::text(self.signer.credentials().access_key()),
        ));
        parameters.push(("Operation", QueryValue::Encoded(operation.name().to_string())));
        parameters.push(("Signature", QueryValue::Encoded(signature.clone())));
        parameters.push(("Timestamp", QueryValue::text(timestamp.clone())));
        parameters.extend(fields);

        debug!(
            operation = %operation,
            timestamp = %timestamp,
            parameters = parameters.len(),
            "Built signed request"
        );

        SignedRequest {
            operation,
            timestamp,
            signature,
            parameters,
        }
    }

    /// Build a `CreateHIT` request for a pre-encoded question.
    pub fn create_task(&self, question: &str, overrides: &TaskOverrides) -> SignedRequest {
        let resolved = self.defaults.merge(overrides);
        self.build(Operation::CreateHit, create_task_fields(&resolved, question))
    }
}

/// `CreateHIT` fields for already-resolved settings.
///
/// `question` must already be percent-encoded by the caller.
pub fn create_task_fields(resolved: &OperationDefaults, question: &str) -> Fields {
    let mut fields: Fields = vec![
        ("Title", QueryValue::text(&resolved.title)),
        ("Description", QueryValue::text(&resolved.description)),
        ("Reward.1.Amount", QueryValue::number(resolved.reward)),
        ("Reward.1.CurrencyCode", QueryValue::text(&resolved.reward_currency)),
        ("Question", QueryValue::Encoded(question.to_string())),
        (
            "AssignmentDurationInSeconds",
            QueryValue::number(resolved.duration_seconds),
        ),
        (
            "AutoApprovalDelayInSeconds",
            QueryValue::number(resolved.auto_approve_delay_seconds),
        ),
        (
            "QualificationRequirement.1.QualificationTypeId",
            QueryValue::Encoded(APPROVAL_RATE_QUALIFICATION.to_string()),
        ),
        (
            "QualificationRequirement.1.Comparator",
            QueryValue::Encoded(APPROVAL_RATE_COMPARATOR.to_string()),
        ),
        (
            "QualificationRequirement.1.IntegerValue",
            QueryValue::number(resolved.min_approval_percentage),
        ),
        ("LifetimeInSeconds", QueryValue::number(resolved.lifetime_seconds)),
        ("Keywords", QueryValue::text(resolved.joined_keywords())),
        ("MaxAssignments", QueryValue::number(resolved.max_assignments)),
    ];

    if let Some(note) = &resolved.requester_annotation {
        fields.push(("RequesterAnnotation", QueryValue::text(note)));
    }

    fields
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::adapters::api::auth::{Credentials, MTURK_SERVICE};
    use crate::ports::clock::FixedClock;

    fn builder(defaults: OperationDefaults) -> RequestBuilder {
        let creds = Credentials::new("AKIDEXAMPLE", "secret").unwrap();
        let clock = FixedClock(Utc.with_ymd_and_hms(2011, 5, 1, 12, 0, 0).unwrap());
        RequestBuilder::new(
            CredentialSigner::new(creds).unwrap(),
            MTURK_SERVICE,
            defaults,
            Arc::new(clock),
        )
    }

    #[test]
    fn test_percent_encode_matches_form_encoding() {
        assert_eq!(percent_encode("a b&c"), "a+b%26c");
        assert_eq!(percent_encode("x+y/z="), "x%2By%2Fz%3D");
        assert_eq!(percent_encode("safe-_.*09AZ"), "safe-_.*09AZ");
    }

    #[test]
    fn test_common_prefix_order() {
        let request =
            builder(OperationDefaults::default()).build(Operation::GetAccountBalance, vec![]);
        let keys: Vec<&str> = request.parameters().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, ["AWSAccessKeyId", "Operation", "Signature", "Timestamp"]);
        assert_eq!(
            request.query_string(),
            "AWSAccessKeyId=AKIDEXAMPLE&Operation=GetAccountBalance\
             &Signature=ROzH80Q9t8bo5%2FowSugFpZ%2FqYfY%3D&Timestamp=2011-05-01T12%3A00%3A00Z"
        );
    }

    #[test]
    fn test_signature_covers_service_operation_timestamp() {
        let request = builder(OperationDefaults::default()).build(Operation::CreateHit, vec![]);
        assert_eq!(request.timestamp(), "2011-05-01T12:00:00Z");
        assert_eq!(request.signature(), "BMknVdz0WYQ8ZOmna7ZCJI3pZtQ%3D");
    }

    #[test]
    fn test_create_task_from_defaults_only() {
        let defaults = OperationDefaults {
            title: "T".to_string(),
            reward: dec!(0.02),
            reward_currency: "USD".to_string(),
            min_approval_percentage: 90,
            ..OperationDefaults::default()
        };
        let request = builder(defaults).create_task("%3CQuestion%2F%3E", &TaskOverrides::default());
        let query = request.query_string();

        assert!(query.contains("&Title=T&"));
        assert!(query.contains("&Reward.1.Amount=0.02&"));
        assert!(query.contains("&Reward.1.CurrencyCode=USD&"));
        assert!(query.contains(
            "&QualificationRequirement.1.QualificationTypeId=000000000000000000L0\
             &QualificationRequirement.1.Comparator=GreaterThan\
             &QualificationRequirement.1.IntegerValue=90&"
        ));
        assert!(query.contains("&Keywords=some%2C+descriptive%2C+keywords&"));
        assert!(query.ends_with("&MaxAssignments=1"));
    }

    #[test]
    fn test_question_blob_is_not_double_encoded() {
        let encoded = percent_encode("<Question>a b</Question>");
        let request = builder(OperationDefaults::default())
            .create_task(&encoded, &TaskOverrides::default());
        assert!(request
            .query_string()
            .contains("&Question=%3CQuestion%3Ea+b%3C%2FQuestion%3E&"));
    }

    #[test]
    fn test_overrides_do_not_touch_defaults() {
        let b = builder(OperationDefaults::default());
        let first = b.create_task("q", &TaskOverrides::default().title("First task"));
        let second = b.create_task("q", &TaskOverrides::default().title("Second task"));

        assert_eq!(first.parameter("Title"), Some(&QueryValue::text("First task")));
        assert_eq!(second.parameter("Title"), Some(&QueryValue::text("Second task")));
        assert_eq!(first.parameter("Description"), second.parameter("Description"));
        assert_eq!(b.defaults(), &OperationDefaults::default());
    }

    #[test]
    fn test_requester_annotation_only_when_set() {
        let b = builder(OperationDefaults::default());
        let plain = b.create_task("q", &TaskOverrides::default());
        assert!(plain.parameter("RequesterAnnotation").is_none());

        let overrides = TaskOverrides::default().requester_annotation("batch 7");
        let annotated = b.create_task("q", &overrides);
        assert!(annotated.query_string().ends_with("&RequesterAnnotation=batch+7"));
    }

    #[test]
    fn test_url_joins_endpoint() {
        let request = builder(OperationDefaults::default()).build(Operation::GetHit, vec![
            ("HITId", QueryValue::text("H1")),
        ]);
        let url = request.url("https://mechanicalturk.amazonaws.com/");
        assert!(url.starts_with(
            "https://mechanicalturk.amazonaws.com/?AWSAccessKeyId=AKIDEXAMPLE&"
        ));
        assert!(url.ends_with("&HITId=H1"));

        let with_query = request.url("http://localhost:8080/?Service=AWSMechanicalTurkRequester");
        assert!(with_query.contains("Service=AWSMechanicalTurkRequester&AWSAccessKeyId="));
    }
}
