//! Requester API Response Envelopes
//!
//! Serde shapes of the XML documents returned by each operation,
//! decoded with quick-xml. Every element is optional here: the parser
//! decides which ones are required and reports the missing path, so a
//! document either resolves completely or fails as a whole.

use serde::Deserialize;

/// `OperationRequest` block present in every envelope.
///
/// Authentication failures land their errors here rather than under
/// the result's `Request`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationRequest {
    #[serde(rename = "RequestId")]
    pub request_id: Option<String>,
    #[serde(rename = "Errors")]
    pub errors: Option<ApiErrors>,
}

/// Per-result validity block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestStatus {
    /// `True` or `False`.
    #[serde(rename = "IsValid")]
    pub is_valid: Option<String>,
    #[serde(rename = "Errors")]
    pub errors: Option<ApiErrors>,
}

impl RequestStatus {
    /// True unless the marketplace explicitly flagged the request invalid.
    pub fn is_valid(&self) -> bool {
        !self
            .is_valid
            .as_deref()
            .is_some_and(|flag| flag.trim().eq_ignore_ascii_case("false"))
    }
}

/// `Errors` wrapper.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrors {
    #[serde(rename = "Error", default)]
    pub errors: Vec<ApiErrorItem>,
}

/// One marketplace error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorItem {
    #[serde(rename = "Code")]
    pub code: Option<String>,
    #[serde(rename = "Message")]
    pub message: Option<String>,
}

/// Price block (`Reward`, `AvailableBalance`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceElement {
    #[serde(rename = "Amount")]
    pub amount: Option<String>,
    #[serde(rename = "CurrencyCode")]
    pub currency_code: Option<String>,
    #[serde(rename = "FormattedPrice")]
    pub formatted_price: Option<String>,
}

/// `HIT` element, in listings as well as in `CreateHIT`/`GetHIT`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HitElement {
    #[serde(rename = "Request")]
    pub request: Option<RequestStatus>,
    #[serde(rename = "HITId")]
    pub hit_id: Option<String>,
    #[serde(rename = "HITTypeId")]
    pub hit_type_id: Option<String>,
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Description")]
    pub description: Option<String>,
    #[serde(rename = "HITStatus")]
    pub hit_status: Option<String>,
    #[serde(rename = "MaxAssignments")]
    pub max_assignments: Option<String>,
    #[serde(rename = "Reward")]
    pub reward: Option<PriceElement>,
}

/// `Assignment` element.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentElement {
    #[serde(rename = "AssignmentId")]
    pub assignment_id: Option<String>,
    #[serde(rename = "WorkerId")]
    pub worker_id: Option<String>,
    #[serde(rename = "HITId")]
    pub hit_id: Option<String>,
    #[serde(rename = "AssignmentStatus")]
    pub assignment_status: Option<String>,
    #[serde(rename = "Answer")]
    pub answer: Option<String>,
}

/// `GetReviewableHITsResponse`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewableHitsResponse {
    #[serde(rename = "OperationRequest")]
    pub operation_request: Option<OperationRequest>,
    #[serde(rename = "GetReviewableHITsResult")]
    pub result: Option<ReviewableHitsResult>,
}

/// `GetReviewableHITsResult`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewableHitsResult {
    #[serde(rename = "Request")]
    pub request: Option<RequestStatus>,
    #[serde(rename = "HIT", default)]
    pub hits: Vec<HitElement>,
}

/// `GetAssignmentsForHITResponse`.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentsResponse {
    #[serde(rename = "OperationRequest")]
    pub operation_request: Option<OperationRequest>,
    #[serde(rename = "GetAssignmentsForHITResult")]
    pub result: Option<AssignmentsResult>,
}

/// `GetAssignmentsForHITResult`.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentsResult {
    #[serde(rename = "Request")]
    pub request: Option<RequestStatus>,
    #[serde(rename = "Assignment", default)]
    pub assignments: Vec<AssignmentElement>,
}

/// `GetAccountBalanceResponse`.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceResponse {
    #[serde(rename = "OperationRequest")]
    pub operation_request: Option<OperationRequest>,
    #[serde(rename = "GetAccountBalanceResult")]
    pub result: Option<BalanceResult>,
}

/// `GetAccountBalanceResult`.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceResult {
    #[serde(rename = "Request")]
    pub request: Option<RequestStatus>,
    #[serde(rename = "AvailableBalance")]
    pub available_balance: Option<PriceElement>,
}

/// `CreateHITResponse` and `GetHITResponse`; both wrap a single `HIT`.
#[derive(Debug, Clone, Deserialize)]
pub struct HitResponse {
    #[serde(rename = "OperationRequest")]
    pub operation_request: Option<OperationRequest>,
    #[serde(rename = "HIT")]
    pub hit: Option<HitElement>,
}

/// `ApproveAssignmentResponse` and `DisposeHITResponse`: a bare
/// validity block, no payload.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    #[serde(rename = "OperationRequest")]
    pub operation_request: Option<OperationRequest>,
    #[serde(rename = "ApproveAssignmentResult", alias = "DisposeHITResult")]
    pub result: Option<StatusResult>,
}

/// `ApproveAssignmentResult` / `DisposeHITResult`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResult {
    #[serde(rename = "Request")]
    pub request: Option<RequestStatus>,
}
