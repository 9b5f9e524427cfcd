//! Response Parser - Typed Decoding of XML Envelopes
//!
//! Each operation has one documented path to its payload, e.g.
//! `GetReviewableHITsResponse/GetReviewableHITsResult/HIT/HITId`.
//! Decoding goes through the serde shapes in `types`, then every
//! required element along the path is checked. Any gap fails the
//! whole parse with the path that could not be resolved; there are
//! no partial results.

use std::str::FromStr;

use quick_xml::events::Event;
use quick_xml::Reader;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::types::{
    ApiErrors, AssignmentsResponse, BalanceResponse, HitElement, HitResponse, OperationRequest,
    PriceElement, RequestStatus, ReviewableHitsResponse, StatusResponse,
};
use crate::domain::operation::Operation;
use crate::domain::task::{AssignmentRecord, Balance, BalanceRecord, TaskRecord};
use crate::error::{MarketplaceError, Result};

/// Response shapes the parser can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `GetReviewableHITs` → task identifiers.
    ReviewableTasks,
    /// `GetAssignmentsForHIT` → assignments.
    Assignments,
    /// `GetAccountBalance` → formatted string or numeric amount.
    Balance { nice: bool },
    /// `CreateHIT` → the created task.
    CreatedTask,
    /// `GetHIT` → task details.
    TaskDetails,
}

impl Shape {
    /// Operation whose envelope this shape decodes.
    pub const fn operation(self) -> Operation {
        match self {
            Self::ReviewableTasks => Operation::GetReviewableHits,
            Self::Assignments => Operation::GetAssignmentsForHit,
            Self::Balance { .. } => Operation::GetAccountBalance,
            Self::CreatedTask => Operation::CreateHit,
            Self::TaskDetails => Operation::GetHit,
        }
    }
}

/// Decoded payload, tagged by shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Tasks(Vec<TaskRecord>),
    Assignments(Vec<AssignmentRecord>),
    Balance(Balance),
    Task(TaskRecord),
}

/// Decode `body` according to `shape`.
///
/// # Errors
/// `Parse` for malformed or incomplete documents, `Rejected` when the
/// marketplace flagged the request invalid.
pub fn parse(body: &[u8], shape: Shape) -> Result<Parsed> {
    match shape {
        Shape::ReviewableTasks => reviewable_tasks(body).map(Parsed::Tasks),
        Shape::Assignments => assignments(body).map(Parsed::Assignments),
        Shape::Balance { nice } => balance(body, nice).map(Parsed::Balance),
        Shape::CreatedTask => created_task(body).map(Parsed::Task),
        Shape::TaskDetails => task_details(body).map(Parsed::Task),
    }
}

/// `GetReviewableHITs`: one record per `HIT`, in document order.
pub fn reviewable_tasks(body: &[u8]) -> Result<Vec<TaskRecord>> {
    let op = Operation::GetReviewableHits;
    let envelope: ReviewableHitsResponse = decode(op, body)?;
    check_operation_request(op, envelope.operation_request.as_ref())?;

    let result_path = format!("{}/{}", op.response_element(), op.result_element());
    let result = envelope.result.ok_or_else(|| missing(op, &result_path))?;
    check_request(op, result.request.as_ref())?;

    result
        .hits
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            let id = required(op, hit.hit_id.as_ref(), || format!("{result_path}/HIT[{i}]/HITId"))?;
            Ok(TaskRecord::with_id(id))
        })
        .collect()
}

/// `GetAssignmentsForHIT`: every assignment, in document order.
pub fn assignments(body: &[u8]) -> Result<Vec<AssignmentRecord>> {
    let op = Operation::GetAssignmentsForHit;
    let envelope: AssignmentsResponse = decode(op, body)?;
    check_operation_request(op, envelope.operation_request.as_ref())?;

    let result_path = format!("{}/{}", op.response_element(), op.result_element());
    let result = envelope.result.ok_or_else(|| missing(op, &result_path))?;
    check_request(op, result.request.as_ref())?;

    result
        .assignments
        .into_iter()
        .enumerate()
        .map(|(i, a)| {
            let base = format!("{result_path}/Assignment[{i}]");
            let assignment_id =
                required(op, a.assignment_id.as_ref(), || format!("{base}/AssignmentId"))?;
            let task_id = required(op, a.hit_id.as_ref(), || format!("{base}/HITId"))?;
            Ok(AssignmentRecord {
                assignment_id,
                task_id,
                worker_id: a.worker_id,
                status: a.assignment_status,
                answer: a.answer,
            })
        })
        .collect()
}

/// `GetAccountBalance`: only the requested form must be present.
pub fn balance(body: &[u8], nice: bool) -> Result<Balance> {
    let op = Operation::GetAccountBalance;
    let (path, available) = available_balance(body)?;

    if nice {
        let formatted = required(op, available.formatted_price.as_ref(), || {
            format!("{path}/FormattedPrice")
        })?;
        Ok(Balance::Formatted(formatted))
    } else {
        let amount = required(op, available.amount.as_ref(), || format!("{path}/Amount"))?;
        Ok(Balance::Amount(decimal(op, &amount, &format!("{path}/Amount"))?))
    }
}

/// `GetAccountBalance`: amount and formatted string together.
pub fn balance_record(body: &[u8]) -> Result<BalanceRecord> {
    let op = Operation::GetAccountBalance;
    let (path, available) = available_balance(body)?;

    let amount_path = format!("{path}/Amount");
    let amount = required(op, available.amount.as_ref(), || amount_path.clone())?;
    let formatted_price = required(op, available.formatted_price.as_ref(), || {
        format!("{path}/FormattedPrice")
    })?;

    Ok(BalanceRecord {
        amount: decimal(op, &amount, &amount_path)?,
        currency_code: available.currency_code,
        formatted_price,
    })
}

/// `CreateHIT`: the new task's identifiers.
pub fn created_task(body: &[u8]) -> Result<TaskRecord> {
    single_hit(Operation::CreateHit, body)
}

/// `GetHIT`: full task description.
pub fn task_details(body: &[u8]) -> Result<TaskRecord> {
    single_hit(Operation::GetHit, body)
}

/// Check that `body` is a well-formed `op` envelope the marketplace
/// did not reject, without decoding its payload.
///
/// Used on raw bodies that are handed back as-is, so a refused write
/// never reads as a success.
///
/// # Errors
/// `Parse` for a malformed document or wrong root element, `Rejected`
/// when `OperationRequest/Errors` is present or `Request/IsValid` is
/// `False`.
pub fn check_envelope(op: Operation, body: &[u8]) -> Result<()> {
    match op {
        Operation::CreateHit | Operation::GetHit => {
            let envelope: HitResponse = decode(op, body)?;
            check_operation_request(op, envelope.operation_request.as_ref())?;
            check_request(op, envelope.hit.and_then(|h| h.request).as_ref())
        }
        Operation::GetReviewableHits => {
            let envelope: ReviewableHitsResponse = decode(op, body)?;
            check_operation_request(op, envelope.operation_request.as_ref())?;
            check_request(op, envelope.result.and_then(|r| r.request).as_ref())
        }
        Operation::GetAssignmentsForHit => {
            let envelope: AssignmentsResponse = decode(op, body)?;
            check_operation_request(op, envelope.operation_request.as_ref())?;
            check_request(op, envelope.result.and_then(|r| r.request).as_ref())
        }
        Operation::GetAccountBalance => {
            let envelope: BalanceResponse = decode(op, body)?;
            check_operation_request(op, envelope.operation_request.as_ref())?;
            check_request(op, envelope.result.and_then(|r| r.request).as_ref())
        }
        Operation::ApproveAssignment | Operation::DisposeHit => {
            let envelope: StatusResponse = decode(op, body)?;
            check_operation_request(op, envelope.operation_request.as_ref())?;
            check_request(op, envelope.result.and_then(|r| r.request).as_ref())
        }
    }
}

/// Name of the document's root element.
pub fn root_element(body: &[u8]) -> Option<String> {
    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e) | Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
        buf.clear();
    }
}

fn available_balance(body: &[u8]) -> Result<(String, PriceElement)> {
    let op = Operation::GetAccountBalance;
    let envelope: BalanceResponse = decode(op, body)?;
    check_operation_request(op, envelope.operation_request.as_ref())?;

    let result_path = format!("{}/{}", op.response_element(), op.result_element());
    let result = envelope.result.ok_or_else(|| missing(op, &result_path))?;
    check_request(op, result.request.as_ref())?;

    let path = format!("{result_path}/AvailableBalance");
    let available = result.available_balance.ok_or_else(|| missing(op, &path))?;
    Ok((path, available))
}

fn single_hit(op: Operation, body: &[u8]) -> Result<TaskRecord> {
    let envelope: HitResponse = decode(op, body)?;
    check_operation_request(op, envelope.operation_request.as_ref())?;

    let hit_path = format!("{}/HIT", op.response_element());
    let hit = envelope.hit.ok_or_else(|| missing(op, &hit_path))?;
    check_request(op, hit.request.as_ref())?;

    task_record(op, &hit_path, hit)
}

fn task_record(op: Operation, path: &str, hit: HitElement) -> Result<TaskRecord> {
    let task_id = required(op, hit.hit_id.as_ref(), || format!("{path}/HITId"))?;

    let max_assignments = hit
        .max_assignments
        .as_deref()
        .map(|raw| {
            raw.trim()
                .parse::<u32>()
                .map_err(|e| MarketplaceError::parse(op, format!("{path}/MaxAssignments"), e))
        })
        .transpose()?;

    let reward = match hit.reward.as_ref().and_then(|r| r.amount.as_deref()) {
        Some(raw) => Some(decimal(op, raw, &format!("{path}/Reward/Amount"))?),
        None => None,
    };

    Ok(TaskRecord {
        task_id,
        task_type_id: hit.hit_type_id,
        title: hit.title,
        description: hit.description,
        status: hit.hit_status,
        max_assignments,
        reward,
    })
}

/// UTF-8 check, root element check, then serde decode.
fn decode<T: DeserializeOwned>(op: Operation, body: &[u8]) -> Result<T> {
    let text = std::str::from_utf8(body).map_err(|e| MarketplaceError::parse(op, "/", e))?;

    let expected = op.response_element();
    match root_element(body) {
        Some(root) if root == expected => {}
        Some(root) => {
            return Err(MarketplaceError::parse(
                op,
                "/",
                format!("expected root <{expected}>, found <{root}>"),
            ));
        }
        None => return Err(MarketplaceError::parse(op, "/", "no root element")),
    }

    quick_xml::de::from_str(text).map_err(|e| MarketplaceError::parse(op, expected, e))
}

fn check_operation_request(op: Operation, request: Option<&OperationRequest>) -> Result<()> {
    match request.and_then(|r| r.errors.as_ref()) {
        Some(errors) if !errors.errors.is_empty() => Err(rejected(op, errors)),
        _ => Ok(()),
    }
}

fn check_request(op: Operation, request: Option<&RequestStatus>) -> Result<()> {
    match request {
        Some(status) if !status.is_valid() => {
            let empty = ApiErrors::default();
            Err(rejected(op, status.errors.as_ref().unwrap_or(&empty)))
        }
        _ => Ok(()),
    }
}

fn rejected(op: Operation, errors: &ApiErrors) -> MarketplaceError {
    let first = errors.errors.first();
    let code = first
        .and_then(|e| e.code.clone())
        .unwrap_or_else(|| "Unknown".to_string());
    let message = first
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| "request flagged invalid".to_string());
    warn!(operation = %op, code = %code, "Marketplace rejected request");
    MarketplaceError::Rejected {
        operation: op,
        code,
        message,
    }
}

fn required(
    op: Operation,
    value: Option<&String>,
    path: impl FnOnce() -> String,
) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(missing(op, &path())),
    }
}

fn missing(op: Operation, path: &str) -> MarketplaceError {
    MarketplaceError::parse(op, path, "required element missing")
}

fn decimal(op: Operation, raw: &str, path: &str) -> Result<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|e| MarketplaceError::parse(op, path, e))
}
