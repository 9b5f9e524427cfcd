//! Task Client - Marketplace Operations Facade
//!
//! Every operation follows the same skeleton: build a freshly signed
//! request, send it through the `Transport` port, then either hand the
//! raw body back (pass-through operations) or decode it with the
//! response parser. Writes (create, approve, dispose) hand back the raw
//! body too, but only after its envelope was checked for a rejection.
//! Approving a task is the one composed workflow:
//! the assignment id is looked up first, and no approval request is
//! issued when the task has no accepted assignment.
//!
//! The client holds no mutable state. Credentials and defaults are
//! fixed at construction; concurrent calls are as safe as the
//! transport they go through.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument};

use crate::adapters::api::auth::{CredentialSigner, Credentials, MTURK_SERVICE};
use crate::adapters::api::parser;
use crate::adapters::api::request::{Fields, QueryValue, RequestBuilder, SignedRequest};
use crate::adapters::metrics::prometheus::OUTCOME_OK;
use crate::adapters::metrics::ClientMetrics;
use crate::domain::defaults::{OperationDefaults, TaskOverrides};
use crate::domain::operation::Operation;
use crate::domain::task::{AssignmentRecord, Balance, TaskRecord};
use crate::error::{MarketplaceError, Result, WorkflowError};
use crate::ports::clock::{Clock, SystemClock};
use crate::ports::transport::Transport;

/// Production requester endpoint.
pub const PRODUCTION_ENDPOINT: &str = "https://mechanicalturk.amazonaws.com/";

/// Sandbox requester endpoint.
pub const SANDBOX_ENDPOINT: &str = "https://mechanicalturk.sandbox.amazonaws.com/";

/// Page size used by listings when the caller has no preference.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Where requests go and which service name they are signed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
  /// Root URL; the query string is appended to it.
  pub url: String,
  /// Service name included in every signature.
  pub service: String,
}

impl Endpoint {
  /// The sandbox, signed for the requester service.
  pub fn sandbox() -> Self {
    Self {
      url: SANDBOX_ENDPOINT.to_string(),
      service: MTURK_SERVICE.to_string(),
    }
  }
}

impl Default for Endpoint {
  fn default() -> Self {
    Self {
      url: PRODUCTION_ENDPOINT.to_string(),
      service: MTURK_SERVICE.to_string(),
    }
  }
}

/// Client for the requester API.
pub struct TaskClient<T: Transport> {
  /// Network port.
  transport: Arc<T>,
  /// Signs and assembles requests.
  builder: RequestBuilder,
  /// Root URL.
  endpoint: String,
  /// Optional request metrics.
  metrics: Option<Arc<ClientMetrics>>,
}

impl<T: Transport> TaskClient<T> {
  /// Create a client that timestamps requests with the system clock.
  ///
  /// # Errors
  /// Returns `MarketplaceError::Configuration` if the endpoint is
  /// empty or the secret cannot key the signer.
  pub fn new(
    credentials: Credentials,
    defaults: OperationDefaults,
    endpoint: Endpoint,
    transport: Arc<T>,
  ) -> Result<Self> {
    Self::with_clock(credentials, defaults, endpoint, transport, Arc::new(SystemClock))
  }

  /// Create a client with an explicit clock.
  ///
  /// # Errors
  /// Same as [`TaskClient::new`].
  pub fn with_clock(
    credentials: Credentials,
    defaults: OperationDefaults,
    endpoint: Endpoint,
    transport: Arc<T>,
    clock: Arc<dyn Clock>,
  ) -> Result<Self> {
    if endpoint.url.trim().is_empty() {
      return Err(MarketplaceError::Configuration(
        "endpoint URL must not be empty".to_string(),
      ));
    }
    if endpoint.service.trim().is_empty() {
      return Err(MarketplaceError::Configuration(
        "service name must not be empty".to_string(),
      ));
    }

    let signer = CredentialSigner::new(credentials)?;
    let builder = RequestBuilder::new(signer, endpoint.service, defaults, clock);

    Ok(Self {
      transport,
      builder,
      endpoint: endpoint.url,
      metrics: None,
    })
  }

  /// Record request counts and latency into `metrics`.
  #[must_use]
  pub fn with_metrics(mut self, metrics: Arc<ClientMetrics>) -> Self {
    self.metrics = Some(metrics);
    self
  }

  /// Defaults applied to task creation.
  pub const fn defaults(&self) -> &OperationDefaults {
    self.builder.defaults()
  }

  /// Publish a task. `question` must already be URL-encoded.
  ///
  /// Returns the raw `CreateHITResponse`; decode it with
  /// `parser::created_task` if the new id is needed.
  ///
  /// # Errors
  /// `Rejected` if the marketplace refused the task.
  #[instrument(skip(self, question, overrides))]
  pub async fn create_task(&self, question: &str, overrides: &TaskOverrides) -> Result<Vec<u8>> {
    let request = self.builder.create_task(question, overrides);
    self.execute(request, checked).await
  }

  /// List tasks with work awaiting review.
  #[instrument(skip(self))]
  pub async fn reviewable_tasks(&self, page_size: u32) -> Result<Vec<TaskRecord>> {
    let request = self.builder.build(
      Operation::GetReviewableHits,
      vec![("PageSize", QueryValue::number(page_size))],
    );
    let tasks = self.execute(request, |_, body| parser::reviewable_tasks(body)).await?;
    debug!(count = tasks.len(), "Reviewable tasks listed");
    Ok(tasks)
  }

  /// Raw `GetAssignmentsForHIT` response: the workers' submissions.
  #[instrument(skip(self))]
  pub async fn task_results(&self, task_id: &str, page_size: u32) -> Result<Vec<u8>> {
    let request = self.builder.build(
      Operation::GetAssignmentsForHit,
      task_fields(task_id, Some(page_size)),
    );
    self.execute(request, |_, body| Ok(body.to_vec())).await
  }

  /// Decoded assignments for a task, in document order.
  #[instrument(skip(self))]
  pub async fn assignments_for_task(
    &self,
    task_id: &str,
    page_size: u32,
  ) -> Result<Vec<AssignmentRecord>> {
    let request = self.builder.build(
      Operation::GetAssignmentsForHit,
      task_fields(task_id, Some(page_size)),
    );
    self.execute(request, |_, body| parser::assignments(body)).await
  }

  /// Raw `GetHIT` response.
  #[instrument(skip(self))]
  pub async fn task_details(&self, task_id: &str) -> Result<Vec<u8>> {
    let request = self.builder.build(Operation::GetHit, task_fields(task_id, None));
    self.execute(request, |_, body| Ok(body.to_vec())).await
  }

  /// The assignment accepted against `task_id`.
  ///
  /// A `Submitted` assignment wins over any other; otherwise the first
  /// assignment listed for the task is returned.
  ///
  /// # Errors
  /// `WorkflowError::NoAssignment` when no worker has accepted it.
  #[instrument(skip(self))]
  pub async fn assignment_for_task(&self, task_id: &str) -> Result<AssignmentRecord> {
    let request = self
      .builder
      .build(Operation::GetAssignmentsForHit, task_fields(task_id, None));
    let assignments = self.execute(request, |_, body| parser::assignments(body)).await?;

    let mut matching = assignments.into_iter().filter(|a| a.task_id == task_id);
    let first = matching.next();
    let submitted = match &first {
      Some(a) if is_submitted(a) => None,
      _ => matching.find(is_submitted),
    };

    submitted
      .or(first)
      .ok_or_else(|| {
        WorkflowError::NoAssignment {
          task_id: task_id.to_string(),
        }
        .into()
      })
  }

  /// Approve (and pay for) the work submitted against `task_id`.
  ///
  /// Two requests: the assignment lookup, then the approval. If the
  /// lookup fails or finds nothing, the approval is never sent.
  ///
  /// # Errors
  /// `WorkflowError::NoAssignment` before the approval, `Rejected` if
  /// the marketplace refused it.
  pub async fn approve_assignment(&self, task_id: &str) -> Result<Vec<u8>> {
    self.approve_assignment_with_feedback(task_id, None).await
  }

  /// [`TaskClient::approve_assignment`] with a note for the worker.
  #[instrument(skip(self, feedback))]
  pub async fn approve_assignment_with_feedback(
    &self,
    task_id: &str,
    feedback: Option<&str>,
  ) -> Result<Vec<u8>> {
    let assignment = self.assignment_for_task(task_id).await?;

    let mut fields: Fields = vec![(
      "AssignmentId",
      QueryValue::text(assignment.assignment_id.as_str()),
    )];
    if let Some(note) = feedback.filter(|n| !n.is_empty()) {
      fields.push(("RequesterFeedback", QueryValue::text(note)));
    }

    let request = self.builder.build(Operation::ApproveAssignment, fields);
    let body = self.execute(request, checked).await?;

    info!(
      task_id,
      assignment_id = %assignment.assignment_id,
      "Assignment approved"
    );
    Ok(body)
  }

  /// Remove a reviewed task from the marketplace.
  ///
  /// # Errors
  /// `Rejected` if the task could not be disposed, e.g. it still has
  /// unreviewed work.
  #[instrument(skip(self))]
  pub async fn dispose_task(&self, task_id: &str) -> Result<Vec<u8>> {
    let request = self.builder.build(Operation::DisposeHit, task_fields(task_id, None));
    let body = self.execute(request, checked).await?;
    info!(task_id, "Task disposed");
    Ok(body)
  }

  /// Account balance, formatted (`nice`) or as a raw amount.
  ///
  /// One request either way; `nice` only selects what is decoded.
  #[instrument(skip(self))]
  pub async fn balance(&self, nice: bool) -> Result<Balance> {
    let request = self.builder.build(Operation::GetAccountBalance, Vec::new());
    self.execute(request, |_, body| parser::balance(body, nice)).await
  }

  /// Send `request` and decode the body, recording metrics.
  async fn execute<R>(
    &self,
    request: SignedRequest,
    decode: impl FnOnce(Operation, &[u8]) -> Result<R>,
  ) -> Result<R> {
    let operation = request.operation();
    let url = request.url(&self.endpoint);
    let started = Instant::now();

    let outcome = match self.transport.get(&url).await {
      Ok(body) => decode(operation, &body),
      Err(e) => Err(MarketplaceError::from(e)),
    };

    if let Some(metrics) = &self.metrics {
      let label = match &outcome {
        Ok(_) => OUTCOME_OK,
        Err(e) => e.kind(),
      };
      metrics.observe(operation, label, started.elapsed().as_secs_f64() * 1000.0);
    }

    outcome
  }
}

/// Raw body of a write, once its envelope is known not to be a rejection.
fn checked(operation: Operation, body: &[u8]) -> Result<Vec<u8>> {
  parser::check_envelope(operation, body)?;
  Ok(body.to_vec())
}

fn is_submitted(assignment: &AssignmentRecord) -> bool {
  assignment.status.as_deref() == Some("Submitted")
}

/// `HITId` plus an optional `PageSize`.
fn task_fields(task_id: &str, page_size: Option<u32>) -> Fields {
  let mut fields: Fields = vec![("HITId", QueryValue::text(task_id))];
  if let Some(size) = page_size {
    fields.push(("PageSize", QueryValue::number(size)));
  }
  fields
}
