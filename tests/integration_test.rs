//! Integration Tests - Client Workflows Against a Mocked Transport
//!
//! Drives `TaskClient` end to end with a mockall transport and a
//! fixed clock, checking the exact requests issued and how responses
//! and failures surface.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use mockall::mock;
use mockall::predicate::*;
use rust_decimal_macros::dec;

use mturk_client::adapters::api::auth::Credentials;
use mturk_client::adapters::api::parser;
use mturk_client::adapters::api::request::percent_encode;
use mturk_client::domain::{Balance, OperationDefaults, TaskOverrides};
use mturk_client::ports::clock::FixedClock;
use mturk_client::ports::transport::{Transport, TransportError};
use mturk_client::usecases::{Endpoint, TaskClient};
use mturk_client::{MarketplaceError, WorkflowError};

// ---- Mock Definitions ----

mock! {
    pub Http {}

    #[async_trait::async_trait]
    impl Transport for Http {
        async fn get(&self, url: &str) -> Result<Vec<u8>, TransportError>;
    }
}

// ---- Helpers ----

const ENDPOINT: &str = "https://mechanicalturk.sandbox.amazonaws.com/";

fn client_with(transport: MockHttp, defaults: OperationDefaults) -> TaskClient<MockHttp> {
    let clock = FixedClock(Utc.with_ymd_and_hms(2011, 5, 1, 12, 0, 0).unwrap());
    TaskClient::with_clock(
        Credentials::new("AKIDEXAMPLE", "secret").unwrap(),
        defaults,
        Endpoint::sandbox(),
        Arc::new(transport),
        Arc::new(clock),
    )
    .unwrap()
}

/// Parameter names of `url`'s query, in order.
fn query_keys(url: &str) -> Vec<String> {
    let (_, query) = url.split_once('?').unwrap_or((url, ""));
    query
        .split('&')
        .map(|pair| pair.split_once('=').map_or(pair, |(key, _)| key).to_string())
        .collect()
}

fn assignments_body(ids: &[(&str, &str)]) -> Vec<u8> {
    let items: String = ids
        .iter()
        .map(|(assignment, hit)| {
            format!(
                "<Assignment><AssignmentId>{assignment}</AssignmentId><WorkerId>W1</WorkerId>\
                 <HITId>{hit}</HITId><AssignmentStatus>Submitted</AssignmentStatus></Assignment>"
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\"?>\n<GetAssignmentsForHITResponse>\
         <OperationRequest><RequestId>r1</RequestId></OperationRequest>\
         <GetAssignmentsForHITResult><Request><IsValid>True</IsValid></Request>\
         <NumResults>{}</NumResults>{items}</GetAssignmentsForHITResult>\
         </GetAssignmentsForHITResponse>",
        ids.len()
    )
    .into_bytes()
}

// ---- Integration Tests ----

#[tokio::test]
async fn test_create_task_query_from_defaults() {
    let mut transport = MockHttp::new();
    transport
        .expect_get()
        .withf(|url| {
            url.starts_with(ENDPOINT)
                && url.contains("&Operation=CreateHIT&")
                && url.contains("&Title=T&")
                && url.contains("&Reward.1.Amount=0.02&")
                && url.contains("&Reward.1.CurrencyCode=USD&")
                && url.contains("&QualificationRequirement.1.IntegerValue=90&")
                && url.contains("&Question=%3CQuestionForm%2F%3E&")
        })
        .times(1)
        .returning(|_| {
            Ok(b"<CreateHITResponse><HIT><HITId>H9</HITId></HIT></CreateHITResponse>".to_vec())
        });

    let defaults = OperationDefaults {
        title: "T".to_string(),
        reward: dec!(0.02),
        reward_currency: "USD".to_string(),
        min_approval_percentage: 90,
        ..OperationDefaults::default()
    };
    let client = client_with(transport, defaults);

    let body = client
        .create_task(&percent_encode("<QuestionForm/>"), &TaskOverrides::default())
        .await
        .unwrap();
    assert_eq!(parser::created_task(&body).unwrap().task_id, "H9");
}

#[tokio::test]
async fn test_create_task_overrides_leave_defaults_alone() {
    let mut transport = MockHttp::new();
    let mut seq = mockall::Sequence::new();
    transport
        .expect_get()
        .withf(|url| url.contains("&Title=Batch+one&") && url.contains("&LifetimeInSeconds=3600&"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(b"<CreateHITResponse/>".to_vec()));
    transport
        .expect_get()
        .withf(|url| {
            url.contains("&Title=My+default+title&") && url.contains("&LifetimeInSeconds=86400&")
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(b"<CreateHITResponse/>".to_vec()));

    let client = client_with(transport, OperationDefaults::default());
    let overrides = TaskOverrides::default()
        .title("Batch one")
        .lifetime_seconds(3600);

    client.create_task("q", &overrides).await.unwrap();
    client.create_task("q", &TaskOverrides::default()).await.unwrap();
    assert_eq!(client.defaults(), &OperationDefaults::default());
}

#[tokio::test]
async fn test_approve_resolves_assignment_first() {
    let mut transport = MockHttp::new();
    let mut seq = mockall::Sequence::new();
    transport
        .expect_get()
        .withf(|url| url.contains("&Operation=GetAssignmentsForHIT&") && url.ends_with("&HITId=H1"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(assignments_body(&[("A77", "H1")])));
    transport
        .expect_get()
        .withf(|url| {
            url.contains("&Operation=ApproveAssignment&") && url.ends_with("&AssignmentId=A77")
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(b"<ApproveAssignmentResponse/>".to_vec()));

    let client = client_with(transport, OperationDefaults::default());
    let body = client.approve_assignment("H1").await.unwrap();
    assert_eq!(body, b"<ApproveAssignmentResponse/>");
}

#[tokio::test]
async fn test_approve_unaccepted_task_issues_no_approval() {
    let mut transport = MockHttp::new();
    transport
        .expect_get()
        .times(1)
        .returning(|_| Ok(assignments_body(&[])));

    let client = client_with(transport, OperationDefaults::default());
    let err = client.approve_assignment("H1").await.unwrap_err();

    assert!(matches!(
        err,
        MarketplaceError::Workflow(WorkflowError::NoAssignment { ref task_id }) if task_id == "H1"
    ));
}

#[tokio::test]
async fn test_approve_stops_when_lookup_fails() {
    let mut transport = MockHttp::new();
    transport
        .expect_get()
        .times(1)
        .returning(|_| Err(TransportError::Request("connection reset".to_string())));

    let client = client_with(transport, OperationDefaults::default());
    let err = client.approve_assignment("H1").await.unwrap_err();
    assert!(matches!(err, MarketplaceError::Transport(TransportError::Request(_))));
}

#[tokio::test]
async fn test_assignment_lookup_returns_record() {
    let mut transport = MockHttp::new();
    transport
        .expect_get()
        .times(1)
        .returning(|_| Ok(assignments_body(&[("A1", "H5")])));

    let client = client_with(transport, OperationDefaults::default());
    let assignment = client.assignment_for_task("H5").await.unwrap();
    assert_eq!(assignment.assignment_id, "A1");
    assert_eq!(assignment.worker_id.as_deref(), Some("W1"));
}

#[tokio::test]
async fn test_reviewable_tasks_round_trip() {
    let mut transport = MockHttp::new();
    transport
        .expect_get()
        .withf(|url| url.contains("&Operation=GetReviewableHITs&") && url.ends_with("&PageSize=10"))
        .times(1)
        .returning(|_| {
            Ok(b"<GetReviewableHITsResponse><GetReviewableHITsResult>\
                <Request><IsValid>True</IsValid></Request><NumResults>3</NumResults>\
                <HIT><HITId>H3</HITId></HIT><HIT><HITId>H1</HITId></HIT>\
                <HIT><HITId>H2</HITId></HIT>\
                </GetReviewableHITsResult></GetReviewableHITsResponse>"
                .to_vec())
        });

    let client = client_with(transport, OperationDefaults::default());
    let ids: Vec<String> = client
        .reviewable_tasks(10)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.task_id)
        .collect();
    assert_eq!(ids, ["H3", "H1", "H2"]);
}

#[tokio::test]
async fn test_balance_forms_share_one_request_shape() {
    let body = b"<GetAccountBalanceResponse><GetAccountBalanceResult>\
        <Request><IsValid>True</IsValid></Request><AvailableBalance><Amount>25.000</Amount>\
        <CurrencyCode>USD</CurrencyCode><FormattedPrice>$25.00</FormattedPrice>\
        </AvailableBalance></GetAccountBalanceResult></GetAccountBalanceResponse>"
        .to_vec();

    let mut transport = MockHttp::new();
    transport
        .expect_get()
        .withf(|url| url.contains("&Operation=GetAccountBalance&"))
        .times(2)
        .returning(move |_| Ok(body.clone()));

    let client = client_with(transport, OperationDefaults::default());
    assert_eq!(client.balance(true).await.unwrap(), Balance::Formatted("$25.00".to_string()));
    assert_eq!(client.balance(false).await.unwrap(), Balance::Amount(dec!(25)));
}

#[tokio::test]
async fn test_rejected_envelope_is_distinct_from_transport_failure() {
    let mut transport = MockHttp::new();
    transport.expect_get().times(1).returning(|_| {
        Ok(b"<GetAccountBalanceResponse><OperationRequest><Errors><Error>\
            <Code>AWS.NotAuthorized</Code>\
            <Message>The identity contained in the request is not authorized.</Message>\
            </Error></Errors></OperationRequest></GetAccountBalanceResponse>"
            .to_vec())
    });

    let client = client_with(transport, OperationDefaults::default());
    let err = client.balance(true).await.unwrap_err();
    assert!(matches!(
        err,
        MarketplaceError::Rejected { ref code, .. } if code == "AWS.NotAuthorized"
    ));
}

#[tokio::test]
async fn test_dispose_and_details_pass_bodies_through() {
    let mut transport = MockHttp::new();
    transport
        .expect_get()
        .with(function(|url: &str| url.contains("&Operation=DisposeHIT&")))
        .times(1)
        .returning(|_| Ok(b"<DisposeHITResponse/>".to_vec()));
    transport
        .expect_get()
        .with(function(|url: &str| url.contains("&Operation=GetHIT&")))
        .times(1)
        .returning(|_| Ok(b"not even xml".to_vec()));

    let client = client_with(transport, OperationDefaults::default());
    assert_eq!(client.dispose_task("H1").await.unwrap(), b"<DisposeHITResponse/>");
    assert_eq!(client.task_details("H1").await.unwrap(), b"not even xml");
}

#[tokio::test]
async fn test_create_task_parameter_order() {
    let expected = [
        "AWSAccessKeyId",
        "Operation",
        "Signature",
        "Timestamp",
        "Title",
        "Description",
        "Reward.1.Amount",
        "Reward.1.CurrencyCode",
        "Question",
        "AssignmentDurationInSeconds",
        "AutoApprovalDelayInSeconds",
        "QualificationRequirement.1.QualificationTypeId",
        "QualificationRequirement.1.Comparator",
        "QualificationRequirement.1.IntegerValue",
        "LifetimeInSeconds",
        "Keywords",
        "MaxAssignments",
        "RequesterAnnotation",
    ];

    let mut transport = MockHttp::new();
    transport
        .expect_get()
        .withf(move |url| query_keys(url) == expected)
        .times(1)
        .returning(|_| Ok(b"<CreateHITResponse/>".to_vec()));

    let client = client_with(transport, OperationDefaults::default());
    let overrides = TaskOverrides::default().requester_annotation("batch 7");
    client.create_task("%3CQ%2F%3E", &overrides).await.unwrap();
}

#[tokio::test]
async fn test_refused_approval_is_not_reported_as_success() {
    let mut transport = MockHttp::new();
    let mut seq = mockall::Sequence::new();
    transport
        .expect_get()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(assignments_body(&[("A1", "H1")])));
    transport
        .expect_get()
        .withf(|url| url.ends_with("&AssignmentId=A1"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| {
            Ok(b"<ApproveAssignmentResponse><OperationRequest><RequestId>r</RequestId>\
                </OperationRequest><ApproveAssignmentResult><Request><IsValid>False</IsValid>\
                <Errors><Error><Code>AWS.MechanicalTurk.InvalidAssignmentState</Code>\
                <Message>This operation can be called with a status of: Submitted</Message>\
                </Error></Errors></Request></ApproveAssignmentResult></ApproveAssignmentResponse>"
                .to_vec())
        });

    let client = client_with(transport, OperationDefaults::default());
    let err = client.approve_assignment("H1").await.unwrap_err();
    assert!(matches!(
        err,
        MarketplaceError::Rejected { ref code, .. }
            if code == "AWS.MechanicalTurk.InvalidAssignmentState"
    ));
}

#[tokio::test]
async fn test_refused_writes_surface_rejection() {
    let mut transport = MockHttp::new();
    transport
        .expect_get()
        .with(function(|url: &str| url.contains("&Operation=DisposeHIT&")))
        .times(1)
        .returning(|_| {
            Ok(b"<DisposeHITResponse><DisposeHITResult><Request><IsValid>False</IsValid>\
                <Errors><Error><Code>AWS.MechanicalTurk.InvalidHITState</Code>\
                <Message>not reviewable</Message></Error></Errors>\
                </Request></DisposeHITResult></DisposeHITResponse>"
                .to_vec())
        });
    transport
        .expect_get()
        .with(function(|url: &str| url.contains("&Operation=CreateHIT&")))
        .times(1)
        .returning(|_| {
            Ok(b"<CreateHITResponse><HIT><Request><IsValid>False</IsValid><Errors><Error>\
                <Code>AWS.MechanicalTurk.InsufficientFunds</Code><Message>no funds</Message>\
                </Error></Errors></Request></HIT></CreateHITResponse>"
                .to_vec())
        });

    let client = client_with(transport, OperationDefaults::default());
    let dispose = client.dispose_task("H1").await.unwrap_err();
    assert!(matches!(
        dispose,
        MarketplaceError::Rejected { ref code, .. } if code == "AWS.MechanicalTurk.InvalidHITState"
    ));
    let create = client.create_task("q", &TaskOverrides::default()).await.unwrap_err();
    assert!(matches!(
        create,
        MarketplaceError::Rejected { ref code, .. }
            if code == "AWS.MechanicalTurk.InsufficientFunds"
    ));
}
