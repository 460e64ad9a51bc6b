mod common;

use common::{spawn_backend, ADMIN_PASSWORD, ADMIN_USER, CITIZEN_PASSWORD, CITIZEN_USER};
use satark::domain::models::{ApplicationSubmission, SignupRequest};
use satark::{
    ActionCommand, ActionKind, ApiClient, ApiError, ApplicationStatus, FeedMode, FeedQuery,
    FeedSource, Role, Session,
};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

async fn client_as(base: &str, username: &str, password: &str) -> ApiClient {
    let anon = ApiClient::new(base, TIMEOUT).expect("client");
    let grant = anon.login(username, password).await.expect("login");
    let role: Role = grant.role.parse().expect("role");
    anon.with_session(&Session::authenticated(grant.access_token, role))
}

#[tokio::test]
async fn login_returns_token_and_role() {
    let base = spawn_backend().await;
    let client = ApiClient::new(&base, TIMEOUT).expect("client");
    let grant = client.login(ADMIN_USER, ADMIN_PASSWORD).await.expect("login");
    assert_eq!(grant.role, "admin");
    assert!(!grant.access_token.is_empty());
}

#[tokio::test]
async fn bad_credentials_surface_backend_detail() {
    let base = spawn_backend().await;
    let client = ApiClient::new(&base, TIMEOUT).expect("client");
    let err = client
        .login(ADMIN_USER, "wrong")
        .await
        .expect_err("rejected");
    match err {
        ApiError::AuthFailure(detail) => assert_eq!(detail, "Incorrect username or password"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn duplicate_signup_is_rejected() {
    let base = spawn_backend().await;
    let client = ApiClient::new(&base, TIMEOUT).expect("client");
    let request = SignupRequest {
        username: "ravi".to_string(),
        password: "pw".to_string(),
        role: Role::Citizen,
    };
    client.signup(&request).await.expect("first signup");
    let err = client.signup(&request).await.expect_err("duplicate");
    assert!(matches!(err, ApiError::AuthFailure(d) if d == "Username already registered"));
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let client = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(2)).expect("client");
    let err = client.login("x", "y").await.expect_err("no backend");
    assert!(matches!(err, ApiError::Network(_)));
}

#[tokio::test]
async fn feed_requires_admin_token() {
    let base = spawn_backend().await;
    let query = FeedQuery {
        search: String::new(),
        mode: FeedMode::Applications,
    };

    let anon = ApiClient::new(&base, TIMEOUT).expect("client");
    let err = anon.fetch(&query).await.expect_err("anonymous");
    assert!(matches!(err, ApiError::Unauthorized { status: 401 }));

    let citizen = client_as(&base, CITIZEN_USER, CITIZEN_PASSWORD).await;
    let err = citizen.fetch(&query).await.expect_err("citizen");
    assert!(matches!(err, ApiError::Unauthorized { status: 403 }));
}

#[tokio::test]
async fn analytics_fetch_bundles_records_stats_and_threats() {
    let base = spawn_backend().await;
    let admin = client_as(&base, ADMIN_USER, ADMIN_PASSWORD).await;
    let page = admin
        .fetch(&FeedQuery {
            search: String::new(),
            mode: FeedMode::Analytics,
        })
        .await
        .expect("fetch");

    assert_eq!(page.records.len(), 3);
    let stats = page.stats.expect("stats");
    assert_eq!((stats.total, stats.clean, stats.blocked), (3, 2, 1));
    let threats = page.threats.expect("threats");
    assert_eq!(threats.len(), 2);
    assert!(threats
        .iter()
        .any(|t| t.category == "Income Mismatch" && t.count == 1));
}

#[tokio::test]
async fn search_filters_by_citizen_id() {
    let base = spawn_backend().await;
    let admin = client_as(&base, ADMIN_USER, ADMIN_PASSWORD).await;
    let rows = admin.list_applications("23").await.expect("list");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, ApplicationStatus::ManualAudit);
    assert!(admin.list_applications("nobody").await.expect("list").is_empty());
}

#[tokio::test]
async fn actions_change_status_on_the_server() {
    let base = spawn_backend().await;
    let admin = client_as(&base, ADMIN_USER, ADMIN_PASSWORD).await;

    let ack = admin
        .apply_action(&ActionCommand {
            target_id: 1,
            kind: ActionKind::ForceApprove,
        })
        .await
        .expect("force approve");
    assert_eq!(ack.status.as_deref(), Some("success"));
    admin
        .apply_action(&ActionCommand {
            target_id: 2,
            kind: ActionKind::FlagForInvestigation,
        })
        .await
        .expect("flag");

    let rows = admin.list_applications("").await.expect("list");
    let status_of = |id: i64| rows.iter().find(|r| r.id == id).map(|r| r.status);
    assert_eq!(status_of(1), Some(ApplicationStatus::Approved));
    assert_eq!(status_of(2), Some(ApplicationStatus::UnderInvestigation));

    let err = admin
        .apply_action(&ActionCommand {
            target_id: 404,
            kind: ActionKind::Approve,
        })
        .await
        .expect_err("missing record");
    assert!(matches!(err, ApiError::Status { status: 404, ref detail } if detail == "Application not found"));
}

#[tokio::test]
async fn citizen_sees_own_application_after_submitting() {
    let base = spawn_backend().await;
    let citizen = client_as(&base, CITIZEN_USER, CITIZEN_PASSWORD).await;
    assert!(citizen.my_application().await.expect("lookup").is_none());

    let receipt = citizen
        .submit_application(&ApplicationSubmission {
            pan_number: "FAKEP0000X".to_string(),
            target_bank_account: "99887766".to_string(),
            full_name: Some("Asha Rao".to_string()),
            age: Some(34),
            gender: None,
        })
        .await
        .expect("submit");
    assert_eq!(receipt.status, "Red: Blocked");

    let own = citizen
        .my_application()
        .await
        .expect("lookup")
        .expect("record present");
    assert_eq!(own.pan.as_deref(), Some("FAKEP0000X"));
    assert_eq!(own.status, ApplicationStatus::Blocked);
    assert_eq!(own.flag_label(), "Synthetic Identity Pattern");
}

#[tokio::test]
async fn admin_lists_registered_users() {
    let base = spawn_backend().await;
    let admin = client_as(&base, ADMIN_USER, ADMIN_PASSWORD).await;
    let users = admin.list_users().await.expect("users");
    assert!(users.iter().any(|u| u.username == CITIZEN_USER && u.role == "citizen"));
}
