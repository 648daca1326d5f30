//! Integration tests for revoking and listing grants.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use medshare_core::types::{PatientId, UserId};

use helpers::TestApp;

/// Alice shares one patient with Bob, who accepts.
async fn shared_with_bob(app: &TestApp) -> (UserId, UserId, PatientId) {
    let alice = app.create_user("alice");
    let bob = app.create_user("bob");
    let patient = app.create_patient(alice, "Jane Roe");
    let invitation_id = app.invite(alice, "bob", &[patient]).await;
    let accepted = app.respond(bob, &invitation_id, "accepted").await;
    assert_eq!(accepted.status, StatusCode::OK);
    (alice, bob, patient)
}

#[tokio::test]
async fn test_revoke_deactivates_and_repeats_as_noop() {
    let app = TestApp::new();
    let (alice, bob, patient) = shared_with_bob(&app).await;

    let body = json!({ "patient_id": patient, "recipient_id": bob });
    let first = app
        .request("POST", "/api/shares/revoke", Some(body.clone()), Some(alice))
        .await;
    assert_eq!(first.status, StatusCode::OK, "{}", first.body);
    assert_eq!(first.data()["ok"], true);
    assert!(first.data()["grant_id"].is_string());

    let second = app
        .request("POST", "/api/shares/revoke", Some(body), Some(alice))
        .await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.data()["ok"], true);
    assert!(second.data()["grant_id"].is_null());

    // The row survives, only inactive.
    let grants = app.grants.all();
    assert_eq!(grants.len(), 1);
    assert!(!grants[0].is_active);
    assert!(grants[0].deactivated_at.is_some());

    // The invitation keeps its accepted status.
    let invitation = &app.invitations.all()[0];
    assert_eq!(invitation.status.as_str(), "accepted");
    assert!(invitation.revoked_at.is_some());

    let received = app
        .request("GET", "/api/shares/received", None, Some(bob))
        .await;
    assert!(received.data().as_array().unwrap().is_empty());

    let revokes = app
        .audit
        .actions()
        .into_iter()
        .filter(|a| a == "grant.revoke")
        .count();
    assert_eq!(revokes, 1);
}

#[tokio::test]
async fn test_revoke_without_history_is_not_found() {
    let app = TestApp::new();
    let alice = app.create_user("alice");
    let bob = app.create_user("bob");
    let patient = app.create_patient(alice, "Jane Roe");

    let response = app
        .request(
            "POST",
            "/api/shares/revoke",
            Some(json!({ "patient_id": patient, "recipient_id": bob })),
            Some(alice),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.code(), Some("GRANT_NOT_FOUND"));
}

#[tokio::test]
async fn test_revoke_by_non_owner_hides_patient() {
    let app = TestApp::new();
    let (_alice, bob, patient) = shared_with_bob(&app).await;
    let mallory = app.create_user("mallory");

    let response = app
        .request(
            "POST",
            "/api/shares/revoke",
            Some(json!({ "patient_id": patient, "recipient_id": bob })),
            Some(mallory),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.code(), Some("PATIENT_NOT_FOUND"));
    assert_eq!(app.active_grants(bob), 1);

    let listing = app
        .request(
            "GET",
            &format!("/api/patients/{patient}/shares"),
            None,
            Some(mallory),
        )
        .await;
    assert_eq!(listing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_revoke_withdraws_pending_invitation() {
    let app = TestApp::new();
    let alice = app.create_user("alice");
    let bob = app.create_user("bob");
    let patient = app.create_patient(alice, "Jane Roe");
    let invitation_id = app.invite(alice, "bob", &[patient]).await;

    let response = app
        .request(
            "POST",
            "/api/shares/revoke",
            Some(json!({ "patient_id": patient, "recipient_id": bob })),
            Some(alice),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["withdrawn_invitations"][0], invitation_id.as_str());

    let accepted = app.respond(bob, &invitation_id, "accepted").await;
    assert_eq!(accepted.status, StatusCode::BAD_REQUEST);
    assert_eq!(accepted.code(), Some("INVALID_STATE"));
}

#[tokio::test]
async fn test_remove_own_access() {
    let app = TestApp::new();
    let (alice, bob, patient) = shared_with_bob(&app).await;

    let path = format!("/api/shares/received/{patient}");
    let first = app.request("DELETE", &path, None, Some(bob)).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.data()["ok"], true);
    assert_eq!(first.data()["removed"], true);
    assert_eq!(app.active_grants(bob), 0);

    let second = app.request("DELETE", &path, None, Some(bob)).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.data()["removed"], false);

    let stranger = app.request("DELETE", &path, None, Some(alice)).await;
    assert_eq!(stranger.status, StatusCode::NOT_FOUND);
    assert_eq!(stranger.code(), Some("GRANT_NOT_FOUND"));
}

#[tokio::test]
async fn test_reshare_after_revoke() {
    let app = TestApp::new();
    let (alice, bob, patient) = shared_with_bob(&app).await;

    app.request(
        "POST",
        "/api/shares/revoke",
        Some(json!({ "patient_id": patient, "recipient_id": bob })),
        Some(alice),
    )
    .await;

    let invitation_id = app.invite(alice, "bob", &[patient]).await;
    let accepted = app.respond(bob, &invitation_id, "accepted").await;
    assert_eq!(accepted.status, StatusCode::OK);

    assert_eq!(app.grants.all().len(), 2);
    assert_eq!(app.active_grants(bob), 1);
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let response = app.request("GET", "/api/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "ok");
    assert_eq!(response.data()["database"], "not_configured");
}
