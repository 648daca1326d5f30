//! Integration tests for sending and answering invitations.

mod helpers;

use axum::http::StatusCode;
use chrono::Duration;
use serde_json::json;

use helpers::TestApp;

#[tokio::test]
async fn test_single_invitation_accept_flow() {
    let app = TestApp::new();
    let alice = app.create_user("alice");
    let bob = app.create_user("bob");
    let patient = app.create_patient(alice, "Jane Roe");

    let invitation_id = app.invite(alice, "bob", &[patient]).await;

    let pending = app
        .request("GET", "/api/invitations/pending", None, Some(bob))
        .await;
    assert_eq!(pending.status, StatusCode::OK);
    let list = pending.data().as_array().expect("array");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], invitation_id.as_str());
    assert_eq!(list[0]["kind"], "single");
    assert_eq!(list[0]["status"], "pending");
    assert_eq!(list[0]["title"], "alice shared Jane Roe with you");
    assert_eq!(list[0]["sender"]["username"], "alice");
    assert_eq!(list[0]["context"]["type"], "single");
    assert_eq!(list[0]["context"]["permission_level"], "view");

    let accepted = app.respond(bob, &invitation_id, "accepted").await;
    assert_eq!(accepted.status, StatusCode::OK, "{}", accepted.body);
    assert_eq!(accepted.data()["status"], "accepted");
    assert_eq!(accepted.data()["share_count"], 1);
    assert!(accepted.data()["share_id"].is_string());

    assert_eq!(app.active_grants(bob), 1);

    let received = app
        .request("GET", "/api/shares/received", None, Some(bob))
        .await;
    assert_eq!(received.status, StatusCode::OK);
    assert_eq!(received.data()[0]["patient"]["display_name"], "Jane Roe");
    assert_eq!(received.data()[0]["permission_level"], "view");

    let shares = app
        .request(
            "GET",
            &format!("/api/patients/{patient}/shares"),
            None,
            Some(alice),
        )
        .await;
    assert_eq!(shares.status, StatusCode::OK);
    assert_eq!(shares.data()[0]["recipient"]["username"], "bob");

    let pending = app
        .request("GET", "/api/invitations/pending", None, Some(bob))
        .await;
    assert!(pending.data().as_array().expect("array").is_empty());
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let app = TestApp::new();
    let response = app
        .request("GET", "/api/invitations/pending", None, None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_duplicate_send_conflicts() {
    let app = TestApp::new();
    let alice = app.create_user("alice");
    app.create_user("bob");
    let patient = app.create_patient(alice, "Jane Roe");

    app.invite(alice, "bob", &[patient]).await;

    let again = app
        .request(
            "POST",
            "/api/invitations",
            Some(json!({
                "recipient_identifier": "bob@clinic.test",
                "patient_id": patient,
                "permission_level": "edit",
            })),
            Some(alice),
        )
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.code(), Some("PENDING_INVITATION_EXISTS"));
    assert_eq!(app.invitations.all().len(), 1);
}

#[tokio::test]
async fn test_send_error_mapping() {
    let app = TestApp::new();
    let alice = app.create_user("alice");
    let carol = app.create_user("carol");
    app.create_user("bob");
    let patient = app.create_patient(alice, "Jane Roe");
    let carols = app.create_patient(carol, "Richard Roe");

    let unknown = app
        .request(
            "POST",
            "/api/invitations",
            Some(json!({
                "recipient_identifier": "nobody@clinic.test",
                "patient_id": patient,
                "permission_level": "view",
            })),
            Some(alice),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.code(), Some("RECIPIENT_NOT_FOUND"));
    assert!(
        unknown.body["message"]
            .as_str()
            .unwrap()
            .contains("nobody@clinic.test")
    );

    let not_owner = app
        .request(
            "POST",
            "/api/invitations",
            Some(json!({
                "recipient_identifier": "bob",
                "patient_id": carols,
                "permission_level": "view",
            })),
            Some(alice),
        )
        .await;
    assert_eq!(not_owner.status, StatusCode::NOT_FOUND);
    assert_eq!(not_owner.code(), Some("PATIENT_NOT_FOUND"));

    let bad_level = app
        .request(
            "POST",
            "/api/invitations",
            Some(json!({
                "recipient_identifier": "bob",
                "patient_id": patient,
                "permission_level": "owner",
            })),
            Some(alice),
        )
        .await;
    assert_eq!(bad_level.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_level.code(), Some("INVALID_PERMISSION_LEVEL"));

    let to_self = app
        .request(
            "POST",
            "/api/invitations",
            Some(json!({
                "recipient_identifier": "alice",
                "patient_id": patient,
                "permission_level": "view",
            })),
            Some(alice),
        )
        .await;
    assert_eq!(to_self.status, StatusCode::BAD_REQUEST);
    assert_eq!(to_self.code(), Some("SELF_SHARE"));

    assert!(app.invitations.all().is_empty());
}

#[tokio::test]
async fn test_bulk_accept_skips_deleted_patient() {
    let app = TestApp::new();
    let alice = app.create_user("alice");
    let bob = app.create_user("bob");
    let p1 = app.create_patient(alice, "P One");
    let p2 = app.create_patient(alice, "P Two");
    let p3 = app.create_patient(alice, "P Three");

    let invitation_id = app.invite(alice, "bob", &[p1, p2, p3]).await;
    assert!(app.patients.remove(p1));

    let accepted = app.respond(bob, &invitation_id, "accept").await;
    assert_eq!(accepted.status, StatusCode::OK, "{}", accepted.body);
    assert_eq!(accepted.data()["status"], "accepted");
    assert_eq!(accepted.data()["share_count"], 2);
    assert_eq!(accepted.data()["share_ids"].as_array().unwrap().len(), 2);
    assert!(accepted.data().get("share_id").is_none());

    let granted: Vec<_> = app
        .grants
        .all()
        .into_iter()
        .filter(|g| g.is_active)
        .map(|g| g.patient_id)
        .collect();
    assert_eq!(granted.len(), 2);
    assert!(granted.contains(&p2) && granted.contains(&p3));
}

#[tokio::test]
async fn test_reject_with_note() {
    let app = TestApp::new();
    let alice = app.create_user("alice");
    let bob = app.create_user("bob");
    let patient = app.create_patient(alice, "Jane Roe");
    let invitation_id = app.invite(alice, "bob", &[patient]).await;

    let rejected = app
        .request(
            "POST",
            &format!("/api/invitations/{invitation_id}/respond"),
            Some(json!({ "response": "rejected", "response_note": "Not my patient" })),
            Some(bob),
        )
        .await;
    assert_eq!(rejected.status, StatusCode::OK);
    assert_eq!(rejected.data()["status"], "rejected");
    assert_eq!(rejected.data()["share_count"], 0);

    let stored = &app.invitations.all()[0];
    assert_eq!(stored.response_note.as_deref(), Some("Not my patient"));
    assert_eq!(app.active_grants(bob), 0);
}

#[tokio::test]
async fn test_only_recipient_can_respond() {
    let app = TestApp::new();
    let alice = app.create_user("alice");
    app.create_user("bob");
    let carol = app.create_user("carol");
    let patient = app.create_patient(alice, "Jane Roe");
    let invitation_id = app.invite(alice, "bob", &[patient]).await;

    let response = app.respond(carol, &invitation_id, "accepted").await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.code(), Some("NOT_RECIPIENT"));
}

#[tokio::test]
async fn test_cancel_then_accept_fails() {
    let app = TestApp::new();
    let alice = app.create_user("alice");
    let bob = app.create_user("bob");
    let patient = app.create_patient(alice, "Jane Roe");
    let invitation_id = app.invite(alice, "bob", &[patient]).await;

    let by_bob = app
        .request(
            "POST",
            &format!("/api/invitations/{invitation_id}/cancel"),
            None,
            Some(bob),
        )
        .await;
    assert_eq!(by_bob.status, StatusCode::FORBIDDEN);
    assert_eq!(by_bob.code(), Some("NOT_SENDER"));

    let cancelled = app
        .request(
            "POST",
            &format!("/api/invitations/{invitation_id}/cancel"),
            None,
            Some(alice),
        )
        .await;
    assert_eq!(cancelled.status, StatusCode::OK);
    assert_eq!(cancelled.data()["status"], "cancelled");

    let accepted = app.respond(bob, &invitation_id, "accepted").await;
    assert_eq!(accepted.status, StatusCode::BAD_REQUEST);
    assert_eq!(accepted.code(), Some("INVALID_STATE"));
    assert_eq!(app.active_grants(bob), 0);
}

#[tokio::test]
async fn test_expired_invitation_cannot_be_answered() {
    let app = TestApp::new();
    let alice = app.create_user("alice");
    let bob = app.create_user("bob");
    let patient = app.create_patient(alice, "Jane Roe");
    let invitation_id = app.invite(alice, "bob", &[patient]).await;

    app.clock.advance(Duration::hours(168));

    for answer in ["accepted", "rejected"] {
        let response = app.respond(bob, &invitation_id, answer).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.code(), Some("EXPIRED"));
    }

    let pending = app
        .request("GET", "/api/invitations/pending", None, Some(bob))
        .await;
    assert!(pending.data().as_array().unwrap().is_empty());
    assert_eq!(app.active_grants(bob), 0);
}

#[tokio::test]
async fn test_pending_filter_by_type() {
    let app = TestApp::new();
    let alice = app.create_user("alice");
    let bob = app.create_user("bob");
    let p1 = app.create_patient(alice, "P One");
    let p2 = app.create_patient(alice, "P Two");
    let p3 = app.create_patient(alice, "P Three");

    app.invite(alice, "bob", &[p1]).await;
    app.invite(alice, "bob", &[p2, p3]).await;

    let bulk = app
        .request(
            "GET",
            "/api/invitations/pending?invitation_type=bulk",
            None,
            Some(bob),
        )
        .await;
    assert_eq!(bulk.status, StatusCode::OK);
    let list = bulk.data().as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["context"]["patients"].as_array().unwrap().len(), 2);

    let bad = app
        .request(
            "GET",
            "/api/invitations/pending?invitation_type=group",
            None,
            Some(bob),
        )
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_expiry_sweep_matches_lazy_expiry() {
    let app = TestApp::new();
    let alice = app.create_user("alice");
    let bob = app.create_user("bob");
    let patient = app.create_patient(alice, "Jane Roe");
    let invitation_id = app.invite(alice, "bob", &[patient]).await;

    app.clock.advance(Duration::hours(200));
    assert_eq!(app.invitation_service.expire_overdue().await.unwrap(), 1);

    let response = app.respond(bob, &invitation_id, "accepted").await;
    assert_eq!(response.code(), Some("EXPIRED"));
    assert!(
        app.audit
            .actions()
            .iter()
            .any(|a| a == "invitation.expire")
    );
}
