//! Shared test helpers for integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use medshare_api::{AppState, build_app};
use medshare_core::config::AppConfig;
use medshare_core::traits::ManualClock;
use medshare_core::types::{PatientId, UserId};
use medshare_database::memory::{
    MemoryAuditSink, MemoryGrantStore, MemoryInvitationStore, MemoryPatientDirectory,
    MemoryUserDirectory,
};
use medshare_service::{ActivityRecorder, InvitationService, OwnershipVerifier, SharingService};

/// Test application backed by in-memory stores and a manual clock
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    pub patients: Arc<MemoryPatientDirectory>,
    pub users: Arc<MemoryUserDirectory>,
    pub grants: Arc<MemoryGrantStore>,
    pub invitations: Arc<MemoryInvitationStore>,
    pub audit: Arc<MemoryAuditSink>,
    pub clock: Arc<ManualClock>,
    pub invitation_service: Arc<InvitationService>,
}

/// A captured response
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// The `data` member of a success envelope
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// The machine-readable error code
    pub fn code(&self) -> Option<&str> {
        self.body["code"].as_str()
    }
}

impl TestApp {
    /// Create a new test application
    pub fn new() -> Self {
        let config = AppConfig::default();

        let patients = Arc::new(MemoryPatientDirectory::new());
        let users = Arc::new(MemoryUserDirectory::new());
        let grants = Arc::new(MemoryGrantStore::new());
        let invitations = Arc::new(MemoryInvitationStore::new());
        let audit = Arc::new(MemoryAuditSink::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 3, 8, 30, 0).unwrap(),
        ));

        let ownership = Arc::new(OwnershipVerifier::new(patients.clone()));
        let activity = Arc::new(ActivityRecorder::new(audit.clone()));

        let invitation_service = Arc::new(InvitationService::new(
            invitations.clone(),
            grants.clone(),
            ownership.clone(),
            users.clone(),
            activity.clone(),
            clock.clone(),
            config.sharing.clone(),
        ));
        let sharing_service = Arc::new(SharingService::new(
            grants.clone(),
            invitations.clone(),
            ownership,
            users.clone(),
            activity,
            clock.clone(),
        ));

        let router = build_app(AppState {
            config: Arc::new(config),
            db_pool: None,
            invitation_service: invitation_service.clone(),
            sharing_service,
        });

        Self {
            router,
            patients,
            users,
            grants,
            invitations,
            audit,
            clock,
            invitation_service,
        }
    }

    /// Register a user with an `@clinic.test` email
    pub fn create_user(&self, username: &str) -> UserId {
        self.users
            .insert(username, &format!("{username}@clinic.test"))
    }

    /// Add a patient owned by `owner`
    pub fn create_patient(&self, owner: UserId, name: &str) -> PatientId {
        self.patients.insert(owner, name, None)
    }

    /// Number of active grants held by `recipient`
    pub fn active_grants(&self, recipient: UserId) -> usize {
        self.grants
            .all()
            .iter()
            .filter(|g| g.is_active && g.recipient_id == recipient)
            .count()
    }

    /// Make an HTTP request, optionally as `user`
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        user: Option<UserId>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(user) = user {
            req = req.header("x-user-id", user.to_string());
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Send a view invitation and return its ID
    pub async fn invite(&self, sender: UserId, recipient: &str, patients: &[PatientId]) -> String {
        let body = match patients {
            [single] => serde_json::json!({
                "recipient_identifier": recipient,
                "patient_id": single,
                "permission_level": "view",
            }),
            many => serde_json::json!({
                "recipient_identifier": recipient,
                "patient_ids": many,
                "permission_level": "view",
            }),
        };

        let response = self
            .request("POST", "/api/invitations", Some(body), Some(sender))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

        response.data()["invitation_id"]
            .as_str()
            .expect("invitation_id")
            .to_string()
    }

    /// Answer an invitation as `recipient`
    pub async fn respond(&self, recipient: UserId, invitation_id: &str, answer: &str) -> TestResponse {
        self.request(
            "POST",
            &format!("/api/invitations/{invitation_id}/respond"),
            Some(serde_json::json!({ "response": answer })),
            Some(recipient),
        )
        .await
    }
}
