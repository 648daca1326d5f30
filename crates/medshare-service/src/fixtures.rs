//! Shared wiring for service tests.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use medshare_core::config::SharingConfig;
use medshare_core::traits::ManualClock;
use medshare_core::types::{PatientId, UserId};
use medshare_database::memory::{
    MemoryAuditSink, MemoryGrantStore, MemoryInvitationStore, MemoryPatientDirectory,
    MemoryUserDirectory,
};
use medshare_entity::grant::PermissionLevel;

use crate::activity::ActivityRecorder;
use crate::context::RequestContext;
use crate::sharing::{InvitationService, OwnershipVerifier, SendInvitationRequest, SharingService};

pub(crate) struct Fixture {
    pub patients: Arc<MemoryPatientDirectory>,
    pub grants: Arc<MemoryGrantStore>,
    pub invitations: Arc<MemoryInvitationStore>,
    pub audit: Arc<MemoryAuditSink>,
    pub clock: Arc<ManualClock>,
    pub invitation_service: InvitationService,
    pub sharing_service: SharingService,
    pub alice: RequestContext,
    pub bob: RequestContext,
    pub carol: RequestContext,
}

impl Fixture {
    pub fn new() -> Self {
        let patients = Arc::new(MemoryPatientDirectory::new());
        let users = Arc::new(MemoryUserDirectory::new());
        let grants = Arc::new(MemoryGrantStore::new());
        let invitations = Arc::new(MemoryInvitationStore::new());
        let audit = Arc::new(MemoryAuditSink::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        ));

        let alice = RequestContext::new(users.insert("alice", "alice@clinic.test"));
        let bob = RequestContext::new(users.insert("bob", "bob@clinic.test"));
        let carol = RequestContext::new(users.insert("carol", "carol@clinic.test"));

        let ownership = Arc::new(OwnershipVerifier::new(patients.clone()));
        let activity = Arc::new(ActivityRecorder::new(audit.clone()));

        let invitation_service = InvitationService::new(
            invitations.clone(),
            grants.clone(),
            ownership.clone(),
            users.clone(),
            activity.clone(),
            clock.clone(),
            SharingConfig::default(),
        );
        let sharing_service = SharingService::new(
            grants.clone(),
            invitations.clone(),
            ownership,
            users,
            activity,
            clock.clone(),
        );

        Self {
            patients,
            grants,
            invitations,
            audit,
            clock,
            invitation_service,
            sharing_service,
            alice,
            bob,
            carol,
        }
    }

    /// Add a patient owned by `owner`.
    pub fn patient(&self, owner: &RequestContext, name: &str) -> PatientId {
        self.patients.insert(owner.user_id, name, None)
    }

    pub fn request(recipient: &str, patient_ids: Vec<PatientId>) -> SendInvitationRequest {
        SendInvitationRequest {
            recipient_identifier: recipient.to_string(),
            patient_ids,
            permission_level: PermissionLevel::View,
            message: None,
            expires_hours: None,
        }
    }

    pub fn active_grants(&self, recipient: UserId) -> usize {
        self.grants
            .all()
            .iter()
            .filter(|g| g.is_active && g.recipient_id == recipient)
            .count()
    }
}
