//! In-memory grant store.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use medshare_core::result::AppResult;
use medshare_core::types::{GrantId, InvitationId, PatientId, UserId};
use medshare_entity::grant::{CreateGrant, Grant, GrantCreation};

use super::lock;
use crate::store::GrantStore;

/// Grant rows in insertion order.
#[derive(Debug, Default)]
pub struct MemoryGrantStore {
    rows: Mutex<Vec<Grant>>,
}

impl MemoryGrantStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row, active or not, in insertion order.
    pub fn all(&self) -> Vec<Grant> {
        lock(&self.rows).clone()
    }

    fn newest_first(mut grants: Vec<Grant>) -> Vec<Grant> {
        grants.reverse();
        grants.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        grants
    }
}

#[async_trait]
impl GrantStore for MemoryGrantStore {
    async fn create(&self, data: &CreateGrant) -> AppResult<GrantCreation> {
        let mut rows = lock(&self.rows);

        if let Some(existing) = rows
            .iter()
            .find(|g| g.is_active && g.patient_id == data.patient_id && g.recipient_id == data.recipient_id)
        {
            return Ok(GrantCreation::Existing(existing.clone()));
        }

        let grant = Grant {
            id: GrantId::new(),
            patient_id: data.patient_id,
            owner_id: data.owner_id,
            recipient_id: data.recipient_id,
            permission_level: data.permission_level,
            is_active: true,
            invitation_id: data.invitation_id,
            created_at: data.created_at,
            deactivated_at: None,
        };
        rows.push(grant.clone());
        Ok(GrantCreation::Created(grant))
    }

    async fn find_by_id(&self, id: GrantId) -> AppResult<Option<Grant>> {
        Ok(lock(&self.rows).iter().find(|g| g.id == id).cloned())
    }

    async fn find_active(
        &self,
        patient_id: PatientId,
        recipient_id: UserId,
    ) -> AppResult<Option<Grant>> {
        Ok(lock(&self.rows)
            .iter()
            .find(|g| g.is_active && g.patient_id == patient_id && g.recipient_id == recipient_id)
            .cloned())
    }

    async fn find_latest_for_pair(
        &self,
        patient_id: PatientId,
        recipient_id: UserId,
    ) -> AppResult<Option<Grant>> {
        let pair: Vec<Grant> = lock(&self.rows)
            .iter()
            .filter(|g| g.patient_id == patient_id && g.recipient_id == recipient_id)
            .cloned()
            .collect();
        Ok(Self::newest_first(pair).into_iter().next())
    }

    async fn list_active_for_patient(&self, patient_id: PatientId) -> AppResult<Vec<Grant>> {
        let grants = lock(&self.rows)
            .iter()
            .filter(|g| g.is_active && g.patient_id == patient_id)
            .cloned()
            .collect();
        Ok(Self::newest_first(grants))
    }

    async fn list_active_for_recipient(&self, recipient_id: UserId) -> AppResult<Vec<Grant>> {
        let grants = lock(&self.rows)
            .iter()
            .filter(|g| g.is_active && g.recipient_id == recipient_id)
            .cloned()
            .collect();
        Ok(Self::newest_first(grants))
    }

    async fn deactivate(&self, id: GrantId, at: DateTime<Utc>) -> AppResult<bool> {
        let mut rows = lock(&self.rows);
        match rows.iter_mut().find(|g| g.id == id && g.is_active) {
            Some(grant) => {
                grant.is_active = false;
                grant.deactivated_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn deactivate_for_invitation(
        &self,
        id: GrantId,
        invitation_id: InvitationId,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut rows = lock(&self.rows);
        match rows
            .iter_mut()
            .find(|g| g.id == id && g.is_active && g.invitation_id == Some(invitation_id))
        {
            Some(grant) => {
                grant.is_active = false;
                grant.deactivated_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medshare_entity::grant::PermissionLevel;

    fn request(patient_id: PatientId, recipient_id: UserId) -> CreateGrant {
        CreateGrant {
            patient_id,
            owner_id: UserId::new(),
            recipient_id,
            permission_level: PermissionLevel::View,
            invitation_id: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_is_idempotent_per_pair() {
        let store = MemoryGrantStore::new();
        let data = request(PatientId::new(), UserId::new());

        let first = store.create(&data).await.unwrap();
        let second = store.create(&data).await.unwrap();

        assert!(first.was_created());
        assert!(!second.was_created());
        assert_eq!(first.grant().id, second.grant().id);
        assert_eq!(store.all().len(), 1);
    }

    #[tokio::test]
    async fn test_regrant_after_deactivate_keeps_history() {
        let store = MemoryGrantStore::new();
        let data = request(PatientId::new(), UserId::new());

        let first = store.create(&data).await.unwrap().into_grant();
        assert!(store.deactivate(first.id, Utc::now()).await.unwrap());
        assert!(!store.deactivate(first.id, Utc::now()).await.unwrap());

        let second = store.create(&data).await.unwrap();
        assert!(second.was_created());
        assert_ne!(second.grant().id, first.id);

        let rows = store.all();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.iter().filter(|g| g.is_active).count(), 1);
        let latest = store
            .find_latest_for_pair(data.patient_id, data.recipient_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.id, second.grant().id);
    }

    #[tokio::test]
    async fn test_deactivate_for_invitation_requires_matching_invitation() {
        let store = MemoryGrantStore::new();
        let invitation_id = InvitationId::new();
        let data = CreateGrant {
            invitation_id: Some(invitation_id),
            ..request(PatientId::new(), UserId::new())
        };
        let grant = store.create(&data).await.unwrap().into_grant();

        let other = store
            .deactivate_for_invitation(grant.id, InvitationId::new(), Utc::now())
            .await
            .unwrap();
        assert!(!other);
        assert!(store.all()[0].is_active);

        let own = store
            .deactivate_for_invitation(grant.id, invitation_id, Utc::now())
            .await
            .unwrap();
        assert!(own);
        assert!(!store.all()[0].is_active);
        assert!(
            !store
                .deactivate_for_invitation(grant.id, invitation_id, Utc::now())
                .await
                .unwrap()
        );
    }
}
