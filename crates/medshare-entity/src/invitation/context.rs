//! Structured payload carried by an invitation.

use serde::{Deserialize, Serialize};

use medshare_core::types::PatientId;

use crate::grant::PermissionLevel;
use crate::patient::PatientSnapshot;

use super::status::InvitationKind;

/// What an invitation offers: one or more patient snapshots at a single
/// permission level.
///
/// Serialized into the `context` JSONB column with a `type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InvitationContext {
    /// Exactly one patient.
    Single {
        /// The offered patient.
        patient: PatientSnapshot,
        /// Access tier offered.
        permission_level: PermissionLevel,
    },
    /// Several patients offered together.
    Bulk {
        /// The offered patients, in the order the sender listed them.
        patients: Vec<PatientSnapshot>,
        /// Access tier offered for every patient.
        permission_level: PermissionLevel,
    },
}

impl InvitationContext {
    /// Build a context from snapshots. One snapshot yields a single
    /// invitation, more yield a bulk one. Returns `None` when empty.
    pub fn from_snapshots(
        mut snapshots: Vec<PatientSnapshot>,
        permission_level: PermissionLevel,
    ) -> Option<Self> {
        match snapshots.len() {
            0 => None,
            1 => snapshots.pop().map(|patient| Self::Single {
                patient,
                permission_level,
            }),
            _ => Some(Self::Bulk {
                patients: snapshots,
                permission_level,
            }),
        }
    }

    /// The invitation kind implied by the payload.
    pub fn kind(&self) -> InvitationKind {
        match self {
            Self::Single { .. } => InvitationKind::Single,
            Self::Bulk { .. } => InvitationKind::Bulk,
        }
    }

    /// The offered permission level.
    pub fn permission_level(&self) -> PermissionLevel {
        match self {
            Self::Single {
                permission_level, ..
            }
            | Self::Bulk {
                permission_level, ..
            } => *permission_level,
        }
    }

    /// The offered patient snapshots.
    pub fn patients(&self) -> &[PatientSnapshot] {
        match self {
            Self::Single { patient, .. } => std::slice::from_ref(patient),
            Self::Bulk { patients, .. } => patients,
        }
    }

    /// IDs of the offered patients.
    pub fn patient_ids(&self) -> Vec<PatientId> {
        self.patients().iter().map(|p| p.id).collect()
    }

    /// Number of offered patients.
    pub fn patient_count(&self) -> usize {
        self.patients().len()
    }

    /// Whether the invitation offers `patient_id`.
    pub fn contains(&self, patient_id: PatientId) -> bool {
        self.patients().iter().any(|p| p.id == patient_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(name: &str) -> PatientSnapshot {
        PatientSnapshot {
            id: PatientId::new(),
            display_name: name.to_string(),
            birth_date: None,
        }
    }

    #[test]
    fn test_from_snapshots_picks_kind() {
        assert!(InvitationContext::from_snapshots(vec![], PermissionLevel::View).is_none());

        let single = InvitationContext::from_snapshots(vec![snapshot("A")], PermissionLevel::Edit)
            .expect("single");
        assert_eq!(single.kind(), InvitationKind::Single);
        assert_eq!(single.permission_level(), PermissionLevel::Edit);
        assert_eq!(single.patient_count(), 1);

        let a = snapshot("A");
        let b = snapshot("B");
        let bulk = InvitationContext::from_snapshots(vec![a.clone(), b.clone()], PermissionLevel::View)
            .expect("bulk");
        assert_eq!(bulk.kind(), InvitationKind::Bulk);
        assert_eq!(bulk.patient_ids(), vec![a.id, b.id]);
        assert!(bulk.contains(b.id));
        assert!(!bulk.contains(PatientId::new()));
    }

    #[test]
    fn test_json_shape() {
        let patient = snapshot("Jane Roe");
        let ctx = InvitationContext::Single {
            patient: patient.clone(),
            permission_level: PermissionLevel::View,
        };
        let value = serde_json::to_value(&ctx).expect("serialize");
        assert_eq!(value["type"], "single");
        assert_eq!(value["permission_level"], "view");
        assert_eq!(value["patient"]["display_name"], "Jane Roe");

        let back: InvitationContext = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, ctx);
    }
}
