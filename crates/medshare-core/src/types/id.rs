//! Typed identifiers for every record the sharing subsystem touches.
//!
//! Each is a transparent wrapper over a v4 [`uuid::Uuid`], so a `UserId` can
//! never be passed where a `PatientId` is expected. With the `sqlx` feature
//! they bind and decode as PostgreSQL `UUID` (and `UUID[]`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// The wrapped UUID.
            pub fn into_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

define_id!(
    /// Unique identifier for a user account (owner or recipient).
    UserId
);

define_id!(
    /// Unique identifier for a patient record held in the patient directory.
    PatientId
);

define_id!(
    /// Unique identifier for a sharing invitation.
    InvitationId
);

define_id!(
    /// Unique identifier for an access grant.
    GrantId
);

define_id!(
    /// Unique identifier for an audit log entry.
    AuditLogId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse_match_uuid() {
        let uuid = Uuid::new_v4();
        let id = InvitationId::from(uuid);
        assert_eq!(id.to_string(), uuid.to_string());
        let parsed: InvitationId = id.to_string().parse().expect("should parse");
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<InvitationId>().is_err());
    }

    #[test]
    fn test_distinct_types_share_uuid() {
        let uuid = Uuid::new_v4();
        let patient = PatientId::from(uuid);
        let grant: GrantId = uuid.into();
        assert_eq!(patient.into_uuid(), grant.into_uuid());
    }

    #[test]
    fn test_serde_roundtrip() {
        let id = UserId::new();
        let json = serde_json::to_string(&id).expect("serialize");
        let parsed: UserId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(id, parsed);
    }
}
