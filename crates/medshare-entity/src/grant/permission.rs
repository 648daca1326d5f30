//! Permission levels a grant can carry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use medshare_core::error::{AppError, ErrorCode};

/// Access tier recorded on a grant.
///
/// Ordered by privilege: Edit > View.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "permission_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    /// Read-only access to the patient record.
    View,
    /// Read and write access to the patient record.
    Edit,
}

impl PermissionLevel {
    /// Every supported level, lowest privilege first.
    pub const ALL: [PermissionLevel; 2] = [Self::View, Self::Edit];

    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::View => 1,
            Self::Edit => 2,
        }
    }

    /// Check if this level allows modifying the record.
    pub fn can_edit(&self) -> bool {
        matches!(self, Self::Edit)
    }

    /// Return the level as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PermissionLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "view" => Ok(Self::View),
            "edit" => Ok(Self::Edit),
            _ => Err(AppError::coded(
                ErrorCode::InvalidPermissionLevel,
                format!("Invalid permission level: '{s}' (expected one of: view, edit)"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("view".parse::<PermissionLevel>().ok(), Some(PermissionLevel::View));
        assert_eq!(" Edit ".parse::<PermissionLevel>().ok(), Some(PermissionLevel::Edit));
    }

    #[test]
    fn test_parse_rejects_unknown_level() {
        let err = "admin".parse::<PermissionLevel>().unwrap_err();
        assert!(err.is(ErrorCode::InvalidPermissionLevel));
        assert!(err.message.contains("admin"));
    }

    #[test]
    fn test_privilege_order() {
        assert!(PermissionLevel::Edit.privilege_level() > PermissionLevel::View.privilege_level());
        assert!(PermissionLevel::Edit.can_edit());
        assert!(!PermissionLevel::View.can_edit());
    }
}
