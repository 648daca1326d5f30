//! Unified application error types for MedShare.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. Sharing failures additionally carry
//! an [`ErrorCode`] so callers can branch on the exact reason without
//! parsing messages.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// No authenticated caller could be determined.
    Unauthorized,
    /// The caller is not allowed to act on the resource.
    Forbidden,
    /// Input validation failed.
    Validation,
    /// A uniqueness rule was violated (duplicate share, pending invitation).
    Conflict,
    /// The resource is not in a state that permits the operation.
    InvalidState,
    /// The resource has passed its expiry.
    Expired,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal server error occurred.
    Internal,
    /// The service is temporarily unavailable.
    ServiceUnavailable,
}

impl ErrorKind {
    /// Whether this kind represents an infrastructure failure rather than a
    /// handled domain outcome.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Database | Self::Configuration | Self::Serialization | Self::Internal
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Unauthorized => write!(f, "UNAUTHORIZED"),
            Self::Forbidden => write!(f, "FORBIDDEN"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::InvalidState => write!(f, "INVALID_STATE"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::ServiceUnavailable => write!(f, "SERVICE_UNAVAILABLE"),
        }
    }
}

/// Machine-readable reason attached to sharing errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The recipient handle did not resolve to a user.
    RecipientNotFound,
    /// The patient does not exist (or no longer exists).
    PatientNotFound,
    /// The patient exists but is owned by another user.
    NotOwner,
    /// No invitation with the given ID.
    InvitationNotFound,
    /// No grant exists for the given patient/recipient pair.
    GrantNotFound,
    /// The caller is not the invitation's recipient.
    NotRecipient,
    /// The caller is not the invitation's sender.
    NotSender,
    /// The recipient already holds an active grant for the patient.
    AlreadyShared,
    /// A pending invitation already targets the recipient for the patient.
    PendingInvitationExists,
    /// The permission level is not one of the supported levels.
    InvalidPermissionLevel,
    /// The invitation has left the pending state.
    InvalidState,
    /// The invitation expired before it was answered.
    Expired,
    /// The sender tried to share with themselves.
    SelfShare,
}

impl ErrorCode {
    /// The broad error kind implied by this code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RecipientNotFound
            | Self::PatientNotFound
            | Self::InvitationNotFound
            | Self::GrantNotFound => ErrorKind::NotFound,
            Self::NotOwner | Self::NotRecipient | Self::NotSender => ErrorKind::Forbidden,
            Self::AlreadyShared | Self::PendingInvitationExists => ErrorKind::Conflict,
            Self::InvalidPermissionLevel | Self::SelfShare => ErrorKind::Validation,
            Self::InvalidState => ErrorKind::InvalidState,
            Self::Expired => ErrorKind::Expired,
        }
    }

    /// Return the code as an upper snake case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RecipientNotFound => "RECIPIENT_NOT_FOUND",
            Self::PatientNotFound => "PATIENT_NOT_FOUND",
            Self::NotOwner => "NOT_OWNER",
            Self::InvitationNotFound => "INVITATION_NOT_FOUND",
            Self::GrantNotFound => "GRANT_NOT_FOUND",
            Self::NotRecipient => "NOT_RECIPIENT",
            Self::NotSender => "NOT_SENDER",
            Self::AlreadyShared => "ALREADY_SHARED",
            Self::PendingInvitationExists => "PENDING_INVITATION_EXISTS",
            Self::InvalidPermissionLevel => "INVALID_PERMISSION_LEVEL",
            Self::InvalidState => "INVALID_STATE",
            Self::Expired => "EXPIRED",
            Self::SelfShare => "SELF_SHARE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The unified application error used throughout MedShare.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// The specific sharing reason, when one applies.
    pub code: Option<ErrorCode>,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Create an error for a specific sharing reason. The kind is derived
    /// from the code.
    pub fn coded(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            kind: code.kind(),
            code: Some(code),
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether this error carries the given code.
    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == Some(code)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a service-unavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            code: self.code,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coded_error_derives_kind() {
        let err = AppError::coded(ErrorCode::AlreadyShared, "already shared");
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert!(err.is(ErrorCode::AlreadyShared));
        assert!(!err.is(ErrorCode::PendingInvitationExists));
    }

    #[test]
    fn test_code_kinds() {
        assert_eq!(ErrorCode::RecipientNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(ErrorCode::NotOwner.kind(), ErrorKind::Forbidden);
        assert_eq!(ErrorCode::InvalidPermissionLevel.kind(), ErrorKind::Validation);
        assert_eq!(ErrorCode::Expired.kind(), ErrorKind::Expired);
        assert_eq!(ErrorCode::InvalidState.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_clone_keeps_code_and_drops_source() {
        let io = std::io::Error::other("boom");
        let mut err = AppError::with_source(ErrorKind::Database, "store down", io);
        err.code = Some(ErrorCode::GrantNotFound);
        let cloned = err.clone();
        assert_eq!(cloned.code, Some(ErrorCode::GrantNotFound));
        assert!(cloned.source.is_none());
    }

    #[test]
    fn test_display() {
        let err = AppError::coded(ErrorCode::Expired, "Invitation abc has expired");
        assert_eq!(err.to_string(), "EXPIRED: Invitation abc has expired");
        assert_eq!(
            serde_json::to_string(&ErrorCode::PendingInvitationExists).expect("serialize"),
            "\"PENDING_INVITATION_EXISTS\""
        );
    }

    #[test]
    fn test_fatal_kinds() {
        assert!(ErrorKind::Database.is_fatal());
        assert!(!ErrorKind::Conflict.is_fatal());
    }
}
