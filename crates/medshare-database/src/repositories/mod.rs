//! PostgreSQL implementations of the storage traits.

pub mod audit;
pub mod grant;
pub mod invitation;
pub mod patient;
pub mod user;

pub use audit::AuditLogRepository;
pub use grant::GrantRepository;
pub use invitation::InvitationRepository;
pub use patient::PatientRepository;
pub use user::UserRepository;

/// Whether a statement failed on a unique constraint (SQLSTATE 23505).
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Database(db_error) if db_error.code().as_deref() == Some("23505")
    )
}
