//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use medshare_core::error::AppError;
use medshare_core::result::AppResult;
use medshare_core::types::{PatientId, UserId};
use medshare_entity::grant::PermissionLevel;
use medshare_entity::invitation::{InvitationKind, InvitationResponse};
use medshare_service::sharing::SendInvitationRequest as SendCommand;

/// Run `validator` rules and turn failures into a validation error.
pub fn validated<T: Validate>(req: T) -> AppResult<T> {
    req.validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))?;
    Ok(req)
}

/// Send-invitation request body.
///
/// Accepts either a single `patient_id` or a `patient_ids` list.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendInvitationRequest {
    /// Username or email of the recipient.
    #[validate(length(min = 1, max = 320, message = "Recipient identifier is required"))]
    pub recipient_identifier: String,
    /// Single patient to share.
    #[serde(default)]
    pub patient_id: Option<PatientId>,
    /// Patients to share in one bulk invitation.
    #[serde(default)]
    pub patient_ids: Option<Vec<PatientId>>,
    /// `"view"` or `"edit"`.
    #[validate(length(min = 1, message = "Permission level is required"))]
    pub permission_level: String,
    /// Optional note shown to the recipient.
    #[serde(default)]
    pub message: Option<String>,
    /// Hours until the invitation expires.
    #[serde(default)]
    #[validate(range(min = 1, message = "expires_hours must be positive"))]
    pub expires_hours: Option<i64>,
}

impl SendInvitationRequest {
    /// Convert into the service command, parsing the permission level.
    pub fn into_command(self) -> AppResult<SendCommand> {
        let patient_ids = match (self.patient_id, self.patient_ids) {
            (Some(_), Some(_)) => {
                return Err(AppError::validation(
                    "Provide either patient_id or patient_ids, not both",
                ));
            }
            (Some(id), None) => vec![id],
            (None, Some(ids)) => ids,
            (None, None) => {
                return Err(AppError::validation(
                    "patient_id or patient_ids is required",
                ));
            }
        };

        Ok(SendCommand {
            recipient_identifier: self.recipient_identifier,
            patient_ids,
            permission_level: self.permission_level.parse::<PermissionLevel>()?,
            message: self.message,
            expires_hours: self.expires_hours,
        })
    }
}

/// Respond-to-invitation request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RespondRequest {
    /// `"accepted"` or `"rejected"`.
    #[validate(length(min = 1, message = "Response is required"))]
    pub response: String,
    /// Optional note for the sender.
    #[serde(default)]
    pub response_note: Option<String>,
}

impl RespondRequest {
    /// Parse the response keyword.
    pub fn response(&self) -> AppResult<InvitationResponse> {
        self.response.parse()
    }
}

/// Revoke request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeRequest {
    /// The owner's patient.
    pub patient_id: PatientId,
    /// Recipient losing access.
    pub recipient_id: UserId,
}

/// Query for the pending-invitation listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PendingQuery {
    /// `"single"` or `"bulk"`.
    pub invitation_type: Option<String>,
}

impl PendingQuery {
    /// Parse the optional kind filter. Blank means no filter.
    pub fn kind(&self) -> AppResult<Option<InvitationKind>> {
        self.invitation_type
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(str::parse)
            .transpose()
    }
}
