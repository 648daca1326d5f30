//! Grant revocation and listing handlers.

use axum::Json;
use axum::extract::{Path, State};

use medshare_core::types::PatientId;

use crate::dto::request::RevokeRequest;
use crate::dto::response::{
    ApiResponse, GrantResponse, RemoveAccessResponse, RevokeResponse, SharedPatientResponse,
};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/shares/revoke
pub async fn revoke(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<RevokeRequest>,
) -> Result<Json<ApiResponse<RevokeResponse>>, ApiError> {
    let outcome = state
        .sharing_service
        .revoke(&auth, req.patient_id, req.recipient_id)
        .await?;

    Ok(Json(ApiResponse::ok(outcome.into())))
}

/// DELETE /api/shares/received/{patient_id}
pub async fn remove_own_access(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(patient_id): Path<PatientId>,
) -> Result<Json<ApiResponse<RemoveAccessResponse>>, ApiError> {
    let removed = state
        .sharing_service
        .remove_own_access(&auth, patient_id)
        .await?;

    Ok(Json(ApiResponse::ok(RemoveAccessResponse { ok: true, removed })))
}

/// GET /api/shares/received
pub async fn list_received(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<SharedPatientResponse>>>, ApiError> {
    let shared = state.sharing_service.list_shared_patients(&auth).await?;
    Ok(Json(ApiResponse::ok(
        shared.into_iter().map(Into::into).collect(),
    )))
}

/// GET /api/patients/{patient_id}/shares
pub async fn list_patient_shares(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(patient_id): Path<PatientId>,
) -> Result<Json<ApiResponse<Vec<GrantResponse>>>, ApiError> {
    let grants = state
        .sharing_service
        .list_grants_for_patient(&auth, patient_id)
        .await?;

    Ok(Json(ApiResponse::ok(
        grants.into_iter().map(Into::into).collect(),
    )))
}
