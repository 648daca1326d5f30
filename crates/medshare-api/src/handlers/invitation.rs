//! Invitation send, list, respond, and cancel handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use medshare_core::types::InvitationId;

use crate::dto::request::{PendingQuery, RespondRequest, SendInvitationRequest, validated};
use crate::dto::response::{
    ApiResponse, CancelResponse, PendingInvitationResponse, RespondResponse,
    SendInvitationResponse,
};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/invitations
pub async fn send_invitation(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<SendInvitationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SendInvitationResponse>>), ApiError> {
    let command = validated(req)?.into_command()?;
    let outcome = state.invitation_service.send(&auth, command).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(SendInvitationResponse::from(outcome))),
    ))
}

/// GET /api/invitations/pending
pub async fn list_pending(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PendingQuery>,
) -> Result<Json<ApiResponse<Vec<PendingInvitationResponse>>>, ApiError> {
    let pending = state
        .invitation_service
        .list_pending(&auth, query.kind()?)
        .await?;

    Ok(Json(ApiResponse::ok(
        pending.into_iter().map(Into::into).collect(),
    )))
}

/// POST /api/invitations/{id}/respond
pub async fn respond(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<InvitationId>,
    Json(req): Json<RespondRequest>,
) -> Result<Json<ApiResponse<RespondResponse>>, ApiError> {
    let req = validated(req)?;
    let response = req.response()?;

    let outcome = state
        .invitation_service
        .respond(&auth, id, response, req.response_note)
        .await?;

    Ok(Json(ApiResponse::ok(outcome.into())))
}

/// POST /api/invitations/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<InvitationId>,
) -> Result<Json<ApiResponse<CancelResponse>>, ApiError> {
    let invitation = state.invitation_service.cancel(&auth, id).await?;
    Ok(Json(ApiResponse::ok(invitation.into())))
}
