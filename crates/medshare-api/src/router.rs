//! Route definitions for the MedShare HTTP API.
//!
//! All routes are mounted under `/api`. The router receives `AppState` and
//! passes it to all handlers via Axum's `State` extractor.

use axum::Router;
use axum::routing::{delete, get, post};

use crate::handlers;
use crate::state::AppState;

/// Build the API router with every route bound to `state`.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(invitation_routes())
        .merge(share_routes())
        .merge(health_routes());

    Router::new().nest("/api", api_routes).with_state(state)
}

/// Invitation lifecycle: send, list pending, respond, cancel
fn invitation_routes() -> Router<AppState> {
    Router::new()
        .route("/invitations", post(handlers::invitation::send_invitation))
        .route("/invitations/pending", get(handlers::invitation::list_pending))
        .route("/invitations/{id}/respond", post(handlers::invitation::respond))
        .route("/invitations/{id}/cancel", post(handlers::invitation::cancel))
}

/// Grants: revoke, self-removal, listings
fn share_routes() -> Router<AppState> {
    Router::new()
        .route("/shares/revoke", post(handlers::sharing::revoke))
        .route("/shares/received", get(handlers::sharing::list_received))
        .route(
            "/shares/received/{patient_id}",
            delete(handlers::sharing::remove_own_access),
        )
        .route(
            "/patients/{patient_id}/shares",
            get(handlers::sharing::list_patient_shares),
        )
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
