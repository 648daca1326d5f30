//! Shared application state for Axum handlers.

use std::sync::Arc;

use medshare_core::config::AppConfig;
use medshare_database::DatabasePool;
use medshare_service::{InvitationService, SharingService};

/// State handed to every handler through Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// Database pool, absent when the services run on in-memory stores.
    pub db_pool: Option<DatabasePool>,
    /// Invitation lifecycle.
    pub invitation_service: Arc<InvitationService>,
    /// Grant revocation and listings.
    pub sharing_service: Arc<SharingService>,
}
