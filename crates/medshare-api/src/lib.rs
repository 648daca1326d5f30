//! # medshare-api
//!
//! HTTP API layer for MedShare built on Axum.
//!
//! Provides the invitation and sharing endpoints, the caller-identity
//! extractor, request logging and CORS middleware, DTOs, and the mapping
//! from [`medshare_core::AppError`] to HTTP responses.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use state::AppState;
