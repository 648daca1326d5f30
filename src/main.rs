//! MedShare Server: patient record sharing and invitations.
//!
//! Main entry point that wires all crates together and starts the server.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use medshare_api::{AppState, build_app};
use medshare_core::config::AppConfig;
use medshare_core::error::AppError;
use medshare_core::traits::{Clock, SystemClock};
use medshare_database::DatabasePool;
use medshare_database::migration::run_migrations;
use medshare_database::repositories::{
    AuditLogRepository, GrantRepository, InvitationRepository, PatientRepository, UserRepository,
};
use medshare_database::{AuditSink, GrantStore, InvitationStore, PatientDirectory, UserDirectory};
use medshare_service::{ActivityRecorder, InvitationService, OwnershipVerifier, SharingService};
use medshare_worker::CronScheduler;
use medshare_worker::jobs::ExpirySweepTask;

#[tokio::main]
async fn main() {
    let env = std::env::var("MEDSHARE_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting MedShare v{}", env!("CARGO_PKG_VERSION"));

    // Database connection + migrations
    let db_pool = DatabasePool::connect(&config.database).await?;
    if config.database.run_migrations {
        run_migrations(db_pool.pool()).await?;
    }

    // Stores
    let pool = db_pool.pool().clone();
    let invitations: Arc<dyn InvitationStore> = Arc::new(InvitationRepository::new(pool.clone()));
    let grants: Arc<dyn GrantStore> = Arc::new(GrantRepository::new(pool.clone()));
    let patients: Arc<dyn PatientDirectory> = Arc::new(PatientRepository::new(pool.clone()));
    let users: Arc<dyn UserDirectory> = Arc::new(UserRepository::new(pool.clone()));
    let audit: Arc<dyn AuditSink> = Arc::new(AuditLogRepository::new(pool));

    // Services
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let ownership = Arc::new(OwnershipVerifier::new(patients));
    let activity = Arc::new(ActivityRecorder::new(audit));

    let invitation_service = Arc::new(InvitationService::new(
        Arc::clone(&invitations),
        Arc::clone(&grants),
        Arc::clone(&ownership),
        Arc::clone(&users),
        Arc::clone(&activity),
        Arc::clone(&clock),
        config.sharing.clone(),
    ));
    let sharing_service = Arc::new(SharingService::new(
        grants,
        invitations,
        ownership,
        users,
        activity,
        clock,
    ));

    // Background worker
    let mut scheduler = if config.worker.enabled {
        let scheduler = CronScheduler::new().await?;
        scheduler
            .register_default_tasks(
                &config.worker,
                ExpirySweepTask::new(Arc::clone(&invitation_service)),
            )
            .await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    // HTTP server
    let app_state = AppState {
        config: Arc::new(config.clone()),
        db_pool: Some(db_pool.clone()),
        invitation_service,
        sharing_service,
    };

    let app = build_app(app_state);
    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("MedShare server listening on {}", addr);

    let (signal_tx, mut signal_rx) = watch::channel(false);
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = signal_tx.send(true);
    });

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let drain_deadline = async move {
        if signal_rx.wait_for(|fired| *fired).await.is_ok() {
            tokio::time::sleep(grace).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server.into_future() => {
            result.map_err(|e| AppError::internal(format!("Server error: {e}")))?;
        }
        () = drain_deadline => {
            tracing::warn!(
                grace_seconds = config.server.shutdown_grace_seconds,
                "Shutdown grace period elapsed with requests in flight"
            );
        }
    }

    if let Some(scheduler) = scheduler.as_mut() {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!(error = %e, "Failed to stop scheduler cleanly");
        }
    }
    db_pool.close().await;

    tracing::info!("MedShare server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
