//! SocialHub Server: device sessions and realtime notifications.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::get;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, fmt};

use socialhub_auth::jwt::TokenSigner;
use socialhub_auth::session::{SessionCleanup, SessionManager, SessionStore};
use socialhub_core::config::AppConfig;
use socialhub_core::error::AppError;
use socialhub_core::traits::{Clock, SystemClock};
use socialhub_database::{DatabasePool, Repositories};
use socialhub_realtime::RealtimeEngine;
use socialhub_realtime::connection::WsAuthenticator;
use socialhub_realtime::ws::{self, WsState};
use socialhub_service::NotificationService;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from `config/` and `SOCIALHUB__*` environment variables.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("SOCIALHUB_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env).map_err(|e| e.context(format!("Loading '{env}' configuration")))
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

/// State of the health endpoint.
#[derive(Clone)]
struct HealthState {
    engine: RealtimeEngine,
    pool: Option<DatabasePool>,
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting SocialHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Repositories ─────────────────────────────────────
    let repos = Repositories::from_config(&config.database).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // ── Step 2: Auth ─────────────────────────────────────────────
    let signer = Arc::new(TokenSigner::new(&config.auth, Arc::clone(&clock)));
    let session_store = Arc::new(SessionStore::new(Arc::clone(&repos.sessions)));
    let session_manager = Arc::new(SessionManager::new(
        signer,
        Arc::clone(&session_store),
        Arc::clone(&clock),
        config.session.clone(),
    ));
    tracing::info!("Authentication initialized");

    // ── Step 3: Realtime engine + notifications ──────────────────
    let (engine, dispatcher) = RealtimeEngine::new(&config.realtime, Arc::clone(&clock));
    let notification_service = Arc::new(NotificationService::new(
        Arc::clone(&repos.notifications),
        engine.clone(),
    ));

    // ── Step 4: Background tasks ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let dispatcher_handle = tokio::spawn(dispatcher.run(shutdown_rx.clone()));

    let cleanup_handle = if config.session.cleanup_interval_minutes > 0 {
        let cleanup = SessionCleanup::new(session_store, Arc::clone(&clock));
        let interval =
            std::time::Duration::from_secs(config.session.cleanup_interval_minutes * 60);
        Some(tokio::spawn(cleanup.run_periodic(interval, shutdown_rx.clone())))
    } else {
        tracing::info!("Session cleanup disabled");
        None
    };

    // ── Step 5: HTTP router ──────────────────────────────────────
    let ws_state = WsState {
        engine: engine.clone(),
        authenticator: WsAuthenticator::new(session_manager),
        inbound: notification_service,
    };
    let health = Router::new()
        .route("/health", get(health_handler))
        .with_state(HealthState {
            engine: engine.clone(),
            pool: repos.pool.clone(),
        });
    let app = ws::router(ws_state)
        .merge(health)
        .layer(TraceLayer::new_for_http());

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(address = %addr, "SocialHub server listening");

    // ── Step 6: Graceful shutdown ────────────────────────────────
    let shutdown_engine = engine.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            let _ = shutdown_tx.send(true);
            shutdown_engine.shutdown();
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    tracing::info!("Waiting for background tasks to complete...");
    let grace = std::time::Duration::from_secs(config.server.shutdown_grace_seconds);
    let _ = tokio::time::timeout(grace, dispatcher_handle).await;
    if let Some(handle) = cleanup_handle {
        let _ = tokio::time::timeout(grace, handle).await;
    }
    if let Some(pool) = repos.pool {
        pool.close().await;
    }

    tracing::info!("SocialHub server shut down gracefully");
    Ok(())
}

/// GET /health
async fn health_handler(State(state): State<HealthState>) -> Json<serde_json::Value> {
    let database = match &state.pool {
        Some(pool) => match pool.health_check().await {
            Ok(true) => "ok",
            Ok(false) => "unavailable",
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                "unavailable"
            }
        },
        None => "memory",
    };

    Json(serde_json::json!({
        "status": "ok",
        "database": database,
        "connections": state.engine.connections.connection_count(),
        "online_users": state.engine.connections.online_user_count(),
        "metrics": state.engine.metrics_snapshot(),
    }))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
