use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use persona_imagegen::{FalClient, FalConfig};
use persona_pipeline::{
    ExpiryReaper, GenerationPipeline, LocalImageStore, PgStore, PipelineSettings, UserLocks,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use persona_api::background;
use persona_api::config::ServerConfig;
use persona_api::router::build_app_router;
use persona_api::seed::seed_admin;
use persona_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "persona_api=debug,persona_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let fal_config = FalConfig::from_env();
    tracing::info!(model = %fal_config.model, "Loaded image provider configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = persona_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    persona_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    persona_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    if let Err(e) = seed_admin(&pool, &config).await {
        tracing::error!(error = %e, "Admin seeding failed");
    }

    // --- Storage ---
    tokio::fs::create_dir_all(&config.uploads_dir)
        .await
        .expect("Failed to create uploads directory");
    tracing::info!(uploads_dir = %config.uploads_dir.display(), "Uploads directory ready");

    // --- Pipeline ---
    let settings = PipelineSettings {
        retention_days: config.retention_days,
        image_size: fal_config.image_size,
    };
    let provider = FalClient::new(fal_config).expect("Failed to build image provider client");
    let store = Arc::new(PgStore::new(pool.clone()));
    let locks = UserLocks::new();

    let pipeline = GenerationPipeline::new(
        store.clone(),
        Arc::new(provider),
        LocalImageStore::new(&config.uploads_dir),
        locks.clone(),
        settings,
    );

    // --- Expiry sweep ---
    let cancel = CancellationToken::new();
    let reaper = ExpiryReaper::new(store, LocalImageStore::new(&config.uploads_dir), locks);
    let sweep_handle = tokio::spawn(background::expiry_sweep::run(
        reaper,
        Duration::from_secs(config.expiry_sweep_interval_secs),
        cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        pipeline: Arc::new(pipeline),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let grace = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(grace, sweep_handle).await.is_err() {
        tracing::warn!("Expiry sweep did not stop in time");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
