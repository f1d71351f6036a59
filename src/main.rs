//! Application entry point and server initialization
//!
//! Startup is strictly ordered: configuration, logging, record store, optional
//! seeding, view compilation, then serving. Any failure before serving is
//! fatal and the process exits non-zero.

use dotenvy::dotenv;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use songlink::config::{Config, DEFAULT_LOG_FILTER};
use songlink::database::{init_db, load_seed_file};
use songlink::error::StartupError;
use songlink::renderer::TemplateRenderer;
use songlink::route::create_app;
use songlink::service::Resolver;
use songlink::state::AppState;
use songlink::store;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file if it exists
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Startup failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = Config::from_env()?;
    info!(backend = ?config.backend, database = %config.database_url, "Initializing the record store");

    let db = init_db(&config.database_url).map_err(StartupError::BackendUnavailable)?;
    let db = Arc::new(db);

    if let Some(path) = &config.seed_file {
        let records = load_seed_file(path)?;
        let total = records.len();
        let inserted = store::seed(config.backend, &db, records)
            .await
            .map_err(|err| StartupError::Seed(err.to_string()))?;
        info!(inserted, total, "Seeded records");
    }

    info!(dir = %config.template_dir.display(), "Compiling views");
    let renderer = TemplateRenderer::from_dir(&config.template_dir)?;

    let resolver = Resolver::new(
        store::open(config.backend, db),
        Arc::new(renderer),
        &config.redirect_base,
        config.counter_timeout,
    );
    let app = create_app(AppState::new(resolver)).layer(TraceLayer::new_for_http());

    // Bind to all network interfaces on the configured port
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("API server listening on port {}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on SIGINT (Ctrl+C) or, on Unix, SIGTERM
///
/// Open connections are allowed to complete before the server stops, and the
/// database handle is dropped cleanly afterwards.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping server");
}
