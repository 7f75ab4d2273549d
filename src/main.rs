use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::sync::Arc;
use std::time::Duration;

use hookgate::config::Config;
use hookgate::coordinator::Coordinator;
use hookgate::db::{create_pool, init_db, AppState, SqliteEventStore};
use hookgate::handlers;
use hookgate::processor::LogProcessor;
use hookgate::signature::SignatureVerifier;

/// How often the background cleanup task runs.
const CLEANUP_INTERVAL_SECS: u64 = 3600;

#[derive(Parser, Debug)]
#[command(name = "hookgate")]
#[command(about = "Webhook ingestion gateway with at-most-once event processing")]
struct Cli {
    /// Purge webhook events older than the retention period, then exit
    #[arg(long)]
    purge: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Periodically purges event records past the retention period.
/// Retention cleanup never runs on the ingestion hot path.
fn spawn_cleanup_task(store: SqliteEventStore, retention_days: i64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(CLEANUP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            match store.purge_older_than(retention_days) {
                Ok(count) if count > 0 => {
                    tracing::info!(
                        "Purged {} webhook events older than {} days",
                        count,
                        retention_days
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Failed to purge old webhook events: {}", e);
                }
            }
        }
    });
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hookgate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let mut config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    if config.webhook_secret.is_empty() {
        if config.dev_mode {
            tracing::warn!("WEBHOOK_SECRET not set, using dev placeholder secret");
            config.webhook_secret = "whsec_dev".to_string();
        } else {
            eprintln!("WEBHOOK_SECRET must be set outside dev mode");
            std::process::exit(1);
        }
    }

    // Create database connection pool and initialize schema
    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let store = SqliteEventStore::new(db_pool);

    // --purge: run retention cleanup and exit (for cron-style operation)
    if cli.purge {
        if config.event_retention_days <= 0 {
            tracing::info!("EVENT_RETENTION_DAYS is 0, retention disabled; nothing to purge");
            return;
        }
        match store.purge_older_than(config.event_retention_days) {
            Ok(count) => {
                tracing::info!(
                    "Purged {} webhook events older than {} days",
                    count,
                    config.event_retention_days
                );
            }
            Err(e) => {
                eprintln!("Purge failed: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    // Purge old events on startup, then keep purging in the background
    // (0 = never purge)
    if config.event_retention_days > 0 {
        match store.purge_older_than(config.event_retention_days) {
            Ok(count) if count > 0 => {
                tracing::info!(
                    "Purged {} webhook events older than {} days",
                    count,
                    config.event_retention_days
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Failed to purge old webhook events: {}", e);
            }
        }
        spawn_cleanup_task(store.clone(), config.event_retention_days);
    }

    let state = AppState {
        coordinator: Coordinator::new(store),
        verifier: SignatureVerifier::new(
            config.webhook_secret.clone(),
            config.signature_tolerance_secs,
        ),
        processor: Arc::new(LogProcessor),
    };

    // Build the application router
    let app = handlers::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    // Track if we should clean up on exit
    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("Hookgate server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    // Cleanup on exit if ephemeral mode
    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral database...");
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        // Also remove WAL and SHM files if they exist
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
        tracing::info!("Ephemeral cleanup complete");
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
