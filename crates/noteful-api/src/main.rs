//! noteful-api server binary.

use std::ffi::OsStr;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::writer::BoxMakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use noteful_api::{build_router, ApiConfig, AppState};
use noteful_core::SessionRepository;
use noteful_crypto::PasswordHasher;
use noteful_db::{log_pool_metrics, Database};

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "noteful_api=debug,tower_http=debug";

/// How often expired sessions are swept.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let log_settings = LogSettings::from_lookup(|key| std::env::var(key).ok());
    let _log_guard = init_tracing(&log_settings);
    let log_target = log_settings
        .file
        .as_deref()
        .map_or_else(|| "(stdout)".to_string(), |p| p.display().to_string());
    info!(json = log_settings.json, log_file = %log_target, "Logging initialized");

    let config = ApiConfig::from_env();

    let hasher = PasswordHasher::new(config.hash_params)
        .context("invalid PASSWORD_HASH_* settings")?;

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect(&config.database_url, config.pool_config()).await?;
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    let state = AppState::from_database(&db, hasher, config.session_lifetime());
    tokio::spawn(purge_expired_sessions(db.clone()));

    let app = build_router(state, &config);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, closing database pool");
    db.close().await;
    Ok(())
}

/// Log output settings.
///
/// - `LOG_FORMAT`: `json` or `text` (default)
/// - `LOG_FILE`: log to this path with daily rotation instead of stdout
/// - `LOG_ANSI`: force colors on or off; files default to off
#[derive(Debug, Default, PartialEq)]
struct LogSettings {
    json: bool,
    file: Option<PathBuf>,
    ansi: Option<bool>,
}

impl LogSettings {
    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            json: lookup("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
            file: lookup("LOG_FILE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            ansi: lookup("LOG_ANSI").map(|v| v == "true" || v == "1"),
        }
    }
}

/// Install the global subscriber. Keep the guard alive to flush file output.
fn init_tracing(settings: &LogSettings) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let (writer, guard) = match &settings.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path.file_name().unwrap_or(OsStr::new("noteful-api.log"));
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, name));
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stdout), None),
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(settings.ansi.unwrap_or(settings.file.is_none()));
    let registry = tracing_subscriber::registry().with(filter);
    if settings.json {
        registry.with(layer.json()).init();
    } else {
        registry.with(layer).init();
    }
    guard
}

/// Periodically drop expired sessions and report pool health.
async fn purge_expired_sessions(db: Database) {
    let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
    loop {
        interval.tick().await;
        match db.sessions.purge_expired(Utc::now()).await {
            Ok(removed) if removed > 0 => info!(removed, "Purged expired sessions"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Session purge failed"),
        }
        log_pool_metrics(db.pool());
    }
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
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
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_settings_defaults_to_text_on_stdout() {
        assert_eq!(LogSettings::from_lookup(|_| None), LogSettings::default());
    }

    #[test]
    fn test_log_settings_from_env() {
        let settings = LogSettings::from_lookup(|key| match key {
            "LOG_FORMAT" => Some("JSON".to_string()),
            "LOG_FILE" => Some("/var/log/noteful/api.log".to_string()),
            "LOG_ANSI" => Some("1".to_string()),
            _ => None,
        });
        assert!(settings.json);
        assert_eq!(settings.file, Some(PathBuf::from("/var/log/noteful/api.log")));
        assert_eq!(settings.ansi, Some(true));
    }
}
