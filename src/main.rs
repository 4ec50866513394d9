//! classgated - the Classgate authorization service daemon.

use classgate::authz::AuthorizationEngine;
use classgate::config::Config;
use classgate::db::Database;
use classgate::http::{self, AppState};
use classgate::metrics;
use classgate::services::admins::AdminService;
use classgate::services::notify::{Notifier, NullNotifier, WebhookNotifier};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(server = %config.server.name, "Starting classgated");

    metrics::init();

    let db = Database::new(&config.database.path).await?;
    let engine = AuthorizationEngine::new(db.clone());

    let notifier: Arc<dyn Notifier> = match &config.notifications {
        Some(relay) => {
            info!(endpoint = %relay.webhook_url, "Notification relay configured");
            Arc::new(WebhookNotifier::new(relay.webhook_url.clone()))
        }
        None => {
            info!("No notification relay configured; deliveries will be dropped");
            Arc::new(NullNotifier)
        }
    };

    let admins = AdminService::new(
        db.clone(),
        engine.clone(),
        config.admin_defaults.secondary_permissions,
        notifier,
    );

    let state = AppState { db, engine, admins };
    http::serve(state, config.listen.address).await?;

    Ok(())
}
