use anyhow::{Context, Result};
use log::{info, warn};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;

use crate::core::config::AppConfig;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{create_conn, run_migrations};
use crate::crm::{CrmServices, CrmStore, MemoryStore, PgStore};
use crate::email::{NotificationDispatcher, NotificationSink};
use crate::security::jwt::JwtManager;
use crate::security::password::CredentialHasher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Always)
        .init();
}

/// Opens the configured store. PostgreSQL stores are migrated first.
pub fn open_store(config: &AppConfig, backend: StorageBackend) -> Result<Arc<dyn CrmStore>> {
    match backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; all data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let pool = create_conn(&config.database).context("Failed to connect to PostgreSQL")?;
            run_migrations(&pool).context("Failed to run database migrations")?;
            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}

pub fn notification_sink(config: &AppConfig) -> Result<Arc<dyn NotificationSink>> {
    if !config.email.enabled {
        info!("Email delivery disabled, notifications will be logged");
        return Ok(Arc::new(crate::email::LogSink));
    }

    smtp_sink(config)
}

#[cfg(feature = "mail")]
fn smtp_sink(config: &AppConfig) -> Result<Arc<dyn NotificationSink>> {
    let sink = crate::email::SmtpSink::from_config(&config.email)
        .context("Failed to configure SMTP transport")?;
    info!(
        "Email notifications via {}:{}",
        config.email.smtp_host, config.email.smtp_port
    );
    Ok(Arc::new(sink))
}

#[cfg(not(feature = "mail"))]
fn smtp_sink(_config: &AppConfig) -> Result<Arc<dyn NotificationSink>> {
    warn!("Email enabled in config but built without the mail feature; logging only");
    Ok(Arc::new(crate::email::LogSink))
}

pub fn jwt_manager(config: &AppConfig) -> Result<JwtManager> {
    let secret = match &config.auth.jwt_secret {
        Some(secret) => secret.clone(),
        None => {
            warn!("No auth.jwt_secret configured; generated an ephemeral one, tokens will not survive a restart");
            rand::rngs::OsRng
                .sample_iter(&Alphanumeric)
                .take(48)
                .map(char::from)
                .collect()
        }
    };
    JwtManager::from_secret(&secret, config.auth.token_ttl_hours)
        .context("Invalid authentication settings")
}

pub fn build_app_state(config: AppConfig, backend: StorageBackend) -> Result<AppState> {
    let store = open_store(&config, backend)?;
    let notifier = NotificationDispatcher::new(notification_sink(&config)?);
    let hasher = CredentialHasher::with_defaults()?;
    let jwt = Arc::new(jwt_manager(&config)?);

    let crm = CrmServices::new(store, notifier, hasher, jwt);
    Ok(AppState::new(config, crm))
}
