use anyhow::Context;
use log::{error, info};

use crmserver::core::config::AppConfig;
use crmserver::core::shared::utils::{create_conn, run_migrations};
use crmserver::main_module::{build_app_state, init_logging, run_axum_server, StorageBackend};

const USAGE: &str = "Usage: crmserver [COMMAND] [OPTIONS]

Commands:
  serve       Run the HTTP API (default)
  migrate     Apply pending database migrations and exit

Options:
  --memory    Serve from in-memory storage instead of PostgreSQL
  --help      Show this message

Configuration is read from crmserver.toml (or the file in CRM_CONFIG),
then CRM_* environment variables, e.g. CRM_SERVER__PORT=9000.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to load .env: {e}");
        }
    }

    let args: Vec<String> = std::env::args().collect();
    let memory = args.contains(&"--memory".to_string());
    let mut command = "serve";
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => {
                println!("{USAGE}");
                return Ok(());
            }
            "--memory" => {}
            "serve" | "migrate" => command = arg.as_str(),
            other => {
                eprintln!("Unknown argument: {other}");
                eprintln!("Run 'crmserver --help' for usage information");
                std::process::exit(2);
            }
        }
    }

    init_logging();
    let config = AppConfig::load().context("Failed to load configuration")?;

    match command {
        "migrate" => {
            let pool = create_conn(&config.database)?;
            run_migrations(&pool)?;
            info!("Database is up to date");
            Ok(())
        }
        _ => {
            let backend = if memory {
                StorageBackend::Memory
            } else {
                StorageBackend::Postgres
            };
            info!(
                "Starting crmserver {} ({backend:?} storage)",
                env!("CARGO_PKG_VERSION")
            );
            let state = build_app_state(config, backend)?;
            if let Err(e) = run_axum_server(state).await {
                error!("Server error: {e}");
                return Err(e.into());
            }
            info!("Server stopped");
            Ok(())
        }
    }
}
