use std::sync::Arc;

use clap::Parser;
use serde::Deserialize;
use serde_json::json;

use granary_api::event::{EntityKind, UserRole};
use granary_engine::config::EngineConfig;
use granary_engine::Engine;
use granary_store_postgres::{PostgresConfig, PostgresStore};

#[derive(Parser)]
#[command(name = "granary-demo", about = "Granary audit pipeline demo")]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(long, default_value = "config.toml", env = "GRANARY_CONFIG")]
    config: String,
}

#[derive(Deserialize)]
struct DemoConfig {
    #[serde(default)]
    engine: EngineConfig,
    store: PostgresConfig,
}

impl DemoConfig {
    fn load(path: &str) -> Result<Self, String> {
        let content = std::fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
        let config: Self = toml::from_str(&content).map_err(|e| e.to_string())?;
        config.engine.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    tracing::info!(config = %cli.config, "loading configuration");
    let config = match DemoConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to load config");
            std::process::exit(1);
        }
    };

    let store = match PostgresStore::connect(&config.store).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to postgres");
            std::process::exit(1);
        }
    };

    let engine = match Engine::bootstrap(Arc::new(store), config.engine).await {
        Ok(e) => e,
        Err(e) => {
            tracing::error!(error = %e, "failed to bootstrap engine");
            std::process::exit(1);
        }
    };
    let pipeline = engine.pipeline();

    // A short provisioning session: create a CA user, rename their
    // context, remove an old account.
    pipeline
        .log_create(
            EntityKind::User,
            "admin",
            UserRole::Sa,
            None,
            "new_user",
            json!({
                "username": "new_user",
                "role": "CA",
                "email": "new@example.com",
                "context": "test_ctx",
            }),
            Some("Created new CA user for context test_ctx"),
        )
        .await;

    pipeline
        .log_update(
            EntityKind::Context,
            "user_ca_test_ctx",
            UserRole::Ca,
            Some("test_ctx"),
            "test_ctx",
            json!({"name": "Old name", "description": "Old description"}),
            json!({"name": "Test context", "description": "New updated description"}),
            None,
        )
        .await;

    pipeline
        .log_delete(
            EntityKind::User,
            "admin",
            UserRole::Sa,
            None,
            "old_user",
            Some("Deleted user old_user with role CA"),
        )
        .await;

    tracing::info!("demo events emitted, press Ctrl+C to stop");
    let _ = tokio::signal::ctrl_c().await;

    tracing::info!("shutting down...");
    engine.shutdown().await;
}
