//! Stratus Server — application entry point.
//!
//! Connects to the SurrealDB cluster, migrates and seeds the master
//! database, then serves the HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use stratus_api::{AppState, build_router};
use stratus_auth::AuthConfig;
use stratus_db::provision::{ProvisioningService, SurrealClusterAdmin, SurrealMigrationRunner};
use stratus_db::registry::default_registry;
use stratus_db::repository::SurrealTenantCatalog;
use stratus_db::router::SurrealTenantRouter;
use stratus_db::seed::{TenantSeeder, seed_master};
use stratus_db::{DbConfig, DbManager, MigrationSet, PasswordCipher, run_migrations};
use tracing_subscriber::EnvFilter;

struct ServerConfig {
    bind: SocketAddr,
    db: DbConfig,
    /// AES-256 key for tenant database passwords at rest.
    secret_key: [u8; 32],
    auth: AuthConfig,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl ServerConfig {
    fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let bind = env_or("STRATUS_BIND", "0.0.0.0:3000").parse()?;

        let defaults = DbConfig::default();
        let db = DbConfig {
            endpoint: env_or("STRATUS_DB_ENDPOINT", &defaults.endpoint),
            namespace: env_or("STRATUS_DB_NAMESPACE", &defaults.namespace),
            master_db: env_or("STRATUS_MASTER_DB", &defaults.master_db),
            username: env_or("STRATUS_DB_USERNAME", &defaults.username),
            password: env_or("STRATUS_DB_PASSWORD", &defaults.password),
            tenant_db_prefix: env_or("STRATUS_TENANT_DB_PREFIX", &defaults.tenant_db_prefix),
        };

        let secret_hex = std::env::var("STRATUS_SECRET_KEY")
            .map_err(|_| "STRATUS_SECRET_KEY must be set (64 hex characters)")?;
        let secret_key: [u8; 32] = hex::decode(secret_hex)?
            .as_slice()
            .try_into()
            .map_err(|_| "STRATUS_SECRET_KEY must decode to exactly 32 bytes")?;

        let mut auth = AuthConfig::default();
        if let Ok(raw) = std::env::var("STRATUS_TOKEN_LIFETIME_SECS") {
            auth.token_lifetime_secs = raw.parse()?;
        }

        Ok(Self {
            bind,
            db,
            secret_key,
            auth,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("stratus=info".parse().unwrap()),
        )
        .json()
        .init();

    let config = ServerConfig::from_env()?;

    let manager = DbManager::connect(config.db.clone()).await?;
    run_migrations(manager.master(), MigrationSet::Master).await?;
    seed_master(manager.master()).await?;

    let cipher = PasswordCipher::new(config.secret_key);
    let catalog = SurrealTenantCatalog::new(manager.master().clone(), cipher);

    let state = Arc::new(AppState {
        catalog: catalog.clone(),
        router: SurrealTenantRouter::new(catalog.clone(), config.db.clone()),
        provisioner: ProvisioningService::new(
            catalog,
            SurrealClusterAdmin::new(config.db.clone()),
            SurrealMigrationRunner,
            TenantSeeder::default(),
            config.db.tenant_db_prefix.clone(),
        ),
        registry: default_registry(),
        auth: config.auth,
    });

    let app = build_router(state);

    tracing::info!(bind = %config.bind, "Starting Stratus server");
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
