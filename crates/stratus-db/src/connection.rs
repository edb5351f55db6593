//! SurrealDB connection management.
//!
//! The master database holds the tenant catalog; tenant databases are
//! opened on demand by the router. Both kinds of connection go through
//! the `any` engine so tests can point the same code at an in-memory
//! endpoint.

use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;

/// Configuration for connecting to SurrealDB.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Endpoint URL (e.g. `ws://127.0.0.1:8000`, or `mem://` in tests).
    pub endpoint: String,
    /// SurrealDB namespace shared by the master and all tenant
    /// databases.
    pub namespace: String,
    /// Name of the master database.
    pub master_db: String,
    /// Root username for authentication.
    pub username: String,
    /// Root password for authentication.
    pub password: String,
    /// Prefix prepended to every tenant database name.
    pub tenant_db_prefix: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:8000".into(),
            namespace: "stratus".into(),
            master_db: "master".into(),
            username: "root".into(),
            password: "root".into(),
            tenant_db_prefix: "stratus_".into(),
        }
    }
}

/// Manages the connection to the master database.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Any>,
    config: DbConfig,
}

impl DbManager {
    /// Connect to SurrealDB using the provided configuration.
    ///
    /// Authenticates as root, selects the configured namespace and
    /// master database, and returns a ready-to-use manager.
    pub async fn connect(config: DbConfig) -> Result<Self, DbError> {
        info!(
            endpoint = %config.endpoint,
            namespace = %config.namespace,
            database = %config.master_db,
            "Connecting to SurrealDB"
        );

        let db = surrealdb::engine::any::connect(&config.endpoint).await?;

        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;

        db.use_ns(&config.namespace).use_db(&config.master_db).await?;

        info!("Successfully connected to SurrealDB");

        Ok(Self { db, config })
    }

    /// The master database connection.
    pub fn master(&self) -> &Surreal<Any> {
        &self.db
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Physical database name for a tenant's catalog `db_name`.
    pub fn tenant_db_name(&self, db_name: &str) -> String {
        format!("{}{}", self.config.tenant_db_prefix, db_name)
    }
}
