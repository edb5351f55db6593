//! Per-request tenant connection routing.
//!
//! Every tenant-scoped request resolves its own connection from the
//! catalog slug. Connections are cached per tenant id and handed out
//! as cheap clones; nothing global is mutated, so concurrent requests
//! for different tenants cannot observe each other's connection.

use std::collections::HashMap;
use std::sync::Arc;

use stratus_core::error::StratusResult;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Database;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::connection::DbConfig;
use crate::error::DbError;
use crate::repository::SurrealTenantCatalog;

/// A resolved tenant connection, carried through request handling as
/// an extension.
#[derive(Clone)]
pub struct TenantConn {
    pub tenant_id: Uuid,
    pub db: Surreal<Any>,
}

/// Resolves a tenant slug to a live connection on its database.
pub trait TenantRouter: Send + Sync {
    fn resolve(&self, slug: &str) -> impl Future<Output = StratusResult<TenantConn>> + Send;

    /// Drop a cached connection, forcing the next request to
    /// reconnect. Called when a tenant's catalog row changes.
    fn invalidate(&self, tenant_id: Uuid) -> impl Future<Output = ()> + Send;
}

/// Catalog-backed router. Connects to each tenant database with the
/// tenant's own database login, never the root account.
#[derive(Clone)]
pub struct SurrealTenantRouter {
    catalog: SurrealTenantCatalog<Any>,
    config: DbConfig,
    pool: Arc<RwLock<HashMap<Uuid, Surreal<Any>>>>,
}

impl SurrealTenantRouter {
    pub fn new(catalog: SurrealTenantCatalog<Any>, config: DbConfig) -> Self {
        Self {
            catalog,
            config,
            pool: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl TenantRouter for SurrealTenantRouter {
    async fn resolve(&self, slug: &str) -> StratusResult<TenantConn> {
        use stratus_core::repository::TenantCatalog;

        // Unknown and soft-deleted slugs both land here as NotFound.
        let tenant = self.catalog.get_by_slug(slug).await?;

        if let Some(db) = self.pool.read().await.get(&tenant.id) {
            return Ok(TenantConn {
                tenant_id: tenant.id,
                db: db.clone(),
            });
        }

        let database = format!("{}{}", self.config.tenant_db_prefix, tenant.db_name);
        let password = self.catalog.decrypt_password(&tenant)?;

        debug!(slug, database = %database, "Opening tenant connection");

        let db = surrealdb::engine::any::connect(&self.config.endpoint)
            .await
            .map_err(DbError::from)?;
        db.signin(Database {
            namespace: self.config.namespace.clone(),
            database: database.clone(),
            username: tenant.db_user.clone(),
            password,
        })
        .await
        .map_err(DbError::from)?;
        db.use_ns(&self.config.namespace)
            .use_db(&database)
            .await
            .map_err(DbError::from)?;

        self.pool.write().await.insert(tenant.id, db.clone());

        Ok(TenantConn {
            tenant_id: tenant.id,
            db,
        })
    }

    async fn invalidate(&self, tenant_id: Uuid) {
        self.pool.write().await.remove(&tenant_id);
    }
}
