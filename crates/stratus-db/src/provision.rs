//! Tenant provisioning.
//!
//! Creating a tenant is a multi-step pipeline against the cluster:
//! catalog row, physical database, database login, ownership grant,
//! connection check, schema migrations, seed data. A failure at any
//! step rolls back everything already created so a failed attempt
//! leaves no orphaned database, login or catalog row behind, and the
//! surfaced error names the step that broke.
//!
//! The cluster operations sit behind small traits so the pipeline's
//! atomicity can be exercised against fakes.

use stratus_core::error::{ProvisionStep, StratusError, StratusResult};
use stratus_core::models::tenant::{CreateTenant, Tenant};
use stratus_core::repository::TenantCatalog;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::{Database, Root};
use tracing::{info, warn};

use crate::connection::DbConfig;
use crate::error::DbError;
use crate::schema::{MigrationSet, run_migrations};
use crate::seed::TenantSeeder;

// -----------------------------------------------------------------------
// Seams
// -----------------------------------------------------------------------

/// Cluster-level operations used by the provisioning pipeline.
///
/// `db_name` arguments are the physical database name, prefix
/// included.
pub trait ClusterAdmin: Send + Sync {
    fn create_database(&self, db_name: &str) -> impl Future<Output = StratusResult<()>> + Send;

    /// Create the tenant's database login with read-only access.
    fn create_login(
        &self,
        db_name: &str,
        user: &str,
        password: &str,
    ) -> impl Future<Output = StratusResult<()>> + Send;

    /// Promote the login to owner of its database.
    fn grant_ownership(
        &self,
        db_name: &str,
        user: &str,
        password: &str,
    ) -> impl Future<Output = StratusResult<()>> + Send;

    /// Open a connection to the tenant database as the tenant login,
    /// proving the credentials work end to end.
    fn connect(
        &self,
        db_name: &str,
        user: &str,
        password: &str,
    ) -> impl Future<Output = StratusResult<Surreal<Any>>> + Send;

    /// Kick any live connections to the database before dropping it.
    fn terminate_sessions(&self, db_name: &str) -> impl Future<Output = StratusResult<()>> + Send;

    fn drop_login(
        &self,
        db_name: &str,
        user: &str,
    ) -> impl Future<Output = StratusResult<()>> + Send;

    fn drop_database(&self, db_name: &str) -> impl Future<Output = StratusResult<()>> + Send;
}

/// Applies the tenant schema to a freshly created database.
pub trait MigrationRunner: Send + Sync {
    fn run(&self, db: &Surreal<Any>) -> impl Future<Output = StratusResult<()>> + Send;
}

/// Inserts the initial data set into a freshly migrated database.
pub trait SeedRunner: Send + Sync {
    fn run(&self, db: &Surreal<Any>) -> impl Future<Output = StratusResult<()>> + Send;
}

/// The full provisioning operation, as consumed by the API layer.
pub trait TenantProvisioner: Send + Sync {
    fn provision(&self, input: CreateTenant)
    -> impl Future<Output = StratusResult<Tenant>> + Send;
}

// -----------------------------------------------------------------------
// Pipeline
// -----------------------------------------------------------------------

/// Orchestrates tenant creation and rollback.
pub struct ProvisioningService<Cat, Adm, Mig, Seed>
where
    Cat: TenantCatalog,
    Adm: ClusterAdmin,
    Mig: MigrationRunner,
    Seed: SeedRunner,
{
    catalog: Cat,
    admin: Adm,
    migrations: Mig,
    seeder: Seed,
    tenant_db_prefix: String,
}

impl<Cat, Adm, Mig, Seed> ProvisioningService<Cat, Adm, Mig, Seed>
where
    Cat: TenantCatalog,
    Adm: ClusterAdmin,
    Mig: MigrationRunner,
    Seed: SeedRunner,
{
    pub fn new(
        catalog: Cat,
        admin: Adm,
        migrations: Mig,
        seeder: Seed,
        tenant_db_prefix: String,
    ) -> Self {
        Self {
            catalog,
            admin,
            migrations,
            seeder,
            tenant_db_prefix,
        }
    }

    async fn forward(
        &self,
        db_name: &str,
        user: &str,
        password: &str,
    ) -> Result<(), (ProvisionStep, StratusError)> {
        self.admin
            .create_database(db_name)
            .await
            .map_err(|e| (ProvisionStep::CreateDatabase, e))?;

        self.admin
            .create_login(db_name, user, password)
            .await
            .map_err(|e| (ProvisionStep::CreateLogin, e))?;

        self.admin
            .grant_ownership(db_name, user, password)
            .await
            .map_err(|e| (ProvisionStep::GrantOwnership, e))?;

        let db = self
            .admin
            .connect(db_name, user, password)
            .await
            .map_err(|e| (ProvisionStep::BindConnection, e))?;

        self.migrations
            .run(&db)
            .await
            .map_err(|e| (ProvisionStep::Migrate, e))?;

        self.seeder
            .run(&db)
            .await
            .map_err(|e| (ProvisionStep::Seed, e))?;

        Ok(())
    }

    /// Undo everything a partial provision may have created. Each
    /// action runs regardless of earlier rollback failures; the
    /// original error is what the caller sees.
    async fn rollback(&self, tenant: &Tenant, db_name: &str) {
        if let Err(err) = self.admin.terminate_sessions(db_name).await {
            warn!(tenant = %tenant.slug, error = %err, "rollback: terminate_sessions failed");
        }
        // The login lives inside the tenant database, so it goes
        // before the database does.
        if let Err(err) = self.admin.drop_login(db_name, &tenant.db_user).await {
            warn!(tenant = %tenant.slug, error = %err, "rollback: drop_login failed");
        }
        if let Err(err) = self.admin.drop_database(db_name).await {
            warn!(tenant = %tenant.slug, error = %err, "rollback: drop_database failed");
        }
        if let Err(err) = self.catalog.hard_delete(tenant.id).await {
            warn!(tenant = %tenant.slug, error = %err, "rollback: catalog hard_delete failed");
        }
    }
}

impl<Cat, Adm, Mig, Seed> TenantProvisioner for ProvisioningService<Cat, Adm, Mig, Seed>
where
    Cat: TenantCatalog,
    Adm: ClusterAdmin,
    Mig: MigrationRunner,
    Seed: SeedRunner,
{
    async fn provision(&self, input: CreateTenant) -> StratusResult<Tenant> {
        let db_password = input.db_password.clone();

        // Catalog first: a taken slug fails here, before any cluster
        // work happens.
        let tenant = self.catalog.create(input).await?;
        let db_name = format!("{}{}", self.tenant_db_prefix, tenant.db_name);

        info!(slug = %tenant.slug, database = %db_name, "Provisioning tenant");

        match self
            .forward(&db_name, &tenant.db_user, &db_password)
            .await
        {
            Ok(()) => {
                info!(slug = %tenant.slug, "Tenant provisioned");
                Ok(tenant)
            }
            Err((step, source)) => {
                warn!(slug = %tenant.slug, %step, error = %source, "Provisioning failed, rolling back");
                self.rollback(&tenant, &db_name).await;
                Err(StratusError::Provisioning {
                    step,
                    source: Box::new(source),
                })
            }
        }
    }
}

// -----------------------------------------------------------------------
// SurrealDB-backed implementations
// -----------------------------------------------------------------------

fn assert_ddl_ident(value: &str) -> StratusResult<()> {
    let ok = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StratusError::Internal(format!(
            "unsafe identifier in DDL: {value}"
        )))
    }
}

fn escape_password(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// [`ClusterAdmin`] over a real SurrealDB cluster. Every operation
/// uses a short-lived root connection; only `connect` authenticates
/// as the tenant login.
#[derive(Clone)]
pub struct SurrealClusterAdmin {
    config: DbConfig,
}

impl SurrealClusterAdmin {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }

    async fn root_session(&self, db_name: Option<&str>) -> StratusResult<Surreal<Any>> {
        let db = surrealdb::engine::any::connect(&self.config.endpoint)
            .await
            .map_err(DbError::from)?;
        db.signin(Root {
            username: self.config.username.clone(),
            password: self.config.password.clone(),
        })
        .await
        .map_err(DbError::from)?;
        let target = db_name.unwrap_or(&self.config.master_db);
        db.use_ns(&self.config.namespace)
            .use_db(target)
            .await
            .map_err(DbError::from)?;
        Ok(db)
    }
}

impl ClusterAdmin for SurrealClusterAdmin {
    async fn create_database(&self, db_name: &str) -> StratusResult<()> {
        assert_ddl_ident(db_name)?;
        let db = self.root_session(None).await?;
        db.query(format!("DEFINE DATABASE `{db_name}`"))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| StratusError::Database(e.to_string()))?;
        Ok(())
    }

    async fn create_login(&self, db_name: &str, user: &str, password: &str) -> StratusResult<()> {
        assert_ddl_ident(db_name)?;
        assert_ddl_ident(user)?;
        let db = self.root_session(Some(db_name)).await?;
        let password = escape_password(password);
        db.query(format!(
            "DEFINE USER `{user}` ON DATABASE PASSWORD '{password}' ROLES VIEWER"
        ))
        .await
        .map_err(DbError::from)?
        .check()
        .map_err(|e| StratusError::Database(e.to_string()))?;
        Ok(())
    }

    async fn grant_ownership(
        &self,
        db_name: &str,
        user: &str,
        password: &str,
    ) -> StratusResult<()> {
        assert_ddl_ident(db_name)?;
        assert_ddl_ident(user)?;
        let db = self.root_session(Some(db_name)).await?;
        let password = escape_password(password);
        db.query(format!(
            "DEFINE USER OVERWRITE `{user}` ON DATABASE PASSWORD '{password}' ROLES OWNER"
        ))
        .await
        .map_err(DbError::from)?
        .check()
        .map_err(|e| StratusError::Database(e.to_string()))?;
        Ok(())
    }

    async fn connect(
        &self,
        db_name: &str,
        user: &str,
        password: &str,
    ) -> StratusResult<Surreal<Any>> {
        let db = surrealdb::engine::any::connect(&self.config.endpoint)
            .await
            .map_err(DbError::from)?;
        db.signin(Database {
            namespace: self.config.namespace.clone(),
            database: db_name.to_string(),
            username: user.to_string(),
            password: password.to_string(),
        })
        .await
        .map_err(DbError::from)?;
        db.use_ns(&self.config.namespace)
            .use_db(db_name)
            .await
            .map_err(DbError::from)?;
        Ok(db)
    }

    async fn terminate_sessions(&self, _db_name: &str) -> StratusResult<()> {
        // SurrealDB drops live sessions together with the database, so
        // there is nothing to kick explicitly.
        Ok(())
    }

    async fn drop_login(&self, db_name: &str, user: &str) -> StratusResult<()> {
        assert_ddl_ident(db_name)?;
        assert_ddl_ident(user)?;
        let db = self.root_session(Some(db_name)).await?;
        db.query(format!("REMOVE USER IF EXISTS `{user}` ON DATABASE"))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| StratusError::Database(e.to_string()))?;
        Ok(())
    }

    async fn drop_database(&self, db_name: &str) -> StratusResult<()> {
        assert_ddl_ident(db_name)?;
        let db = self.root_session(None).await?;
        db.query(format!("REMOVE DATABASE IF EXISTS `{db_name}`"))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| StratusError::Database(e.to_string()))?;
        Ok(())
    }
}

/// [`MigrationRunner`] applying the tenant schema set.
#[derive(Clone, Default)]
pub struct SurrealMigrationRunner;

impl MigrationRunner for SurrealMigrationRunner {
    async fn run(&self, db: &Surreal<Any>) -> StratusResult<()> {
        run_migrations(db, MigrationSet::Tenant).await?;
        Ok(())
    }
}

impl SeedRunner for TenantSeeder {
    async fn run(&self, db: &Surreal<Any>) -> StratusResult<()> {
        self.seed(db).await
    }
}
