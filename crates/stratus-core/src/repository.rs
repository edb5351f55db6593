//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Unlike column-scoped
//! multi-tenancy, tenant isolation here is physical: tenant-scoped
//! repositories are constructed over an already-resolved tenant
//! connection, so no `tenant_id` parameter appears in their methods.

use uuid::Uuid;

use crate::error::StratusResult;
use crate::models::{
    person::Person,
    tenant::{CreateTenant, Tenant, UpdateTenant},
    token::{AccessToken, CreateAccessToken},
    user::UserAccount,
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Master database (catalog)
// ---------------------------------------------------------------------------

/// Durable store of tenant records in the master database.
pub trait TenantCatalog: Send + Sync {
    /// Insert a new tenant row. Fails with `SlugInUse` when the slug
    /// is taken by a non-deleted tenant; the database password is
    /// encrypted before it touches storage.
    fn create(&self, input: CreateTenant) -> impl Future<Output = StratusResult<Tenant>> + Send;

    /// Fetch by id, including soft-deleted rows.
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = StratusResult<Tenant>> + Send;

    /// Fetch by slug, excluding soft-deleted rows. This is the lookup
    /// the connection router performs per request.
    fn get_by_slug(&self, slug: &str) -> impl Future<Output = StratusResult<Tenant>> + Send;

    /// Whether a slug is taken by a non-deleted tenant, optionally
    /// ignoring one tenant id (for updates).
    fn slug_in_use(
        &self,
        slug: &str,
        exclude: Option<Uuid>,
    ) -> impl Future<Output = StratusResult<bool>> + Send;

    fn update(
        &self,
        id: Uuid,
        input: UpdateTenant,
    ) -> impl Future<Output = StratusResult<Tenant>> + Send;

    /// Soft delete: state → `Deleted`.
    fn delete(&self, id: Uuid) -> impl Future<Output = StratusResult<()>> + Send;

    /// Restore a soft-deleted tenant: state → `Inactive`.
    fn restore(&self, id: Uuid) -> impl Future<Output = StratusResult<Tenant>> + Send;

    /// Physically remove the row. Only the provisioning rollback path
    /// uses this; admin deletes are always soft.
    fn hard_delete(&self, id: Uuid) -> impl Future<Output = StratusResult<()>> + Send;

    /// All tenants, including soft-deleted ones (the admin surface
    /// must see deleted records to restore them).
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = StratusResult<PaginatedResult<Tenant>>> + Send;
}

// ---------------------------------------------------------------------------
// Module registry (read side used by the dispatcher)
// ---------------------------------------------------------------------------

pub trait ModuleRepository: Send + Sync {
    /// Fetch by slug, excluding soft-deleted modules. Module CRUD
    /// itself goes through the generic dispatcher.
    fn get_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = StratusResult<crate::models::module::Module>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant database (auth)
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    /// Lookup by email among non-deleted accounts.
    fn get_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = StratusResult<UserAccount>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = StratusResult<UserAccount>> + Send;

    fn get_person(&self, id: Uuid) -> impl Future<Output = StratusResult<Person>> + Send;
}

pub trait TokenRepository: Send + Sync {
    fn create(
        &self,
        input: CreateAccessToken,
    ) -> impl Future<Output = StratusResult<AccessToken>> + Send;

    fn get_by_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = StratusResult<AccessToken>> + Send;

    /// Revoke a single token (logout).
    fn delete(&self, id: Uuid) -> impl Future<Output = StratusResult<()>> + Send;
}
