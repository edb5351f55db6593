//! SurrealDB implementation of [`TenantCatalog`].
//!
//! Lives in the master database. Tenant database passwords are
//! encrypted with AES-256-GCM before they reach storage; the
//! connection router decrypts them when building tenant connections.

use chrono::{DateTime, NaiveDate, Utc};
use stratus_core::RecordState;
use stratus_core::error::{StratusError, StratusResult};
use stratus_core::models::tenant::{CreateTenant, Tenant, UpdateTenant};
use stratus_core::repository::{PaginatedResult, Pagination, TenantCatalog};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::parse_state;
use crate::secret::PasswordCipher;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct TenantRow {
    name: String,
    slug: String,
    db_name: String,
    db_user: String,
    db_password: String,
    expiration_date: String,
    position: i64,
    state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TenantRowWithId {
    record_id: String,
    name: String,
    slug: String,
    db_name: String,
    db_user: String,
    db_password: String,
    expiration_date: String,
    position: i64,
    state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Row struct for existence checks.
#[derive(Debug, SurrealValue)]
struct IdRow {
    #[allow(dead_code)]
    record_id: String,
}

fn parse_date(s: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DbError::Decode(format!("invalid expiration date: {e}")))
}

impl TenantRow {
    fn into_tenant(self, id: Uuid) -> Result<Tenant, DbError> {
        Ok(Tenant {
            id,
            name: self.name,
            slug: self.slug,
            db_name: self.db_name,
            db_user: self.db_user,
            db_password: self.db_password,
            expiration_date: parse_date(&self.expiration_date)?,
            position: self.position,
            state: parse_state(&self.state)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TenantRowWithId {
    fn try_into_tenant(self) -> Result<Tenant, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        Ok(Tenant {
            id,
            name: self.name,
            slug: self.slug,
            db_name: self.db_name,
            db_user: self.db_user,
            db_password: self.db_password,
            expiration_date: parse_date(&self.expiration_date)?,
            position: self.position,
            state: parse_state(&self.state)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the tenant catalog.
#[derive(Clone)]
pub struct SurrealTenantCatalog<C: Connection> {
    db: Surreal<C>,
    cipher: PasswordCipher,
}

impl<C: Connection> SurrealTenantCatalog<C> {
    pub fn new(db: Surreal<C>, cipher: PasswordCipher) -> Self {
        Self { db, cipher }
    }

    /// Decrypt the stored database password of a tenant. Used by the
    /// router and the provisioner, never exposed over the API.
    pub fn decrypt_password(&self, tenant: &Tenant) -> StratusResult<String> {
        self.cipher.decrypt(&tenant.db_password)
    }
}

impl<C: Connection> TenantCatalog for SurrealTenantCatalog<C> {
    async fn create(&self, input: CreateTenant) -> StratusResult<Tenant> {
        if self.slug_in_use(&input.slug, None).await? {
            return Err(StratusError::SlugInUse { slug: input.slug });
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let encrypted = self.cipher.encrypt(&input.db_password)?;

        let result = self
            .db
            .query(
                "CREATE type::record('tenant', $id) SET \
                 name = $name, slug = $slug, \
                 db_name = $db_name, db_user = $db_user, \
                 db_password = $db_password, \
                 expiration_date = $expiration_date, \
                 position = $position",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("slug", input.slug))
            .bind(("db_name", input.db_name))
            .bind(("db_user", input.db_user))
            .bind(("db_password", encrypted))
            .bind((
                "expiration_date",
                input.expiration_date.format("%Y-%m-%d").to_string(),
            ))
            .bind(("position", input.position.unwrap_or(1)))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> StratusResult<Tenant> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('tenant', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id)?)
    }

    async fn get_by_slug(&self, slug: &str) -> StratusResult<Tenant> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant \
                 WHERE slug = $slug AND state != 'Deleted'",
            )
            .bind(("slug", slug.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: format!("slug={slug}"),
        })?;

        Ok(row.try_into_tenant()?)
    }

    async fn slug_in_use(&self, slug: &str, exclude: Option<Uuid>) -> StratusResult<bool> {
        let query = match exclude {
            Some(_) => {
                "SELECT meta::id(id) AS record_id FROM tenant \
                 WHERE slug = $slug AND state != 'Deleted' \
                 AND meta::id(id) != $exclude"
            }
            None => {
                "SELECT meta::id(id) AS record_id FROM tenant \
                 WHERE slug = $slug AND state != 'Deleted'"
            }
        };

        let mut builder = self.db.query(query).bind(("slug", slug.to_string()));
        if let Some(exclude) = exclude {
            builder = builder.bind(("exclude", exclude.to_string()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<IdRow> = result.take(0).map_err(DbError::from)?;
        Ok(!rows.is_empty())
    }

    async fn update(&self, id: Uuid, input: UpdateTenant) -> StratusResult<Tenant> {
        // Existence check up front so an unknown id maps to NotFound
        // rather than an empty update result.
        let current = self.get_by_id(id).await?;

        if let Some(ref slug) = input.slug
            && *slug != current.slug
            && self.slug_in_use(slug, Some(id)).await?
        {
            return Err(StratusError::SlugInUse { slug: slug.clone() });
        }

        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.slug.is_some() {
            sets.push("slug = $slug");
        }
        if input.expiration_date.is_some() {
            sets.push("expiration_date = $expiration_date");
        }
        if input.position.is_some() {
            sets.push("position = $position");
        }
        if input.state.is_some() {
            sets.push("state = $state");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('tenant', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(slug) = input.slug {
            builder = builder.bind(("slug", slug));
        }
        if let Some(expiration_date) = input.expiration_date {
            builder = builder.bind((
                "expiration_date",
                expiration_date.format("%Y-%m-%d").to_string(),
            ));
        }
        if let Some(position) = input.position {
            builder = builder.bind(("position", position));
        }
        if let Some(state) = input.state {
            builder = builder.bind(("state", state.as_str().to_string()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id)?)
    }

    async fn delete(&self, id: Uuid) -> StratusResult<()> {
        // Soft delete; the tenant database stays untouched.
        self.get_by_id(id).await?;

        self.db
            .query(
                "UPDATE type::record('tenant', $id) SET \
                 state = 'Deleted', updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        Ok(())
    }

    async fn restore(&self, id: Uuid) -> StratusResult<Tenant> {
        let current = self.get_by_id(id).await?;
        if current.state != RecordState::Deleted {
            return Ok(current);
        }

        // Restored tenants come back Inactive; an admin re-activates
        // explicitly.
        let id_str = id.to_string();
        let mut result = self
            .db
            .query(
                "UPDATE type::record('tenant', $id) SET \
                 state = 'Inactive', updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id)?)
    }

    async fn hard_delete(&self, id: Uuid) -> StratusResult<()> {
        self.db
            .query("DELETE type::record('tenant', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> StratusResult<PaginatedResult<Tenant>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM tenant GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant \
                 ORDER BY position ASC, created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_tenant())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
