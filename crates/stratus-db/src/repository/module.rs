//! SurrealDB implementation of [`ModuleRepository`].
//!
//! Read-only: module rows are created and edited through the generic
//! dispatcher like any other entity. This repository exists for the
//! dispatcher itself, which resolves the target module by slug before
//! every operation.

use chrono::{DateTime, Utc};
use stratus_core::error::StratusResult;
use stratus_core::models::module::{ModalSize, Module, ModuleKind, OwnerLevel};
use stratus_core::repository::ModuleRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::parse_state;

#[derive(Debug, SurrealValue)]
struct ModuleRowWithId {
    record_id: String,
    slug: String,
    owner_level: String,
    owner_id: Option<String>,
    name: String,
    icon: Option<String>,
    kind: String,
    entity_kind: Option<String>,
    url_prefix: Option<String>,
    controller: Option<String>,
    modal_size: String,
    description_index: Option<String>,
    description_show: Option<String>,
    description_store: Option<String>,
    description_update: Option<String>,
    description_delete: Option<String>,
    description_restore: Option<String>,
    after_store: Option<String>,
    after_update: Option<String>,
    after_restore: Option<String>,
    position: i64,
    state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ModuleRowWithId {
    fn try_into_module(self) -> Result<Module, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let owner_id = self
            .owner_id
            .map(|s| Uuid::parse_str(&s))
            .transpose()
            .map_err(|e| DbError::Decode(format!("invalid owner UUID: {e}")))?;
        Ok(Module {
            id,
            slug: self.slug,
            owner_level: OwnerLevel::parse(&self.owner_level)
                .ok_or_else(|| DbError::Decode(format!("unknown owner level: {}", self.owner_level)))?,
            owner_id,
            name: self.name,
            icon: self.icon,
            kind: ModuleKind::parse(&self.kind)
                .ok_or_else(|| DbError::Decode(format!("unknown module kind: {}", self.kind)))?,
            entity_kind: self.entity_kind,
            url_prefix: self.url_prefix,
            controller: self.controller,
            modal_size: ModalSize::parse(&self.modal_size)
                .ok_or_else(|| DbError::Decode(format!("unknown modal size: {}", self.modal_size)))?,
            description_index: self.description_index,
            description_show: self.description_show,
            description_store: self.description_store,
            description_update: self.description_update,
            description_delete: self.description_delete,
            description_restore: self.description_restore,
            after_store: self.after_store,
            after_update: self.after_update,
            after_restore: self.after_restore,
            position: self.position,
            state: parse_state(&self.state)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the module repository.
#[derive(Clone)]
pub struct SurrealModuleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealModuleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ModuleRepository for SurrealModuleRepository<C> {
    async fn get_by_slug(&self, slug: &str) -> StratusResult<Module> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM module \
                 WHERE slug = $slug AND state != 'Deleted'",
            )
            .bind(("slug", slug.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ModuleRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "module".into(),
            id: format!("slug={slug}"),
        })?;

        Ok(row.try_into_module()?)
    }
}
