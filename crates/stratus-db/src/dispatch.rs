//! Generic entity dispatcher.
//!
//! One code path serves CRUD for every registered entity: the target
//! module is resolved by slug, its entity kind is looked up in the
//! typed registry, and the registry entry supplies the table name,
//! validator and write hooks. Records cross this boundary as plain
//! JSON objects; typed models exist only where other layers need
//! them.

use serde_json::{Map, Value};
use stratus_core::error::{StratusError, StratusResult};
use stratus_core::models::module::Module;
use stratus_core::registry::{EntityDef, EntityRegistry};
use stratus_core::repository::{ModuleRepository, PaginatedResult, Pagination};
use stratus_core::validate::{ApprovedFields, FieldErrors, ValidationMode};
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::SurrealModuleRepository;

/// Dispatches generic CRUD operations within one database (master or
/// tenant).
pub struct EntityDispatcher<C: Connection> {
    db: Surreal<C>,
    modules: SurrealModuleRepository<C>,
    registry: std::sync::Arc<EntityRegistry>,
}

fn row_state(row: &Value) -> Option<&str> {
    row.get("state").and_then(Value::as_str)
}

/// Replace the projected `record_id` key with `id` so clients see the
/// same shape typed endpoints produce, and strip the entity's hidden
/// columns before the row leaves the dispatcher.
fn normalize(mut row: Value, def: &EntityDef) -> Value {
    if let Some(obj) = row.as_object_mut() {
        if let Some(id) = obj.remove("record_id") {
            obj.insert("id".into(), id);
        }
        for column in def.hidden {
            obj.remove(*column);
        }
    }
    row
}

impl<C: Connection> EntityDispatcher<C> {
    pub fn new(db: Surreal<C>, registry: std::sync::Arc<EntityRegistry>) -> Self {
        Self {
            modules: SurrealModuleRepository::new(db.clone()),
            db,
            registry,
        }
    }

    /// Resolve a module slug to its module row and registry entry.
    ///
    /// Misses at either step surface as module NotFound: a module row
    /// whose entity kind is unregistered is as unreachable as a
    /// missing one.
    pub async fn resolve(&self, module_slug: &str) -> StratusResult<(Module, EntityDef)> {
        let module = self.modules.get_by_slug(module_slug).await?;

        let def = module
            .entity_kind
            .as_deref()
            .and_then(|kind| self.registry.get(kind))
            .copied()
            .ok_or_else(|| StratusError::not_found("module", module_slug))?;

        Ok((module, def))
    }

    /// List non-deleted records, ordered by position when the entity
    /// has one, by creation time otherwise.
    pub async fn list(
        &self,
        module_slug: &str,
        pagination: Pagination,
    ) -> StratusResult<PaginatedResult<Value>> {
        let (_, def) = self.resolve(module_slug).await?;

        let order = if def.orderable {
            "position ASC, created_at ASC"
        } else {
            "created_at ASC"
        };

        let count_query = format!(
            "SELECT count() AS total FROM {} WHERE state != 'Deleted' GROUP ALL",
            def.table
        );
        let mut count_result = self.db.query(&count_query).await.map_err(DbError::from)?;
        let count_rows: Vec<Value> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows
            .first()
            .and_then(|r| r.get("total"))
            .and_then(Value::as_u64)
            .unwrap_or(0);

        let query = format!(
            "SELECT meta::id(id) AS record_id, * OMIT id FROM {} \
             WHERE state != 'Deleted' \
             ORDER BY {order} \
             LIMIT $limit START $offset",
            def.table
        );
        let mut result = self
            .db
            .query(&query)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<Value> = result.take(0).map_err(DbError::from)?;

        Ok(PaginatedResult {
            items: rows.into_iter().map(|row| normalize(row, &def)).collect(),
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    /// Fetch one record by id, soft-deleted ones included (the admin
    /// frontend shows deleted records so they can be restored).
    pub async fn get(&self, module_slug: &str, id: Uuid) -> StratusResult<Value> {
        let (_, def) = self.resolve(module_slug).await?;
        self.fetch_row(&def, id).await
    }

    /// Validate and create a record.
    pub async fn create(&self, module_slug: &str, payload: &Value) -> StratusResult<Value> {
        let (_, def) = self.resolve(module_slug).await?;

        let mut approved = (def.validator)(payload, ValidationMode::Create)
            .map_err(|errors| StratusError::Validation { errors })?;
        self.ensure_unique(&def, &approved, None).await?;
        if let Some(prepare) = def.prepare {
            prepare(&mut approved)?;
        }

        let id = Uuid::new_v4();
        let data = Value::Object(Map::from_iter(approved));

        let query = format!("CREATE type::record('{}', $id) CONTENT $data", def.table);
        self.db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("data", data))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        self.fetch_row(&def, id).await
    }

    /// Validate and merge changes into an existing record. Deleted
    /// records cannot be edited; restore first.
    pub async fn update(
        &self,
        module_slug: &str,
        id: Uuid,
        payload: &Value,
    ) -> StratusResult<Value> {
        let (_, def) = self.resolve(module_slug).await?;

        let current = self.fetch_row(&def, id).await?;
        if row_state(&current) == Some("Deleted") {
            return Err(StratusError::not_found(def.table, id.to_string()));
        }

        let mut approved = (def.validator)(payload, ValidationMode::Update)
            .map_err(|errors| StratusError::Validation { errors })?;
        self.ensure_unique(&def, &approved, Some(id)).await?;
        if let Some(prepare) = def.prepare {
            prepare(&mut approved)?;
        }

        let data = Value::Object(Map::from_iter(approved));

        let query = format!(
            "UPDATE type::record('{table}', $id) MERGE $data; \
             UPDATE type::record('{table}', $id) SET updated_at = time::now();",
            table = def.table
        );
        self.db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("data", data))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        self.fetch_row(&def, id).await
    }

    /// Soft-delete a record. Deleting an already deleted record is
    /// NotFound, matching what listings show.
    pub async fn delete(&self, module_slug: &str, id: Uuid) -> StratusResult<()> {
        let (_, def) = self.resolve(module_slug).await?;

        let current = self.fetch_row(&def, id).await?;
        if row_state(&current) == Some("Deleted") {
            return Err(StratusError::not_found(def.table, id.to_string()));
        }

        let query = format!(
            "UPDATE type::record('{}', $id) SET \
             state = 'Deleted', updated_at = time::now()",
            def.table
        );
        self.db
            .query(&query)
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        Ok(())
    }

    /// Bring a soft-deleted record back as Inactive. Restoring a
    /// record that is not deleted returns it unchanged.
    pub async fn restore(&self, module_slug: &str, id: Uuid) -> StratusResult<Value> {
        let (_, def) = self.resolve(module_slug).await?;

        let current = self.fetch_row(&def, id).await?;
        if row_state(&current) != Some("Deleted") {
            return Ok(current);
        }

        let query = format!(
            "UPDATE type::record('{}', $id) SET \
             state = 'Inactive', updated_at = time::now()",
            def.table
        );
        self.db
            .query(&query)
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        self.fetch_row(&def, id).await
    }

    async fn fetch_row(&self, def: &EntityDef, id: Uuid) -> StratusResult<Value> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * OMIT id \
             FROM type::record('{}', $id)",
            def.table
        );
        let mut result = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<Value> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| StratusError::not_found(def.table, id.to_string()))?;

        Ok(normalize(row, def))
    }

    /// Reject a write whose unique columns collide with another
    /// non-deleted row. Deleted rows release their values.
    async fn ensure_unique(
        &self,
        def: &EntityDef,
        approved: &ApprovedFields,
        exclude: Option<Uuid>,
    ) -> StratusResult<()> {
        let exclude = exclude.map(|id| id.to_string());

        for column in def.unique_columns {
            let Some(value) = approved.get(*column) else {
                continue;
            };

            let query = format!(
                "SELECT meta::id(id) AS record_id FROM {} \
                 WHERE {column} = $value AND state != 'Deleted'",
                def.table
            );
            let mut result = self
                .db
                .query(&query)
                .bind(("value", value.clone()))
                .await
                .map_err(DbError::from)?;
            let rows: Vec<Value> = result.take(0).map_err(DbError::from)?;

            let taken = rows
                .iter()
                .filter_map(|row| row.get("record_id").and_then(Value::as_str))
                .any(|record_id| exclude.as_deref() != Some(record_id));
            if taken {
                let mut errors = FieldErrors::new();
                errors.insert(
                    (*column).to_string(),
                    vec![format!("The {column} has already been taken.")],
                );
                return Err(StratusError::Validation { errors });
            }
        }

        Ok(())
    }
}
