//! Seed data for freshly provisioned databases.
//!
//! Every insert checks for an existing row first, so re-running a seed
//! (e.g. after a partially failed deploy) is safe.

use serde_json::json;
use stratus_core::error::{StratusError, StratusResult};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct IdRow {
    record_id: String,
}

/// Built-in module definitions, seeded into master and tenant
/// databases alike.
const MODULES: &[(&str, &str, &str, i64)] = &[
    ("modules", "Modules", "modules", 1),
    ("module-fields", "Module fields", "module-fields", 2),
    ("people", "People", "people", 3),
    ("users", "Users", "users", 4),
];

/// Seeds a tenant database with its module definitions and the
/// initial admin account.
#[derive(Clone)]
pub struct TenantSeeder {
    pub admin_name: String,
    pub admin_email: String,
    pub admin_password: String,
}

impl Default for TenantSeeder {
    fn default() -> Self {
        Self {
            admin_name: "Admin".into(),
            admin_email: "admin@admin.com".into(),
            admin_password: "admin123".into(),
        }
    }
}

impl TenantSeeder {
    pub async fn seed<C: Connection>(&self, db: &Surreal<C>) -> StratusResult<()> {
        for (slug, name, entity_kind, position) in MODULES {
            ensure_module(db, slug, name, entity_kind, *position).await?;
        }

        let person_id = match find_one(db, "SELECT meta::id(id) AS record_id FROM person WHERE name = $name", ("name", self.admin_name.clone())).await? {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                db.query(
                    "CREATE type::record('person', $id) SET \
                     name = $name, position = 1",
                )
                .bind(("id", id.clone()))
                .bind(("name", self.admin_name.clone()))
                .await
                .map_err(DbError::from)?
                .check()
                .map_err(|e| StratusError::Database(e.to_string()))?;
                id
            }
        };

        let existing_user = find_one(
            db,
            "SELECT meta::id(id) AS record_id FROM user WHERE email = $email",
            ("email", self.admin_email.clone()),
        )
        .await?;
        if existing_user.is_none() {
            let hash = stratus_auth::password::hash_password(&self.admin_password)?;
            db.query(
                "CREATE type::record('user', $id) SET \
                 person_id = $person_id, email = $email, \
                 password_hash = $password_hash",
            )
            .bind(("id", Uuid::new_v4().to_string()))
            .bind(("person_id", person_id))
            .bind(("email", self.admin_email.clone()))
            .bind(("password_hash", hash))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| StratusError::Database(e.to_string()))?;
            info!(email = %self.admin_email, "Seeded admin account");
        }

        Ok(())
    }
}

/// Seed the master database's module definitions. The tenant catalog
/// itself is served by typed endpoints, so only the metadata modules
/// are needed here.
pub async fn seed_master<C: Connection>(db: &Surreal<C>) -> StratusResult<()> {
    for (slug, name, entity_kind, position) in &MODULES[..2] {
        ensure_module(db, slug, name, entity_kind, *position).await?;
    }
    Ok(())
}

async fn ensure_module<C: Connection>(
    db: &Surreal<C>,
    slug: &str,
    name: &str,
    entity_kind: &str,
    position: i64,
) -> StratusResult<()> {
    let existing = find_one(
        db,
        "SELECT meta::id(id) AS record_id FROM module WHERE slug = $slug",
        ("slug", slug.to_string()),
    )
    .await?;
    if existing.is_some() {
        return Ok(());
    }

    db.query(
        "CREATE type::record('module', $id) CONTENT $data",
    )
    .bind(("id", Uuid::new_v4().to_string()))
    .bind((
        "data",
        json!({
            "slug": slug,
            "owner_level": "platform",
            "name": name,
            "kind": "module",
            "entity_kind": entity_kind,
            "modal_size": "m",
            "position": position,
        }),
    ))
    .await
    .map_err(DbError::from)?
    .check()
    .map_err(|e| StratusError::Database(e.to_string()))?;

    Ok(())
}

async fn find_one<C: Connection>(
    db: &Surreal<C>,
    query: &str,
    bind: (&'static str, String),
) -> StratusResult<Option<String>> {
    let mut result = db
        .query(query)
        .bind(bind)
        .await
        .map_err(DbError::from)?;
    let rows: Vec<IdRow> = result.take(0).map_err(DbError::from)?;
    Ok(rows.into_iter().next().map(|r| r.record_id))
}
