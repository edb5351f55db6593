//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. Two migration sets exist: one
//! for the master database (tenant catalog + platform modules) and
//! one applied to every tenant database at provisioning time.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MASTER_MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "master_tenant_catalog",
        sql: MASTER_SCHEMA_V1,
    },
    Migration {
        version: 2,
        name: "module_metadata_tables",
        sql: MODULE_TABLES_DDL,
    },
];

static TENANT_MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "tenant_initial_schema",
        sql: TENANT_SCHEMA_V1,
    },
    Migration {
        version: 2,
        name: "module_metadata_tables",
        sql: MODULE_TABLES_DDL,
    },
];

/// Which database kind a migration run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationSet {
    Master,
    Tenant,
}

// -----------------------------------------------------------------------
// Module metadata tables
// -----------------------------------------------------------------------

// Present in both the master database (platform modules) and each
// tenant database (tenant-owned modules), with identical shape.
const MODULE_TABLES_DDL: &str = "\
-- =======================================================================
-- Modules
-- =======================================================================
DEFINE TABLE module SCHEMAFULL;
DEFINE FIELD slug ON TABLE module TYPE string;
DEFINE FIELD owner_level ON TABLE module TYPE string \
    ASSERT $value IN ['master', 'platform', 'tenant'];
DEFINE FIELD owner_id ON TABLE module TYPE option<string>;
DEFINE FIELD name ON TABLE module TYPE string;
DEFINE FIELD icon ON TABLE module TYPE option<string>;
DEFINE FIELD kind ON TABLE module TYPE string \
    ASSERT $value IN ['module', 'submodule', 'pivot'];
DEFINE FIELD entity_kind ON TABLE module TYPE option<string>;
DEFINE FIELD url_prefix ON TABLE module TYPE option<string>;
DEFINE FIELD controller ON TABLE module TYPE option<string>;
DEFINE FIELD modal_size ON TABLE module TYPE string \
    ASSERT $value IN ['p', 'm', 'g'] DEFAULT 'm';
DEFINE FIELD description_index ON TABLE module TYPE option<string>;
DEFINE FIELD description_show ON TABLE module TYPE option<string>;
DEFINE FIELD description_store ON TABLE module TYPE option<string>;
DEFINE FIELD description_update ON TABLE module TYPE option<string>;
DEFINE FIELD description_delete ON TABLE module TYPE option<string>;
DEFINE FIELD description_restore ON TABLE module TYPE option<string>;
DEFINE FIELD after_store ON TABLE module TYPE option<string> \
    ASSERT $value IN [NONE, 'index', 'show', 'create', 'edit'];
DEFINE FIELD after_update ON TABLE module TYPE option<string> \
    ASSERT $value IN [NONE, 'index', 'show', 'create', 'edit'];
DEFINE FIELD after_restore ON TABLE module TYPE option<string> \
    ASSERT $value IN [NONE, 'index', 'show', 'create', 'edit'];
DEFINE FIELD position ON TABLE module TYPE int DEFAULT 1;
DEFINE FIELD state ON TABLE module TYPE string \
    ASSERT $value IN ['Active', 'Inactive', 'Deleted'] DEFAULT 'Active';
DEFINE FIELD created_at ON TABLE module TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE module TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_module_slug ON TABLE module COLUMNS slug;

-- =======================================================================
-- Module fields
-- =======================================================================
DEFINE TABLE module_field SCHEMAFULL;
DEFINE FIELD module_id ON TABLE module_field TYPE string;
DEFINE FIELD name ON TABLE module_field TYPE string;
DEFINE FIELD label ON TABLE module_field TYPE string;
DEFINE FIELD icon ON TABLE module_field TYPE option<string>;
DEFINE FIELD kind ON TABLE module_field TYPE string \
    ASSERT $value IN ['string', 'integer', 'boolean', 'decimal', \
    'text', 'date', 'datetime', 'json', 'bigint', 'timestamp'];
DEFINE FIELD length ON TABLE module_field TYPE option<int>;
DEFINE FIELD precision ON TABLE module_field TYPE option<int>;
DEFINE FIELD default_value ON TABLE module_field TYPE option<string>;
DEFINE FIELD nullable ON TABLE module_field TYPE bool DEFAULT false;
DEFINE FIELD required ON TABLE module_field TYPE bool DEFAULT false;
DEFINE FIELD min ON TABLE module_field TYPE option<string>;
DEFINE FIELD max ON TABLE module_field TYPE option<string>;
DEFINE FIELD is_unique ON TABLE module_field TYPE bool DEFAULT false;
DEFINE FIELD indexed ON TABLE module_field TYPE bool DEFAULT false;
DEFINE FIELD unique_table ON TABLE module_field TYPE option<string>;
DEFINE FIELD unique_column ON TABLE module_field TYPE option<string>;
DEFINE FIELD fk_table ON TABLE module_field TYPE option<string>;
DEFINE FIELD fk_column ON TABLE module_field TYPE option<string>;
DEFINE FIELD fk_label ON TABLE module_field TYPE option<string>;
DEFINE FIELD auto_from ON TABLE module_field TYPE option<string>;
DEFINE FIELD auto_transform ON TABLE module_field TYPE option<string> \
    ASSERT $value IN [NONE, 'slug', 'uppercase', 'lowercase'];
DEFINE FIELD main ON TABLE module_field TYPE bool DEFAULT false;
DEFINE FIELD is_custom ON TABLE module_field TYPE bool DEFAULT false;
DEFINE FIELD owner_level ON TABLE module_field TYPE string \
    ASSERT $value IN ['master', 'platform', 'tenant'] \
    DEFAULT 'platform';
DEFINE FIELD owner_id ON TABLE module_field TYPE option<string>;
DEFINE FIELD position ON TABLE module_field TYPE int DEFAULT 1;
DEFINE FIELD state ON TABLE module_field TYPE string \
    ASSERT $value IN ['Active', 'Inactive', 'Deleted'] DEFAULT 'Active';
DEFINE FIELD created_at ON TABLE module_field TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE module_field TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_module_field_module ON TABLE module_field \
    COLUMNS module_id;
";

// -----------------------------------------------------------------------
// Master schema v1 — tenant catalog
// -----------------------------------------------------------------------

const MASTER_SCHEMA_V1: &str = "\
-- =======================================================================
-- Tenant catalog
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD name ON TABLE tenant TYPE string;
DEFINE FIELD slug ON TABLE tenant TYPE string;
DEFINE FIELD db_name ON TABLE tenant TYPE string;
DEFINE FIELD db_user ON TABLE tenant TYPE string;
DEFINE FIELD db_password ON TABLE tenant TYPE string;
DEFINE FIELD expiration_date ON TABLE tenant TYPE string;
DEFINE FIELD position ON TABLE tenant TYPE int DEFAULT 1;
DEFINE FIELD state ON TABLE tenant TYPE string \
    ASSERT $value IN ['Active', 'Inactive', 'Deleted'] DEFAULT 'Active';
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_slug ON TABLE tenant COLUMNS slug;
";

// -----------------------------------------------------------------------
// Tenant schema v1 — per-tenant database
// -----------------------------------------------------------------------

const TENANT_SCHEMA_V1: &str = "\
-- =======================================================================
-- People
-- =======================================================================
DEFINE TABLE person SCHEMAFULL;
DEFINE FIELD name ON TABLE person TYPE string;
DEFINE FIELD position ON TABLE person TYPE int DEFAULT 1;
DEFINE FIELD state ON TABLE person TYPE string \
    ASSERT $value IN ['Active', 'Inactive', 'Deleted'] DEFAULT 'Active';
DEFINE FIELD created_at ON TABLE person TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE person TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- User accounts
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD person_id ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD state ON TABLE user TYPE string \
    ASSERT $value IN ['Active', 'Inactive', 'Deleted'] DEFAULT 'Active';
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
-- Uniqueness among non-deleted rows is enforced in the write path so
-- deleted accounts release their address; the index stays plain.
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email;

-- =======================================================================
-- Access tokens
-- =======================================================================
DEFINE TABLE access_token SCHEMAFULL;
DEFINE FIELD user_id ON TABLE access_token TYPE string;
DEFINE FIELD token_hash ON TABLE access_token TYPE string;
DEFINE FIELD expires_at ON TABLE access_token TYPE datetime;
DEFINE FIELD created_at ON TABLE access_token TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_access_token_hash ON TABLE access_token \
    COLUMNS token_hash UNIQUE;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations of the chosen set against the given
/// SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(
    db: &Surreal<C>,
    set: MigrationSet,
) -> Result<(), DbError> {
    let migrations = match set {
        MigrationSet::Master => MASTER_MIGRATIONS,
        MigrationSet::Tenant => TENANT_MIGRATIONS,
    };

    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in migrations {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}
