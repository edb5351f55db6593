//! Module field metadata model.
//!
//! Fields are schema-as-data: they describe the shape and validation
//! of an entity's attributes for the admin frontend, but never alter
//! physical storage. The physical column is assumed to already exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::RecordState;
use crate::models::module::OwnerLevel;

/// Logical data type of a module field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Integer,
    Boolean,
    Decimal,
    Text,
    Date,
    DateTime,
    Json,
    BigInt,
    Timestamp,
}

impl FieldType {
    pub const ALL: &'static [&'static str] = &[
        "string",
        "integer",
        "boolean",
        "decimal",
        "text",
        "date",
        "datetime",
        "json",
        "bigint",
        "timestamp",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Decimal => "decimal",
            FieldType::Text => "text",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Json => "json",
            FieldType::BigInt => "bigint",
            FieldType::Timestamp => "timestamp",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "string" => Some(FieldType::String),
            "integer" => Some(FieldType::Integer),
            "boolean" => Some(FieldType::Boolean),
            "decimal" => Some(FieldType::Decimal),
            "text" => Some(FieldType::Text),
            "date" => Some(FieldType::Date),
            "datetime" => Some(FieldType::DateTime),
            "json" => Some(FieldType::Json),
            "bigint" => Some(FieldType::BigInt),
            "timestamp" => Some(FieldType::Timestamp),
            _ => None,
        }
    }
}

/// Transform applied when a field value is auto-derived from another.
pub const AUTO_TRANSFORMS: &[&str] = &["slug", "uppercase", "lowercase"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleField {
    pub id: Uuid,
    /// Owning module; fields are removed together with their module.
    pub module_id: Uuid,
    pub name: String,
    pub label: String,
    pub icon: Option<String>,
    pub kind: FieldType,
    pub length: Option<i64>,
    pub precision: Option<i64>,
    pub default_value: Option<String>,
    pub nullable: bool,
    pub required: bool,
    /// Min/max bounds, stored as strings and interpreted per type.
    pub min: Option<String>,
    pub max: Option<String>,
    pub is_unique: bool,
    pub indexed: bool,
    /// Remote uniqueness scope for cross-entity checks.
    pub unique_table: Option<String>,
    pub unique_column: Option<String>,
    /// Foreign-key descriptor (table, column, display-label column).
    pub fk_table: Option<String>,
    pub fk_column: Option<String>,
    pub fk_label: Option<String>,
    /// Auto-derivation: source field name + transform.
    pub auto_from: Option<String>,
    pub auto_transform: Option<String>,
    /// System-defined fields cannot be deleted from the admin UI.
    pub main: bool,
    pub is_custom: bool,
    pub owner_level: OwnerLevel,
    pub owner_id: Option<Uuid>,
    pub position: i64,
    pub state: RecordState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
