//! Module metadata model.
//!
//! A module describes one business entity type: which entity kind in
//! the registry serves it, plus UI hints the admin frontend consumes.
//! Module rows are data, not code — registering a new entity kind and
//! inserting a module row is all it takes to expose a new entity over
//! the generic CRUD surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::RecordState;

/// Which principal a module (or field) definition belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnerLevel {
    Master,
    Platform,
    Tenant,
}

impl OwnerLevel {
    pub const ALL: &'static [&'static str] = &["master", "platform", "tenant"];

    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerLevel::Master => "master",
            OwnerLevel::Platform => "platform",
            OwnerLevel::Tenant => "tenant",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "master" => Some(OwnerLevel::Master),
            "platform" => Some(OwnerLevel::Platform),
            "tenant" => Some(OwnerLevel::Tenant),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleKind {
    Module,
    Submodule,
    Pivot,
}

impl ModuleKind {
    pub const ALL: &'static [&'static str] = &["module", "submodule", "pivot"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Module => "module",
            ModuleKind::Submodule => "submodule",
            ModuleKind::Pivot => "pivot",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "module" => Some(ModuleKind::Module),
            "submodule" => Some(ModuleKind::Submodule),
            "pivot" => Some(ModuleKind::Pivot),
            _ => None,
        }
    }
}

/// Modal size hint for the admin frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModalSize {
    Small,
    Medium,
    Large,
}

impl ModalSize {
    pub const ALL: &'static [&'static str] = &["p", "m", "g"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModalSize::Small => "p",
            ModalSize::Medium => "m",
            ModalSize::Large => "g",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "p" => Some(ModalSize::Small),
            "m" => Some(ModalSize::Medium),
            "g" => Some(ModalSize::Large),
            _ => None,
        }
    }
}

/// Where the frontend navigates after a successful operation.
pub const POST_ACTIONS: &[&str] = &["index", "show", "create", "edit"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: Uuid,
    /// URL segment, unique among non-deleted modules.
    pub slug: String,
    pub owner_level: OwnerLevel,
    pub owner_id: Option<Uuid>,
    pub name: String,
    pub icon: Option<String>,
    pub kind: ModuleKind,
    /// Entity kind name resolved through the typed registry at
    /// dispatch time. `None` means the module is purely descriptive
    /// and cannot be dispatched.
    pub entity_kind: Option<String>,
    pub url_prefix: Option<String>,
    /// Optional dedicated controller override; modules without one are
    /// served by the generic dispatcher.
    pub controller: Option<String>,
    pub modal_size: ModalSize,
    pub description_index: Option<String>,
    pub description_show: Option<String>,
    pub description_store: Option<String>,
    pub description_update: Option<String>,
    pub description_delete: Option<String>,
    pub description_restore: Option<String>,
    pub after_store: Option<String>,
    pub after_update: Option<String>,
    pub after_restore: Option<String>,
    pub position: i64,
    pub state: RecordState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
