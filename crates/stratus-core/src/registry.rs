//! Entity registry: the typed catalog of dispatchable entities.
//!
//! Every entity reachable through the generic CRUD surface is declared
//! here at startup with its table name, validator and write hooks.
//! Dispatch looks entities up by the slug stored on their module row;
//! nothing is resolved by runtime reflection or string-built type
//! names.

use std::collections::HashMap;

use crate::error::StratusResult;
use crate::validate::{ApprovedFields, FieldErrors, ValidationMode};

/// Validates a raw payload and returns the exact fields allowed to be
/// written.
pub type ValidatorFn =
    fn(&serde_json::Value, ValidationMode) -> Result<ApprovedFields, FieldErrors>;

/// Optional hook run after validation and before the write; used e.g.
/// to replace a plaintext password with its hash.
pub type PrepareFn = fn(&mut ApprovedFields) -> StratusResult<()>;

/// Static description of one dispatchable entity.
#[derive(Clone, Copy)]
pub struct EntityDef {
    /// Storage table the entity lives in.
    pub table: &'static str,
    /// Whether list ordering uses the `position` column. Entities
    /// without one fall back to creation order.
    pub orderable: bool,
    /// Columns stripped from every row before it leaves the
    /// dispatcher (credential material and the like).
    pub hidden: &'static [&'static str],
    /// Columns that must be unique among non-deleted rows.
    pub unique_columns: &'static [&'static str],
    pub validator: ValidatorFn,
    pub prepare: Option<PrepareFn>,
}

#[derive(Default)]
pub struct EntityRegistry {
    entries: HashMap<&'static str, EntityDef>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: &'static str, def: EntityDef) {
        self.entries.insert(key, def);
    }

    pub fn get(&self, key: &str) -> Option<&EntityDef> {
        self.entries.get(key)
    }
}
