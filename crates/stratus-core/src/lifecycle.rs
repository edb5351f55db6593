//! Record lifecycle state.
//!
//! Every mutable row carries a single `state` column instead of the
//! two independent flags (`active` boolean + deletion timestamp) that
//! tend to drift apart. Transitions:
//!
//! - create      → `Active`
//! - deactivate  → `Inactive` (admin edit)
//! - delete      → `Deleted` (excluded from listings, still readable)
//! - restore     → `Inactive` (an admin must re-activate explicitly)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordState {
    Active,
    Inactive,
    Deleted,
}

impl RecordState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RecordState::Active => "Active",
            RecordState::Inactive => "Inactive",
            RecordState::Deleted => "Deleted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Active" => Some(RecordState::Active),
            "Inactive" => Some(RecordState::Inactive),
            "Deleted" => Some(RecordState::Deleted),
            _ => None,
        }
    }

    /// Whether the record is visible in listings.
    pub fn is_listed(&self) -> bool {
        !matches!(self, RecordState::Deleted)
    }
}
