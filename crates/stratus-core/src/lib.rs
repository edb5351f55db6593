//! Stratus Core — domain models and contracts for the multi-tenant
//! admin backend.
//!
//! This crate defines:
//! - The error taxonomy ([`StratusError`], [`StratusResult`])
//! - Domain models (tenants, modules, module fields, people, accounts)
//! - Repository trait definitions for data access abstraction
//! - The typed entity registry consumed by the generic dispatcher
//! - The validation contract (validators emit the approved field set)

pub mod error;
pub mod lifecycle;
pub mod models;
pub mod registry;
pub mod repository;
pub mod validate;
pub mod validators;

pub use error::{ProvisionStep, StratusError, StratusResult};
pub use lifecycle::RecordState;
pub use registry::{EntityDef, EntityRegistry};
