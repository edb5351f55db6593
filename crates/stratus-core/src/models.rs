//! Domain models for Stratus.
//!
//! Catalog rows (tenants, master modules) live in the master database;
//! everything else lives inside each tenant's isolated database.

pub mod module;
pub mod module_field;
pub mod person;
pub mod tenant;
pub mod token;
pub mod user;
