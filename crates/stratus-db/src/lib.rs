//! Stratus Database — SurrealDB connection management, schema
//! migrations, repository implementations, tenant connection routing,
//! provisioning and the generic entity dispatcher.
//!
//! Layout mirrors the physical layout of the system: the master
//! database holds the tenant catalog and platform module definitions;
//! every tenant owns a dedicated database created at provisioning
//! time and reached through [`router::SurrealTenantRouter`].

mod connection;
pub mod dispatch;
mod error;
pub mod provision;
pub mod registry;
pub mod repository;
pub mod router;
mod schema;
mod secret;
pub mod seed;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{MigrationSet, run_migrations};
pub use secret::PasswordCipher;
