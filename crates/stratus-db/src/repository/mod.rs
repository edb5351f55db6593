//! SurrealDB repository implementations.

mod catalog;
mod module;
mod token;
mod user;

pub use catalog::SurrealTenantCatalog;
pub use module::SurrealModuleRepository;
pub use token::SurrealTokenRepository;
pub use user::SurrealUserRepository;

use stratus_core::RecordState;

use crate::error::DbError;

/// Parse a stored `state` column value.
pub(crate) fn parse_state(value: &str) -> Result<RecordState, DbError> {
    RecordState::parse(value)
        .ok_or_else(|| DbError::Decode(format!("unknown record state: {value}")))
}
