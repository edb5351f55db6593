//! Error types for the Stratus system.

use std::fmt;

use thiserror::Error;

use crate::validate::FieldErrors;

/// The provisioning step that was executing when a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
    CreateDatabase,
    CreateLogin,
    GrantOwnership,
    BindConnection,
    Migrate,
    Seed,
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProvisionStep::CreateDatabase => "create_database",
            ProvisionStep::CreateLogin => "create_login",
            ProvisionStep::GrantOwnership => "grant_ownership",
            ProvisionStep::BindConnection => "bind_connection",
            ProvisionStep::Migrate => "migrate",
            ProvisionStep::Seed => "seed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum StratusError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Slug already in use: {slug}")]
    SlugInUse { slug: String },

    #[error("Validation failed")]
    Validation { errors: FieldErrors },

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is inactive")]
    InactiveAccount,

    #[error("authentication required")]
    Unauthenticated,

    #[error("Provisioning failed during {step}: {source}")]
    Provisioning {
        step: ProvisionStep,
        #[source]
        source: Box<StratusError>,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StratusError {
    /// Shorthand for the common `NotFound` construction.
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        StratusError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

pub type StratusResult<T> = Result<T, StratusError>;
