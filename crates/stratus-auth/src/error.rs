//! Authentication error types.

use stratus_core::error::StratusError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is inactive")]
    AccountInactive,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for StratusError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => StratusError::InvalidCredentials,
            AuthError::AccountInactive => StratusError::InactiveAccount,
            AuthError::TokenExpired | AuthError::TokenInvalid(_) => StratusError::Unauthenticated,
            AuthError::Crypto(msg) => StratusError::Crypto(msg),
        }
    }
}
