//! Authentication service — login, logout and bearer resolution.

use chrono::{Duration, Utc};
use stratus_core::RecordState;
use stratus_core::error::{StratusError, StratusResult};
use stratus_core::models::token::CreateAccessToken;
use stratus_core::models::user::AuthenticatedUser;
use stratus_core::repository::{TokenRepository, UserRepository};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Raw opaque token (return to client, not stored).
    pub token: String,
    pub user: AuthenticatedUser,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate. An instance operates
/// within one tenant database; the caller constructs it over the
/// request's resolved tenant connection.
pub struct AuthService<U: UserRepository, T: TokenRepository> {
    user_repo: U,
    token_repo: T,
    config: AuthConfig,
}

impl<U: UserRepository, T: TokenRepository> AuthService<U, T> {
    pub fn new(user_repo: U, token_repo: T, config: AuthConfig) -> Self {
        Self {
            user_repo,
            token_repo,
            config,
        }
    }

    /// Authenticate with email + password and issue an opaque token.
    ///
    /// Lookup misses and password mismatches collapse to the same
    /// error so the response does not reveal which emails exist.
    pub async fn login(&self, input: LoginInput) -> StratusResult<LoginOutput> {
        let account = match self.user_repo.get_by_email(&input.email).await {
            Ok(account) => account,
            Err(StratusError::NotFound { .. }) => {
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        let valid = password::verify_password(&input.password, &account.password_hash)?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        if account.state != RecordState::Active {
            return Err(AuthError::AccountInactive.into());
        }

        let raw = token::generate_token();
        let expires_at = Utc::now() + Duration::seconds(self.config.token_lifetime_secs as i64);
        self.token_repo
            .create(CreateAccessToken {
                user_id: account.id,
                token_hash: token::hash_token(&raw),
                expires_at,
            })
            .await?;

        let person = self.user_repo.get_person(account.person_id).await.ok();
        Ok(LoginOutput {
            token: raw,
            user: AuthenticatedUser::from_account(account, person),
        })
    }

    /// Revoke the token presented by the client (logout). Unknown
    /// tokens are a no-op so logout is idempotent.
    pub async fn logout(&self, raw_token: &str) -> StratusResult<()> {
        match self
            .token_repo
            .get_by_hash(&token::hash_token(raw_token))
            .await
        {
            Ok(stored) => self.token_repo.delete(stored.id).await,
            Err(StratusError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Resolve a raw bearer token to its user.
    ///
    /// Expired tokens are deleted on sight; inactive accounts cannot
    /// use tokens issued while they were active.
    pub async fn current_user(&self, raw_token: &str) -> StratusResult<AuthenticatedUser> {
        let stored = match self
            .token_repo
            .get_by_hash(&token::hash_token(raw_token))
            .await
        {
            Ok(stored) => stored,
            Err(StratusError::NotFound { .. }) => {
                return Err(AuthError::TokenInvalid("unknown token".into()).into());
            }
            Err(e) => return Err(e),
        };

        if stored.expires_at <= Utc::now() {
            if let Err(e) = self.token_repo.delete(stored.id).await {
                tracing::warn!(error = %e, "failed to delete expired token");
            }
            return Err(AuthError::TokenExpired.into());
        }

        let account = self.user_repo.get_by_id(stored.user_id).await?;
        if account.state != RecordState::Active {
            return Err(AuthError::AccountInactive.into());
        }

        let person = self.user_repo.get_person(account.person_id).await.ok();
        Ok(AuthenticatedUser::from_account(account, person))
    }
}
