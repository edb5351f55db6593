//! Bearer authentication middleware.
//!
//! Runs after tenant resolution: the token is looked up in the
//! request's tenant database, so a token issued by one tenant is
//! meaningless in another.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use stratus_auth::AuthService;
use stratus_core::error::StratusError;
use stratus_core::models::user::AuthenticatedUser;
use stratus_db::provision::TenantProvisioner;
use stratus_db::repository::{SurrealTokenRepository, SurrealUserRepository};
use stratus_db::router::{TenantConn, TenantRouter};

use crate::AppState;
use crate::error::ApiError;

/// The authenticated user, available to protected handlers.
#[derive(Clone)]
pub struct CurrentUser(pub AuthenticatedUser);

/// The raw bearer token the request presented; logout needs it.
#[derive(Clone)]
pub struct RawToken(pub String);

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

pub async fn require_auth<R, P>(
    State(state): State<Arc<AppState<R, P>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    R: TenantRouter + 'static,
    P: TenantProvisioner + 'static,
{
    let token = bearer_token(&request)
        .ok_or(StratusError::Unauthenticated)?
        .to_string();

    let conn = request
        .extensions()
        .get::<TenantConn>()
        .cloned()
        .ok_or_else(|| StratusError::Internal("tenant connection missing".into()))?;

    let service = AuthService::new(
        SurrealUserRepository::new(conn.db.clone()),
        SurrealTokenRepository::new(conn.db),
        state.auth.clone(),
    );
    let user = service.current_user(&token).await?;

    request.extensions_mut().insert(CurrentUser(user));
    request.extensions_mut().insert(RawToken(token));

    Ok(next.run(request).await)
}
