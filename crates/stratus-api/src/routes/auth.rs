//! Authentication routes, scoped to the request's tenant.

use std::sync::Arc;

use axum::extract::{Extension, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use stratus_auth::{AuthService, LoginInput};
use stratus_db::provision::TenantProvisioner;
use stratus_db::repository::{SurrealTokenRepository, SurrealUserRepository};
use stratus_db::router::{TenantConn, TenantRouter};

use crate::AppState;
use crate::error::ApiResult;
use crate::middleware::auth::{CurrentUser, RawToken};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn auth_service<R, P>(
    state: &AppState<R, P>,
    conn: &TenantConn,
) -> AuthService<
    SurrealUserRepository<surrealdb::engine::any::Any>,
    SurrealTokenRepository<surrealdb::engine::any::Any>,
> {
    AuthService::new(
        SurrealUserRepository::new(conn.db.clone()),
        SurrealTokenRepository::new(conn.db.clone()),
        state.auth.clone(),
    )
}

pub async fn login<R, P>(
    State(state): State<Arc<AppState<R, P>>>,
    Extension(conn): Extension<TenantConn>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<serde_json::Value>>
where
    R: TenantRouter + 'static,
    P: TenantProvisioner + 'static,
{
    let output = auth_service(&state, &conn)
        .login(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await?;

    Ok(Json(json!({
        "token": output.token,
        "user": output.user,
    })))
}

pub async fn logout<R, P>(
    State(state): State<Arc<AppState<R, P>>>,
    Extension(conn): Extension<TenantConn>,
    Extension(token): Extension<RawToken>,
) -> ApiResult<Json<serde_json::Value>>
where
    R: TenantRouter + 'static,
    P: TenantProvisioner + 'static,
{
    auth_service(&state, &conn).logout(&token.0).await?;
    Ok(Json(json!({ "message": "Logged out successfully." })))
}

pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<serde_json::Value> {
    Json(json!({ "user": user.0 }))
}
