//! Generic entity routes.
//!
//! The `:module` path segment is resolved against the module table of
//! the request's tenant database; the dispatcher does the rest. The
//! same handlers serve every registered entity.

use std::sync::Arc;

use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{Value, json};
use stratus_db::dispatch::EntityDispatcher;
use stratus_db::provision::TenantProvisioner;
use stratus_db::router::{TenantConn, TenantRouter};
use surrealdb::engine::any::Any;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiResult;
use crate::routes::PageQuery;

fn dispatcher<R, P>(state: &AppState<R, P>, conn: &TenantConn) -> EntityDispatcher<Any> {
    EntityDispatcher::new(conn.db.clone(), state.registry.clone())
}

pub async fn index<R, P>(
    State(state): State<Arc<AppState<R, P>>>,
    Extension(conn): Extension<TenantConn>,
    Path((_tenant, module)): Path<(String, String)>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<Vec<Value>>>
where
    R: TenantRouter + 'static,
    P: TenantProvisioner + 'static,
{
    let result = dispatcher(&state, &conn)
        .list(&module, page.into())
        .await?;
    Ok(Json(result.items))
}

pub async fn store<R, P>(
    State(state): State<Arc<AppState<R, P>>>,
    Extension(conn): Extension<TenantConn>,
    Path((_tenant, module)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)>
where
    R: TenantRouter + 'static,
    P: TenantProvisioner + 'static,
{
    let row = dispatcher(&state, &conn).create(&module, &payload).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn show<R, P>(
    State(state): State<Arc<AppState<R, P>>>,
    Extension(conn): Extension<TenantConn>,
    Path((_tenant, module, id)): Path<(String, String, Uuid)>,
) -> ApiResult<Json<Value>>
where
    R: TenantRouter + 'static,
    P: TenantProvisioner + 'static,
{
    let row = dispatcher(&state, &conn).get(&module, id).await?;
    Ok(Json(row))
}

pub async fn update<R, P>(
    State(state): State<Arc<AppState<R, P>>>,
    Extension(conn): Extension<TenantConn>,
    Path((_tenant, module, id)): Path<(String, String, Uuid)>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<Value>>
where
    R: TenantRouter + 'static,
    P: TenantProvisioner + 'static,
{
    let row = dispatcher(&state, &conn)
        .update(&module, id, &payload)
        .await?;
    Ok(Json(row))
}

pub async fn destroy<R, P>(
    State(state): State<Arc<AppState<R, P>>>,
    Extension(conn): Extension<TenantConn>,
    Path((_tenant, module, id)): Path<(String, String, Uuid)>,
) -> ApiResult<Json<Value>>
where
    R: TenantRouter + 'static,
    P: TenantProvisioner + 'static,
{
    dispatcher(&state, &conn).delete(&module, id).await?;
    Ok(Json(json!({ "message": "Record deleted successfully." })))
}

pub async fn restore<R, P>(
    State(state): State<Arc<AppState<R, P>>>,
    Extension(conn): Extension<TenantConn>,
    Path((_tenant, module, id)): Path<(String, String, Uuid)>,
) -> ApiResult<Json<Value>>
where
    R: TenantRouter + 'static,
    P: TenantProvisioner + 'static,
{
    let row = dispatcher(&state, &conn).restore(&module, id).await?;
    Ok(Json(row))
}
