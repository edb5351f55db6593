//! Tenant resolution middleware.
//!
//! Resolves the `:tenant` path segment to a live tenant database
//! connection and stores it in the request extensions. Everything
//! downstream reads the connection from there; no handler ever
//! touches a connection that was resolved for another request.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use stratus_core::error::StratusError;
use stratus_db::provision::TenantProvisioner;
use stratus_db::router::TenantRouter;

use crate::AppState;
use crate::error::ApiError;

pub async fn resolve_tenant<R, P>(
    State(state): State<Arc<AppState<R, P>>>,
    Path(params): Path<HashMap<String, String>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    R: TenantRouter + 'static,
    P: TenantProvisioner + 'static,
{
    let slug = params
        .get("tenant")
        .ok_or_else(|| StratusError::Internal("tenant path parameter missing".into()))?;

    // Unknown and deleted tenants 404 here, before any business
    // logic runs.
    let conn = state.router.resolve(slug).await?;
    request.extensions_mut().insert(conn);

    Ok(next.run(request).await)
}
