//! Tenant administration routes, master-scoped.
//!
//! Creation is synchronous: the response only arrives once the tenant
//! database exists, is migrated and seeded. The catalog row's
//! encrypted database password never leaves this crate; [`TenantView`]
//! is the wire shape for every response.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use stratus_core::error::StratusError;
use stratus_core::lifecycle::RecordState;
use stratus_core::models::tenant::{CreateTenant, Tenant, UpdateTenant};
use stratus_core::repository::TenantCatalog;
use stratus_core::validate::{ApprovedFields, ValidationMode};
use stratus_core::validators::validate_tenant;
use stratus_db::provision::TenantProvisioner;
use stratus_db::router::TenantRouter;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiResult;
use crate::routes::PageQuery;

/// Tenant as exposed over the API. Everything except the database
/// password ciphertext.
#[derive(Debug, Serialize)]
pub struct TenantView {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub db_name: String,
    pub db_user: String,
    pub expiration_date: NaiveDate,
    pub position: i64,
    pub state: RecordState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Tenant> for TenantView {
    fn from(tenant: Tenant) -> Self {
        TenantView {
            id: tenant.id,
            name: tenant.name,
            slug: tenant.slug,
            db_name: tenant.db_name,
            db_user: tenant.db_user,
            expiration_date: tenant.expiration_date,
            position: tenant.position,
            state: tenant.state,
            created_at: tenant.created_at,
            updated_at: tenant.updated_at,
        }
    }
}

// Approved-field accessors. The validator has already checked shape
// and presence, so a miss here is a programming error, not bad input.

fn approved_string(fields: &ApprovedFields, key: &str) -> Result<String, StratusError> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| StratusError::Internal(format!("approved field `{key}` missing")))
}

fn approved_date(fields: &ApprovedFields, key: &str) -> Result<NaiveDate, StratusError> {
    let raw = approved_string(fields, key)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|_| StratusError::Internal(format!("approved field `{key}` is not a date")))
}

pub async fn index<R, P>(
    State(state): State<Arc<AppState<R, P>>>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<Vec<TenantView>>>
where
    R: TenantRouter + 'static,
    P: TenantProvisioner + 'static,
{
    let result = state.catalog.list(page.into()).await?;
    Ok(Json(result.items.into_iter().map(TenantView::from).collect()))
}

pub async fn store<R, P>(
    State(state): State<Arc<AppState<R, P>>>,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<TenantView>)>
where
    R: TenantRouter + 'static,
    P: TenantProvisioner + 'static,
{
    let fields = validate_tenant(&payload, ValidationMode::Create)
        .map_err(|errors| StratusError::Validation { errors })?;

    let input = CreateTenant {
        name: approved_string(&fields, "name")?,
        slug: approved_string(&fields, "slug")?,
        db_name: approved_string(&fields, "db_name")?,
        db_user: approved_string(&fields, "db_user")?,
        db_password: approved_string(&fields, "db_password")?,
        expiration_date: approved_date(&fields, "expiration_date")?,
        position: fields.get("position").and_then(Value::as_i64),
    };

    let tenant = state.provisioner.provision(input).await?;
    Ok((StatusCode::CREATED, Json(tenant.into())))
}

#[derive(Debug, Deserialize)]
pub struct SlugCheckQuery {
    pub slug: String,
    pub exclude: Option<Uuid>,
}

pub async fn slug_check<R, P>(
    State(state): State<Arc<AppState<R, P>>>,
    Query(query): Query<SlugCheckQuery>,
) -> ApiResult<Json<Value>>
where
    R: TenantRouter + 'static,
    P: TenantProvisioner + 'static,
{
    let in_use = state
        .catalog
        .slug_in_use(&query.slug, query.exclude)
        .await?;
    Ok(Json(json!({ "available": !in_use })))
}

pub async fn show<R, P>(
    State(state): State<Arc<AppState<R, P>>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TenantView>>
where
    R: TenantRouter + 'static,
    P: TenantProvisioner + 'static,
{
    let tenant = state.catalog.get_by_id(id).await?;
    Ok(Json(tenant.into()))
}

pub async fn update<R, P>(
    State(state): State<Arc<AppState<R, P>>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<TenantView>>
where
    R: TenantRouter + 'static,
    P: TenantProvisioner + 'static,
{
    let fields = validate_tenant(&payload, ValidationMode::Update)
        .map_err(|errors| StratusError::Validation { errors })?;

    let input = UpdateTenant {
        name: fields.get("name").and_then(Value::as_str).map(str::to_owned),
        slug: fields.get("slug").and_then(Value::as_str).map(str::to_owned),
        expiration_date: match fields.get("expiration_date") {
            Some(_) => Some(approved_date(&fields, "expiration_date")?),
            None => None,
        },
        position: fields.get("position").and_then(Value::as_i64),
        state: fields
            .get("state")
            .and_then(Value::as_str)
            .and_then(RecordState::parse),
    };

    let tenant = state.catalog.update(id, input).await?;
    // Credentials and state may have changed; drop any cached
    // connection for this tenant.
    state.router.invalidate(id).await;
    Ok(Json(tenant.into()))
}

pub async fn destroy<R, P>(
    State(state): State<Arc<AppState<R, P>>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>>
where
    R: TenantRouter + 'static,
    P: TenantProvisioner + 'static,
{
    state.catalog.delete(id).await?;
    state.router.invalidate(id).await;
    Ok(Json(json!({ "message": "Tenant deleted successfully." })))
}

pub async fn restore<R, P>(
    State(state): State<Arc<AppState<R, P>>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TenantView>>
where
    R: TenantRouter + 'static,
    P: TenantProvisioner + 'static,
{
    let tenant = state.catalog.restore(id).await?;
    Ok(Json(tenant.into()))
}
