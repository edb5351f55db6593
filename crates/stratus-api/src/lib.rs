//! Stratus API — HTTP surface for the multi-tenant admin backend.
//!
//! Two route families share one router: master-scoped tenant
//! administration under `/admin`, and tenant-scoped routes under
//! `/:tenant` where the first path segment picks the tenant database
//! for the whole request.

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use stratus_auth::AuthConfig;
use stratus_core::registry::EntityRegistry;
use stratus_db::provision::TenantProvisioner;
use stratus_db::repository::SurrealTenantCatalog;
use stratus_db::router::TenantRouter;
use surrealdb::engine::any::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
pub struct AppState<R, P> {
    /// Tenant catalog on the master database.
    pub catalog: SurrealTenantCatalog<Any>,
    /// Resolves tenant slugs to tenant database connections.
    pub router: R,
    /// Provisions new tenants.
    pub provisioner: P,
    /// Entity registry consumed by the generic dispatcher.
    pub registry: Arc<EntityRegistry>,
    pub auth: AuthConfig,
}

/// Build the API router.
pub fn build_router<R, P>(state: Arc<AppState<R, P>>) -> Router
where
    R: TenantRouter + 'static,
    P: TenantProvisioner + 'static,
{
    let admin = Router::new()
        .route(
            "/admin/tenants",
            get(routes::tenants::index::<R, P>).post(routes::tenants::store::<R, P>),
        )
        .route(
            "/admin/tenants/slug-check",
            get(routes::tenants::slug_check::<R, P>),
        )
        .route(
            "/admin/tenants/:id",
            get(routes::tenants::show::<R, P>)
                .put(routes::tenants::update::<R, P>)
                .patch(routes::tenants::update::<R, P>)
                .delete(routes::tenants::destroy::<R, P>),
        )
        .route(
            "/admin/tenants/:id/restore",
            patch(routes::tenants::restore::<R, P>),
        );

    let protected = Router::new()
        .route("/:tenant/auth/logout", post(routes::auth::logout::<R, P>))
        .route("/:tenant/auth/me", get(routes::auth::me))
        .route(
            "/:tenant/:module",
            get(routes::entities::index::<R, P>).post(routes::entities::store::<R, P>),
        )
        .route(
            "/:tenant/:module/:id",
            get(routes::entities::show::<R, P>)
                .put(routes::entities::update::<R, P>)
                .patch(routes::entities::update::<R, P>)
                .delete(routes::entities::destroy::<R, P>),
        )
        .route(
            "/:tenant/:module/:id/restore",
            patch(routes::entities::restore::<R, P>),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth::<R, P>,
        ));

    let tenant_scoped = Router::new()
        .route("/:tenant/auth/login", post(routes::auth::login::<R, P>))
        .merge(protected)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::tenant::resolve_tenant::<R, P>,
        ));

    Router::new()
        .merge(admin)
        .merge(tenant_scoped)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
