use axum::{
    Router,
    extract::OriginalUri,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod compatibility;
mod error;
mod metals;
mod observability;
mod products;
mod system;
mod types;
mod users;
pub mod validation;

pub use error::{ApiError, FieldErrors};
pub use types::*;

use crate::services::{
    AuthService, CompatibilityService, MetalService, ProductService, UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.shared.auth
    }

    #[must_use]
    pub fn users(&self) -> &Arc<dyn UserService> {
        &self.shared.user_service
    }

    #[must_use]
    pub fn products(&self) -> &Arc<dyn ProductService> {
        &self.shared.product_service
    }

    #[must_use]
    pub fn metals(&self) -> &Arc<dyn MetalService> {
        &self.shared.metal_service
    }

    #[must_use]
    pub fn compatibility(&self) -> &Arc<dyn CompatibilityService> {
        &self.shared.compatibility_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().read().await.server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .route("/health", get(system::health))
        .merge(public_routes())
        .merge(authenticated_routes(&state))
        .merge(staff_routes(&state))
        .merge(admin_routes(&state));

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/health", get(system::health))
        .nest("/api", api_router)
        .fallback(route_not_found)
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

async fn route_not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::NotFound(format!("Route {} not found", uri.path()))
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/reset-password", post(users::request_password_reset))
        .route(
            "/users/reset-password/confirm",
            post(users::confirm_password_reset),
        )
        .route("/products", get(products::list_products))
        .route("/products/search", get(products::search_products))
        .route("/products/categories", get(products::categories))
        .route("/products/in-stock", get(products::in_stock_products))
        .route("/products/price-range", get(products::products_by_price_range))
        .route("/products/low-stock", get(products::low_stock_products))
        .route(
            "/products/category/{category}",
            get(products::products_by_category),
        )
        .route("/products/{id}", get(products::get_product))
        .route("/compatibilities/web-app", get(compatibility::web_app))
        .route("/compatibilities/ios-app", get(compatibility::ios_app))
        .route("/compatibilities/version", get(compatibility::version))
        .route("/compatibilities/matrix", get(compatibility::matrix_view))
}

/// Any signed-in, active account.
fn authenticated_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/users/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/users/change-password", put(users::change_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
}

/// Admins and moderators.
fn staff_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/products", post(products::create_product))
        .route("/products/{id}", put(products::update_product))
        .route("/products/{id}/stock", put(products::update_stock))
        .route(
            "/products/bulk-update-stock",
            post(products::bulk_update_stock),
        )
        .route_layer(middleware::from_fn_with_state(auth::STAFF, auth::role_gate))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
}

fn admin_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(users::list_users))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/{id}/deactivate", put(users::deactivate_user))
        .route("/users/{id}/activate", put(users::activate_user))
        .route("/products/{id}", delete(products::delete_product))
        .route("/products/stats/overview", get(products::stats))
        .route(
            "/metals",
            get(metals::list_metals).post(metals::create_metal),
        )
        .route(
            "/metals/{id}",
            get(metals::get_metal)
                .put(metals::update_metal)
                .delete(metals::delete_metal),
        )
        .route(
            "/compatibilities",
            get(compatibility::list_entries).post(compatibility::create_entry),
        )
        .route(
            "/compatibilities/metals",
            get(compatibility::referenced_metals),
        )
        .route(
            "/compatibilities/{id}",
            get(compatibility::get_entry)
                .put(compatibility::update_entry)
                .delete(compatibility::delete_entry),
        )
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(
            auth::ADMIN_ONLY,
            auth::role_gate,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
}
