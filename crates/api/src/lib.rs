//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for every resource under `/api/v1`
//! - Authentication, CSRF and rate-limit middleware
//! - Request extractors
//! - The JSON error envelope

pub mod crm_sync;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, header::AUTHORIZATION, header::COOKIE};
use gestor_crm::CrmProvider;
use gestor_shared::{JwtService, SecurityConfig};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Header carrying the CSRF token on mutating requests.
pub const CSRF_HEADER: HeaderName = HeaderName::from_static("x-csrf-token");

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Cookie, CSRF and rate-limit settings.
    pub security: Arc<SecurityConfig>,
    /// CRM adapter; `None` when synchronization is disabled.
    pub crm: Option<Arc<dyn CrmProvider>>,
}

impl AppState {
    /// Clones the connection for a repository.
    #[must_use]
    pub fn conn(&self) -> DatabaseConnection {
        (*self.db).clone()
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetSensitiveRequestHeadersLayer::new([
            AUTHORIZATION,
            COOKIE,
            CSRF_HEADER,
        ]))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
