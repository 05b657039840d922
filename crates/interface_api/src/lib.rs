//! HTTP API Layer
//!
//! This crate provides the REST API for the underwriting decision engine using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Evaluation and rule catalog endpoints
//! - **Middleware**: Request ids, tracing, audit logging
//! - **DTOs**: Request/Response data transfer objects with validation
//! - **Error Handling**: Consistent error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(catalog, loaded, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    http::HeaderName,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use domain_underwriting::{RuleCatalog, UnderwritingService};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{health, underwriting};
use crate::middleware::{audit_middleware, REQUEST_ID_HEADER};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<UnderwritingService>,
    pub catalog: Arc<dyn RuleCatalog>,
    /// Rule sets present when the server started
    pub loaded_rule_sets: usize,
    pub config: ApiConfig,
}

/// Creates the main API router
///
/// # Arguments
///
/// * `catalog` - Rule catalog queried per evaluation
/// * `loaded_rule_sets` - Number of rule sets loaded at startup, for readiness
/// * `config` - API configuration
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(catalog: Arc<dyn RuleCatalog>, loaded_rule_sets: usize, config: ApiConfig) -> Router {
    let service = UnderwritingService::new().with_config(config.aggregation());
    let state = AppState {
        service: Arc::new(service),
        catalog,
        loaded_rule_sets,
        config,
    };

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let api_routes = Router::new()
        .route("/underwriting/evaluations", post(underwriting::evaluate))
        .route("/rule-sets", get(underwriting::list_rule_sets))
        .layer(axum_middleware::from_fn(audit_middleware));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
