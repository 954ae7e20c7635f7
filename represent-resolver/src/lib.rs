//! represent-resolver library interface
//!
//! Resolves a street address to the federal and state legislators who
//! represent it. Exposed as a library for the binary and integration tests.

pub mod api;
pub mod error;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod present;
pub mod services;

pub use crate::error::ResolveError;
pub use crate::models::{Office, Official, Representative, ResolutionResult};
pub use crate::pipeline::Resolver;

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(resolver: Arc<Resolver>) -> Self {
        Self {
            resolver,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::representative_routes())
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
