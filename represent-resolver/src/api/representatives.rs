//! Representative lookup handlers

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::error::ResolveError;
use crate::models::ResolutionResult;
use crate::present::RepresentativeList;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RepresentativesRequest {
    #[serde(default)]
    pub address: Option<String>,
}

impl RepresentativesRequest {
    fn address(&self) -> Result<&str, ResolveError> {
        self.address
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| ResolveError::InvalidInput("Valid address is required".to_string()))
    }
}

/// POST /representatives
pub async fn resolve_representatives(
    State(state): State<AppState>,
    Json(request): Json<RepresentativesRequest>,
) -> Result<Json<ResolutionResult>, ResolveError> {
    let address = request.address()?;
    info!("Representatives request");
    let result = state.resolver.resolve(address).await?;
    Ok(Json(result))
}

/// POST /representatives/list
pub async fn list_representatives(
    State(state): State<AppState>,
    Json(request): Json<RepresentativesRequest>,
) -> Result<Json<RepresentativeList>, ResolveError> {
    let address = request.address()?;
    let result = state.resolver.resolve(address).await?;
    Ok(Json(RepresentativeList::from(&result)))
}

pub fn representative_routes() -> Router<AppState> {
    Router::new()
        .route("/representatives", post(resolve_representatives))
        .route("/representatives/list", post(list_representatives))
}
