//! Upstream source clients and the resolvers built on them
//!
//! - **geocoder** - Census address → districts
//! - **congress_client** - Congress.gov member roster (primary federal source)
//! - **legislator_dataset** - mirrored/bundled legislator dataset (federal fallback)
//! - **federal_resolver** - primary-then-fallback federal selection
//! - **state_resolver** - OpenStates point lookup for state legislators
//! - **merger** - index-consistent concatenation of branch rosters

pub mod congress_client;
pub mod federal_resolver;
pub mod geocoder;
pub mod legislator_dataset;
pub mod merger;
pub mod state_resolver;

pub use federal_resolver::FederalResolver;
pub use geocoder::Geocoder;
pub use legislator_dataset::LegislatorDataset;
pub use merger::merge;
pub use state_resolver::StateResolver;

use crate::error::SourceError;
use represent_common::config::HttpConfig;
use reqwest::{header, Client, Response};

/// Build the HTTP client shared by every source
pub fn build_http_client(http: &HttpConfig) -> Result<Client, SourceError> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );

    Client::builder()
        .user_agent(http.user_agent.clone())
        .timeout(http.request_timeout())
        .default_headers(headers)
        .build()
        .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a non-success response into `SourceError::Api` with a body sample
pub(crate) async fn ensure_success(response: Response) -> Result<Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SourceError::api(status.as_u16(), &body))
}

/// Trim a base URL so paths can be appended with a single slash
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
