//! HTTP API handlers
//!
//! - `POST /representatives` - full resolution result
//! - `POST /representatives/list` - flattened legislator list
//! - `GET /health` - liveness and dataset cache status

pub mod health;
pub mod representatives;

pub use health::health_routes;
pub use representatives::representative_routes;
