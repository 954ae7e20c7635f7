//! # Represent Common Library
//!
//! Shared code for the representative resolution service:
//! - Error and result types
//! - Configuration loading (TOML file + environment overrides)
//! - Tracing initialization

pub mod config;
pub mod error;
pub mod logging;

pub use config::Config;
pub use error::{Error, Result};
