//! Configuration loading
//!
//! Resolution priority for the config file:
//! 1. Command-line argument (highest priority)
//! 2. `REPRESENT_CONFIG` environment variable
//! 3. `<config_dir>/represent/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! A missing file is not an error. Environment overrides for credentials and
//! source selection are applied after the file is read.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const CONFIG_ENV_VAR: &str = "REPRESENT_CONFIG";
pub const CONGRESS_KEY_ENV_VAR: &str = "CONGRESS_API_KEY";
pub const OPENSTATES_KEY_ENV_VAR: &str = "OPENSTATES_API_KEY";
pub const FEDERAL_SOURCE_ENV_VAR: &str = "FEDERAL_SOURCE";
pub const DATASET_PATH_ENV_VAR: &str = "REPRESENT_DATASET_PATH";
pub const LOG_ENV_VAR: &str = "REPRESENT_LOG";

const DEFAULT_USER_AGENT: &str = concat!("represent/", env!("CARGO_PKG_VERSION"));

/// Top-level service configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub geocoder: GeocoderConfig,
    pub federal: FederalConfig,
    pub dataset: DatasetConfig,
    pub state: StateConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when neither REPRESENT_LOG nor RUST_LOG is set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5780".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Timeout applied to every outbound request
    pub request_timeout_secs: u64,
    /// Upper bound on the whole federal branch (primary + fallback chain)
    pub federal_branch_timeout_secs: u64,
    /// Upper bound on the state branch; expiry yields an empty state roster
    pub state_branch_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 15,
            federal_branch_timeout_secs: 45,
            state_branch_timeout_secs: 20,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn federal_branch_timeout(&self) -> Duration {
        Duration::from_secs(self.federal_branch_timeout_secs)
    }

    pub fn state_branch_timeout(&self) -> Duration {
        Duration::from_secs(self.state_branch_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub base_url: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://geocoding.geo.census.gov".to_string(),
        }
    }
}

/// Which federal roster source is consulted first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FederalSource {
    /// Congress.gov member API, falling back to the legislator dataset
    #[default]
    Congress,
    /// Legislator dataset only
    Dataset,
}

impl FromStr for FederalSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "congress" | "primary" => Ok(FederalSource::Congress),
            "dataset" | "fallback" => Ok(FederalSource::Dataset),
            other => Err(Error::Config(format!(
                "unknown federal source '{}' (expected 'congress' or 'dataset')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FederalConfig {
    pub source: FederalSource,
    pub congress_api_key: Option<String>,
    pub congress_base_url: String,
    pub photo_base_url: String,
}

impl Default for FederalConfig {
    fn default() -> Self {
        Self {
            source: FederalSource::Congress,
            congress_api_key: None,
            congress_base_url: "https://api.congress.gov/v3".to_string(),
            photo_base_url: "https://theunitedstates.io/images/congress/225x275".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Network mirrors, tried in order before the bundled file
    pub mirrors: Vec<String>,
    pub bundled_path: PathBuf,
    /// Smallest array accepted as a complete legislator dataset
    pub min_entries: usize,
    /// Total time all network mirrors may take before the bundled file is read
    pub mirror_budget_secs: u64,
}

impl DatasetConfig {
    pub fn mirror_budget(&self) -> Duration {
        Duration::from_secs(self.mirror_budget_secs)
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            mirrors: vec![
                "https://cdn.jsdelivr.net/gh/unitedstates/congress-legislators@main/legislators-current.json".to_string(),
                "https://raw.githubusercontent.com/unitedstates/congress-legislators/main/legislators-current.json".to_string(),
                "https://raw.githubusercontent.com/unitedstates/congress-legislators/master/legislators-current.json".to_string(),
                "https://unitedstates.io/congress-legislators/legislators-current.json".to_string(),
                "https://theunitedstates.io/congress-legislators/legislators-current.json".to_string(),
            ],
            bundled_path: default_bundled_dataset_path(),
            min_entries: 300,
            mirror_budget_secs: 10,
        }
    }
}

/// What the state resolver does when no legislator's district matches the
/// geocoded district for a chamber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateDistrictMatch {
    /// Return nothing for that chamber
    #[default]
    Exact,
    /// Take the first legislator of that chamber regardless of district
    ChamberFallback,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub openstates_api_key: Option<String>,
    pub openstates_base_url: String,
    pub district_match: StateDistrictMatch,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            openstates_api_key: None,
            openstates_base_url: "https://v3.openstates.org".to_string(),
            district_match: StateDistrictMatch::Exact,
        }
    }
}

impl Config {
    /// Load configuration following the documented priority order, then
    /// apply environment overrides.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let mut config = match resolve_config_path(cli_path) {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                debug!("No configuration file found; using compiled defaults");
                Self::default()
            }
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Environment variables take precedence over file values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(key) = env_non_blank(CONGRESS_KEY_ENV_VAR) {
            self.federal.congress_api_key = Some(key);
        }
        if let Some(key) = env_non_blank(OPENSTATES_KEY_ENV_VAR) {
            self.state.openstates_api_key = Some(key);
        }
        if let Some(source) = env_non_blank(FEDERAL_SOURCE_ENV_VAR) {
            self.federal.source = source.parse()?;
        }
        if let Some(path) = env_non_blank(DATASET_PATH_ENV_VAR) {
            self.dataset.bundled_path = PathBuf::from(path);
        }
        if let Some(level) = env_non_blank(LOG_ENV_VAR) {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Worst case before a federal lookup reaches the bundled dataset: both
    /// Congress.gov requests time out, then the mirror budget runs out
    pub fn bundled_dataset_reach(&self) -> Duration {
        self.http.request_timeout() * 2 + self.dataset.mirror_budget()
    }

    /// Congress.gov key, if one is configured and non-blank
    pub fn congress_api_key(&self) -> Option<&str> {
        valid_key(self.federal.congress_api_key.as_deref())
    }

    /// OpenStates key, if one is configured and non-blank
    pub fn openstates_api_key(&self) -> Option<&str> {
        valid_key(self.state.openstates_api_key.as_deref())
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn valid_key(key: Option<&str>) -> Option<&str> {
    key.map(str::trim).filter(|k| is_valid_key(k))
}

fn env_non_blank(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Locate the configuration file, if any
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument (used even if missing so the read error surfaces)
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Some(path) = env_non_blank(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    // Priority 3: User config directory
    let user_config = dirs::config_dir().map(|d| d.join("represent").join("config.toml"));
    match user_config {
        Some(path) if path.exists() => Some(path),
        Some(path) => {
            debug!("Config file not present at {}", path.display());
            None
        }
        None => {
            warn!("Could not determine config directory");
            None
        }
    }
}

/// Default location of the bundled legislator dataset
fn default_bundled_dataset_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("represent").join("legislators-current.json"))
        .unwrap_or_else(|| PathBuf::from("./data/legislators-current.json"))
}
