//! Legislator dataset (federal fallback source)
//!
//! A flat JSON array of people, each carrying a `roles[]` list. The dataset
//! is obtained from an ordered chain of providers: several network mirrors,
//! then a locally bundled copy. The first provider that returns a large
//! enough array wins.
//!
//! The loaded dataset is process-scoped: `LegislatorDataset` runs the load in
//! a spawned task behind a shared handle, so concurrent first callers share a
//! single attempt and a caller's timeout never cancels it. After that it is
//! read-only and shared via `Arc`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::models::{Chamber, Office, Official, Roster};
use crate::normalize::{de_opt_loose_string, normalize_state_to_code, same_district};
use crate::services::congress_client::record_keys;
use crate::services::ensure_success;
use crate::services::federal_resolver::{photo_url, MAX_REPRESENTATIVES, MAX_SENATORS};
use represent_common::config::DatasetConfig;

// ============================================================================
// Dataset schema
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonIds {
    pub bioguide: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonName {
    pub official_full: Option<String>,
    pub first: Option<String>,
    pub last: Option<String>,
}

/// One role (or term) held by a person
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetRole {
    #[serde(rename = "type")]
    pub role_type: Option<String>,
    #[serde(default, deserialize_with = "de_opt_loose_string")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "de_opt_loose_string")]
    pub district: Option<String>,
    pub party: Option<String>,
    pub phone: Option<String>,
    pub url: Option<String>,
}

impl DatasetRole {
    /// Accepts both the `senator`/`representative` spelling and the
    /// upstream `sen`/`rep` term abbreviations
    pub fn chamber(&self) -> Option<Chamber> {
        match self.role_type.as_deref()?.trim().to_ascii_lowercase().as_str() {
            "senator" | "sen" => Some(Chamber::Upper),
            "representative" | "rep" => Some(Chamber::Lower),
            _ => None,
        }
    }

    fn state_code(&self) -> Option<&'static str> {
        self.state.as_deref().and_then(normalize_state_to_code)
    }
}

/// One person in the dataset
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetPerson {
    #[serde(default)]
    pub id: PersonIds,
    #[serde(default)]
    pub name: PersonName,
    /// Upstream mirrors name this list `terms`
    #[serde(default, alias = "terms")]
    pub roles: Vec<Option<DatasetRole>>,
}

impl DatasetPerson {
    /// The role the person currently holds: the last one with a known chamber
    pub fn current_role(&self) -> Option<&DatasetRole> {
        self.roles
            .iter()
            .rev()
            .flatten()
            .find(|role| role.chamber().is_some())
    }

    pub fn display_name(&self) -> String {
        match self.name.official_full.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            Some(full) => full.to_string(),
            None => format!(
                "{} {}",
                self.name.first.as_deref().unwrap_or_default(),
                self.name.last.as_deref().unwrap_or_default()
            )
            .trim()
            .to_string(),
        }
    }

    fn stable_id(&self) -> String {
        self.id
            .bioguide
            .clone()
            .unwrap_or_else(|| self.display_name())
    }

    fn to_official(&self, role: &DatasetRole, photo_base_url: &str) -> Official {
        Official {
            name: self.display_name(),
            party: role.party.clone(),
            phones: role.phone.iter().cloned().collect(),
            urls: role.url.iter().cloned().collect(),
            photo_url: self
                .id
                .bioguide
                .as_deref()
                .map(|id| photo_url(photo_base_url, id)),
        }
    }
}

/// Select the state's senators and, when a district is given, its
/// representative from the dataset
pub fn select_federal(
    people: &[DatasetPerson],
    state: &str,
    congressional_district: Option<&str>,
    photo_base_url: &str,
) -> Roster {
    let mut roster = Roster::empty();
    let mut seen: Vec<String> = Vec::new();

    for person in people {
        if seen.len() >= MAX_SENATORS {
            break;
        }
        let Some(role) = person.current_role() else {
            continue;
        };
        if role.chamber() != Some(Chamber::Upper) || role.state_code() != Some(state) {
            continue;
        }
        let id = person.stable_id();
        if seen.contains(&id) {
            continue;
        }
        seen.push(id);
        roster.push(person.to_official(role, photo_base_url), |index| {
            Office::us_senator(state, index)
        });
    }

    if let Some(district) = congressional_district {
        let representatives = people
            .iter()
            .filter_map(|person| person.current_role().map(|role| (person, role)))
            .filter(|(_, role)| {
                role.chamber() == Some(Chamber::Lower)
                    && role.state_code() == Some(state)
                    && role
                        .district
                        .as_deref()
                        .map(|d| same_district(d, district))
                        .unwrap_or(false)
            })
            .take(MAX_REPRESENTATIVES);

        for (person, role) in representatives {
            roster.push(person.to_official(role, photo_base_url), |index| {
                Office::us_representative(state, Some(district), index)
            });
        }
    }

    debug!(
        state = %state,
        district = ?congressional_district,
        selected = roster.len(),
        names = ?roster.officials.iter().map(|o| o.name.as_str()).collect::<Vec<_>>(),
        "Fallback federal selection"
    );

    roster
}

// ============================================================================
// Providers
// ============================================================================

/// One place the dataset can be obtained from
#[async_trait]
pub trait DatasetProvider: Send + Sync {
    /// Provider identity for logs (URL or file path)
    fn describe(&self) -> String;

    /// Local providers are exempt from the chain's remote budget
    fn is_local(&self) -> bool {
        false
    }

    /// Fetch the raw dataset array
    async fn fetch(&self) -> Result<Vec<Value>, SourceError>;
}

/// Network mirror of the dataset
pub struct MirrorProvider {
    http_client: Client,
    url: String,
}

impl MirrorProvider {
    pub fn new(http_client: Client, url: impl Into<String>) -> Self {
        Self {
            http_client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl DatasetProvider for MirrorProvider {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<Vec<Value>, SourceError> {
        let response = self.http_client.get(&self.url).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }
}

/// Locally bundled copy, the last resort
pub struct BundledFileProvider {
    path: PathBuf,
}

impl BundledFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DatasetProvider for BundledFileProvider {
    fn describe(&self) -> String {
        format!("file://{}", self.path.display())
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn fetch(&self) -> Result<Vec<Value>, SourceError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::Network(format!("{}: {}", self.path.display(), e)))?;
        serde_json::from_str(&raw).map_err(|e| SourceError::Parse(e.to_string()))
    }
}

/// Ordered providers, tried until one yields a plausible dataset
pub struct ProviderChain {
    providers: Vec<Arc<dyn DatasetProvider>>,
    min_entries: usize,
    remote_budget: Option<Duration>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn DatasetProvider>>, min_entries: usize) -> Self {
        Self {
            providers,
            min_entries,
            remote_budget: None,
        }
    }

    /// Cap the total time spent on non-local providers in one walk
    pub fn with_remote_budget(mut self, budget: Duration) -> Self {
        self.remote_budget = Some(budget);
        self
    }

    /// Network mirrors only (used when refreshing the bundled copy)
    pub fn mirrors(http_client: &Client, config: &DatasetConfig) -> Self {
        let providers = config
            .mirrors
            .iter()
            .map(|url| Arc::new(MirrorProvider::new(http_client.clone(), url)) as Arc<dyn DatasetProvider>)
            .collect();
        Self::new(providers, config.min_entries)
    }

    /// Mirrors followed by the bundled file, mirrors sharing one budget
    pub fn from_config(http_client: &Client, config: &DatasetConfig) -> Self {
        let mut chain =
            Self::mirrors(http_client, config).with_remote_budget(config.mirror_budget());
        chain
            .providers
            .push(Arc::new(BundledFileProvider::new(config.bundled_path.clone())));
        chain
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// First provider result with at least `min_entries` records
    ///
    /// Returns the provider description alongside the raw records. Once the
    /// remote budget is spent, remaining network providers are skipped and
    /// only local ones are tried.
    pub async fn first_valid(&self) -> Result<(String, Vec<Value>), SourceError> {
        let deadline = self.remote_budget.map(|budget| Instant::now() + budget);

        for provider in &self.providers {
            let source = provider.describe();
            let fetched = match deadline.filter(|_| !provider.is_local()) {
                None => provider.fetch().await,
                Some(deadline) if Instant::now() >= deadline => {
                    debug!(source = %source, "Mirror budget spent; skipping provider");
                    continue;
                }
                Some(deadline) => match tokio::time::timeout_at(deadline, provider.fetch()).await {
                    Ok(fetched) => fetched,
                    Err(_) => {
                        warn!(source = %source, "Legislator dataset provider ran out of mirror budget");
                        continue;
                    }
                },
            };

            match fetched {
                Ok(records) if records.len() >= self.min_entries => {
                    info!(source = %source, count = records.len(), "Legislator dataset loaded");
                    return Ok((source, records));
                }
                Ok(records) => {
                    warn!(
                        source = %source,
                        count = records.len(),
                        min_entries = self.min_entries,
                        sample_keys = ?records.first().map(record_keys),
                        "Legislator dataset too small; trying next provider"
                    );
                }
                Err(e) => {
                    warn!(source = %source, error = %e, "Legislator dataset provider failed");
                }
            }
        }

        Err(SourceError::Insufficient(format!(
            "no legislator dataset provider succeeded ({} tried)",
            self.providers.len()
        )))
    }

    async fn load_people(&self) -> Result<Vec<DatasetPerson>, SourceError> {
        let (source, records) = self.first_valid().await?;

        let total = records.len();
        let people: Vec<DatasetPerson> = records
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<DatasetPerson>(record) {
                Ok(person) => Some(person),
                Err(e) => {
                    debug!(source = %source, error = %e, "Skipping malformed dataset entry");
                    None
                }
            })
            .collect();

        if people.len() < total {
            warn!(
                source = %source,
                skipped = total - people.len(),
                "Dataset contained malformed entries"
            );
        }

        Ok(people)
    }
}

// ============================================================================
// Load-once cache
// ============================================================================

type SharedLoad = Shared<BoxFuture<'static, Result<Arc<Vec<DatasetPerson>>, SourceError>>>;

/// Process-scoped, load-once legislator dataset
pub struct LegislatorDataset {
    chain: Arc<ProviderChain>,
    people: Arc<OnceCell<Arc<Vec<DatasetPerson>>>>,
    in_flight: Mutex<Option<SharedLoad>>,
    load_attempts: Arc<AtomicUsize>,
}

impl LegislatorDataset {
    pub fn new(chain: ProviderChain) -> Self {
        Self {
            chain: Arc::new(chain),
            people: Arc::new(OnceCell::new()),
            in_flight: Mutex::new(None),
            load_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The dataset, loading it on first use.
    ///
    /// The load runs in its own task: a caller that gives up (timeout,
    /// dropped request) does not cancel it, and concurrent callers await the
    /// same attempt. A failed load is not cached; the next caller walks the
    /// provider chain again.
    pub async fn people(&self) -> Result<Arc<Vec<DatasetPerson>>, SourceError> {
        if let Some(people) = self.people.get() {
            return Ok(Arc::clone(people));
        }
        self.current_load().await
    }

    pub fn is_loaded(&self) -> bool {
        self.people.initialized()
    }

    /// Number of times the provider chain has been walked
    pub fn load_attempts(&self) -> usize {
        self.load_attempts.load(Ordering::SeqCst)
    }

    /// The in-flight load, or a new one if there is none or the last failed
    fn current_load(&self) -> SharedLoad {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(load) = in_flight.as_ref() {
            if !matches!(load.peek(), Some(Err(_))) {
                return load.clone();
            }
        }

        let load = self.spawn_load();
        *in_flight = Some(load.clone());
        load
    }

    fn spawn_load(&self) -> SharedLoad {
        let chain = Arc::clone(&self.chain);
        let cell = Arc::clone(&self.people);
        let attempts = Arc::clone(&self.load_attempts);

        let task = tokio::spawn(async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            let people = Arc::new(chain.load_people().await?);
            // Only this task sets the cell; a concurrent set cannot happen
            let _ = cell.set(Arc::clone(&people));
            Ok::<_, SourceError>(people)
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(SourceError::Task(e.to_string())),
            }
        }
        .boxed()
        .shared()
    }
}
