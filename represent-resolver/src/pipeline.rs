//! Address → representatives pipeline
//!
//! Geocoding is the only terminal step. The federal and state branches run
//! concurrently once a location is known; a branch that fails or exceeds its
//! deadline contributes an empty roster instead of failing the request.

use std::time::{Duration, Instant};

use tokio::time::timeout;
use tracing::{info, warn};

use crate::error::ResolveError;
use crate::models::{GeoLocation, ResolutionResult, Roster};
use crate::services::{build_http_client, merge, FederalResolver, Geocoder, StateResolver};
use represent_common::config::FederalSource;
use represent_common::Config;

pub struct Resolver {
    geocoder: Geocoder,
    federal: FederalResolver,
    state: StateResolver,
    federal_timeout: Duration,
    state_timeout: Duration,
}

impl Resolver {
    pub fn new(
        geocoder: Geocoder,
        federal: FederalResolver,
        state: StateResolver,
        federal_timeout: Duration,
        state_timeout: Duration,
    ) -> Self {
        Self {
            geocoder,
            federal,
            state,
            federal_timeout,
            state_timeout,
        }
    }

    /// Wire every source from configuration, sharing one HTTP client
    pub fn from_config(config: &Config) -> Result<Self, ResolveError> {
        let http_client =
            build_http_client(&config.http).map_err(|e| ResolveError::Internal(e.to_string()))?;

        info!(
            federal_source = ?config.federal.source,
            congress_key = config.congress_api_key().is_some(),
            openstates_key = config.openstates_api_key().is_some(),
            district_match = ?config.state.district_match,
            "Resolver configured"
        );

        if config.federal.source == FederalSource::Congress
            && config.bundled_dataset_reach() >= config.http.federal_branch_timeout()
        {
            warn!(
                reach_secs = config.bundled_dataset_reach().as_secs(),
                federal_branch_timeout_secs = config.http.federal_branch_timeout_secs,
                "Federal branch deadline expires before the bundled dataset can be read"
            );
        }

        Ok(Self::new(
            Geocoder::new(http_client.clone(), config.geocoder.base_url.clone()),
            FederalResolver::from_config(&http_client, config),
            StateResolver::from_config(&http_client, config),
            config.http.federal_branch_timeout(),
            config.http.state_branch_timeout(),
        ))
    }

    /// True once the fallback legislator dataset is cached in memory
    pub fn dataset_loaded(&self) -> bool {
        self.federal.dataset().is_loaded()
    }

    /// Resolve an address to its federal and state legislators
    ///
    /// # Errors
    /// - `InvalidInput` for a missing or too-short address
    /// - `FailedPrecondition` when the address cannot be geocoded to a state
    pub async fn resolve(&self, address: &str) -> Result<ResolutionResult, ResolveError> {
        let started = Instant::now();

        let location = self.geocoder.geocode(address).await.map_err(|e| {
            warn!(error = %e, "Geocoding failed");
            ResolveError::from(e)
        })?;

        let (federal, state) =
            tokio::join!(self.federal_branch(&location), self.state_branch(&location));

        info!(
            federal = federal.len(),
            state = state.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Resolution complete"
        );

        Ok(merge(federal, state, location.matched_address.clone()))
    }

    async fn federal_branch(&self, location: &GeoLocation) -> Roster {
        let branch = self
            .federal
            .resolve(&location.state, location.congressional_district.as_deref());
        match timeout(self.federal_timeout, branch).await {
            Ok(roster) => roster,
            Err(_) => {
                warn!(
                    timeout_secs = self.federal_timeout.as_secs(),
                    "Federal branch timed out"
                );
                Roster::empty()
            }
        }
    }

    async fn state_branch(&self, location: &GeoLocation) -> Roster {
        match timeout(self.state_timeout, self.state.resolve(location)).await {
            Ok(Ok(roster)) => roster,
            Ok(Err(e)) => {
                warn!(error = %e, "OpenStates fetch failed");
                Roster::empty()
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.state_timeout.as_secs(),
                    "State branch timed out"
                );
                Roster::empty()
            }
        }
    }
}
