//! Federal legislator resolution
//!
//! Primary source: Congress.gov member API. Fallback: the legislator dataset
//! chain. The fallback is used when the primary errors, has no credential,
//! or returns fewer officials than a complete answer (two senators plus one
//! representative). `federal.source = "dataset"` skips the primary.

use std::collections::HashSet;
use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::SourceError;
use crate::models::{Chamber, Office, Roster};
use crate::normalize::same_district;
use crate::services::congress_client::{record_keys, CongressClient, CongressMember};
use crate::services::legislator_dataset::{select_federal, LegislatorDataset, ProviderChain};
use represent_common::config::FederalSource;
use represent_common::Config;

pub const MAX_SENATORS: usize = 2;
pub const MAX_REPRESENTATIVES: usize = 1;

/// Officials in a complete federal answer
pub const SUFFICIENT_FEDERAL_COUNT: usize = 3;

/// Photo asset URL for a Bioguide ID
pub fn photo_url(photo_base_url: &str, bioguide_id: &str) -> String {
    format!("{}/{}.jpg", photo_base_url.trim_end_matches('/'), bioguide_id)
}

/// Current senators for `state`, deduplicated by stable id, at most two
pub fn select_senators<'a>(members: &'a [CongressMember], state: &str) -> Vec<&'a CongressMember> {
    let mut seen = HashSet::new();
    members
        .iter()
        .filter(|m| m.state_for(Chamber::Upper) == Some(state))
        .filter(|m| match m.stable_id() {
            Some(id) => seen.insert(id.to_string()),
            None => true,
        })
        .take(MAX_SENATORS)
        .collect()
}

/// The representative for `state`/`district`; districts compare zero-insensitively
pub fn select_representative<'a>(
    members: &'a [CongressMember],
    state: &str,
    district: &str,
) -> Option<&'a CongressMember> {
    members.iter().find(|m| {
        m.state_for(Chamber::Lower) == Some(state)
            && m.district_for(Chamber::Lower)
                .map(|d| same_district(d, district))
                .unwrap_or(false)
    })
}

/// Federal resolver with primary/fallback chain
pub struct FederalResolver {
    source: FederalSource,
    congress: Option<CongressClient>,
    dataset: Arc<LegislatorDataset>,
    photo_base_url: String,
}

impl FederalResolver {
    pub fn new(
        source: FederalSource,
        congress: Option<CongressClient>,
        dataset: Arc<LegislatorDataset>,
        photo_base_url: impl Into<String>,
    ) -> Self {
        Self {
            source,
            congress,
            dataset,
            photo_base_url: photo_base_url.into(),
        }
    }

    pub fn from_config(http_client: &Client, config: &Config) -> Self {
        let congress = config.congress_api_key().map(|key| {
            CongressClient::new(http_client.clone(), config.federal.congress_base_url.clone(), key)
        });
        let dataset = Arc::new(LegislatorDataset::new(ProviderChain::from_config(
            http_client,
            &config.dataset,
        )));
        Self::new(
            config.federal.source,
            congress,
            dataset,
            config.federal.photo_base_url.clone(),
        )
    }

    pub fn dataset(&self) -> &LegislatorDataset {
        &self.dataset
    }

    /// Senators and representative for a location. Never fails: when every
    /// source fails the roster is empty.
    pub async fn resolve(&self, state: &str, district: Option<&str>) -> Roster {
        info!(source = ?self.source, "Selected federal source");

        let mut partial = Roster::empty();
        match self.source {
            FederalSource::Dataset => info!("Using fallback federal dataset"),
            FederalSource::Congress => match self.resolve_primary(state, district).await {
                Ok(roster) if roster.len() >= SUFFICIENT_FEDERAL_COUNT => return roster,
                Ok(roster) => {
                    warn!(
                        got = roster.len(),
                        "Congress.gov returned insufficient federal members, switching to fallback"
                    );
                    partial = roster;
                }
                Err(e) => warn!(error = %e, "Congress.gov fetch failed; using fallback"),
            },
        }

        match self.resolve_fallback(state, district).await {
            Ok(roster) if partial.is_empty() || roster.len() > partial.len() => roster,
            Ok(roster) => {
                warn!(
                    fallback = roster.len(),
                    kept = partial.len(),
                    "Fallback has no more federal members than Congress.gov; keeping primary answer"
                );
                partial
            }
            Err(e) => {
                warn!(
                    error = %e,
                    kept = partial.len(),
                    "Fallback federal fetch failed"
                );
                partial
            }
        }
    }

    /// Query Congress.gov for senators and (with a district) the representative
    pub async fn resolve_primary(
        &self,
        state: &str,
        district: Option<&str>,
    ) -> Result<Roster, SourceError> {
        let client = self
            .congress
            .as_ref()
            .ok_or(SourceError::MissingCredential("Congress.gov"))?;

        let raw_senators = client.fetch_members(state, Chamber::Upper, None).await?;
        let senate_members = CongressMember::parse_all(&raw_senators);
        let senators = select_senators(&senate_members, state);
        if senators.is_empty() {
            log_empty_filter(&raw_senators, &senate_members, Chamber::Upper, state, None);
        }
        info!(
            fetched = raw_senators.len(),
            filtered = senators.len(),
            state = %state,
            "Senators filtered"
        );

        let mut roster = Roster::empty();
        let mut seen: HashSet<&str> = HashSet::new();
        for senator in senators {
            if let Some(id) = senator.stable_id() {
                seen.insert(id);
            }
            roster.push(senator.to_official(&self.photo_base_url), |index| {
                Office::us_senator(state, index)
            });
        }

        if let Some(district) = district {
            match client.fetch_members(state, Chamber::Lower, Some(district)).await {
                Ok(raw_reps) => {
                    let house_members = CongressMember::parse_all(&raw_reps);
                    let representative = select_representative(&house_members, state, district);
                    match representative {
                        Some(rep) if rep.stable_id().map(|id| seen.contains(id)).unwrap_or(false) => {
                            warn!(id = ?rep.stable_id(), "Representative already listed as senator; skipping");
                        }
                        Some(rep) => {
                            roster.push(rep.to_official(&self.photo_base_url), |index| {
                                Office::us_representative(state, Some(district), index)
                            });
                        }
                        None => {
                            log_empty_filter(&raw_reps, &house_members, Chamber::Lower, state, Some(district));
                        }
                    }
                    info!(
                        fetched = raw_reps.len(),
                        filtered = usize::from(representative.is_some()),
                        state = %state,
                        district = %district,
                        "House filtered"
                    );
                }
                Err(e) => warn!(error = %e, "Congress.gov House fetch failed; keeping senators"),
            }
        }

        Ok(roster)
    }

    /// Select from the legislator dataset, loading it on first use
    pub async fn resolve_fallback(
        &self,
        state: &str,
        district: Option<&str>,
    ) -> Result<Roster, SourceError> {
        let people = self.dataset.people().await?;
        Ok(select_federal(&people, state, district, &self.photo_base_url))
    }
}

/// Diagnose schema drift when filtering discards everything
fn log_empty_filter(
    raw: &[Value],
    members: &[CongressMember],
    chamber: Chamber,
    state: &str,
    district: Option<&str>,
) {
    warn!(
        chamber = ?chamber,
        expected_state = %state,
        expected_district = ?district,
        sample_keys = ?raw.first().map(record_keys),
        normalized_states = ?members.iter().filter_map(|m| m.state_for(chamber)).collect::<Vec<_>>(),
        districts = ?members.iter().map(|m| m.district_for(chamber)).collect::<Vec<_>>(),
        "Congress.gov filtering produced 0 results"
    );
}
