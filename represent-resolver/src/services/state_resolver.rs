//! OpenStates state legislator lookup
//!
//! Point query (`people.geo`) for the legislators whose districts contain
//! the geocoded coordinates, reduced to at most one upper and one lower
//! chamber member.

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::models::{Chamber, GeoLocation, Office, Official, Roster};
use crate::normalize::{de_opt_loose_string, same_district};
use crate::services::congress_client::record_keys;
use crate::services::{ensure_success, join_url};
use represent_common::config::{StateConfig, StateDistrictMatch};
use represent_common::Config;

const PEOPLE_GEO_PATH: &str = "people.geo";
const API_KEY_HEADER: &str = "X-API-Key";

/// Jurisdiction classification of federal members, who are not state legislators
const FEDERAL_JURISDICTION: &str = "country";

#[derive(Debug, Deserialize)]
struct PeopleGeoResponse {
    #[serde(default)]
    results: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Jurisdiction {
    pub id: Option<String>,
    pub classification: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenStatesRole {
    pub chamber: Option<String>,
    pub org_classification: Option<String>,
    #[serde(default, deserialize_with = "de_opt_loose_string")]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "de_opt_loose_string")]
    pub label: Option<String>,
    pub jurisdiction: Option<Jurisdiction>,
}

impl OpenStatesRole {
    pub fn chamber(&self) -> Option<Chamber> {
        self.chamber
            .as_deref()
            .and_then(Chamber::from_classification)
            .or_else(|| {
                self.org_classification
                    .as_deref()
                    .and_then(Chamber::from_classification)
            })
    }

    pub fn district(&self) -> Option<&str> {
        self.district
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .or(self.label.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartyAffiliation {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactOffice {
    pub voice: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Link {
    pub url: Option<String>,
}

/// One `people.geo` result; every field tolerates absence
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenStatesPerson {
    pub id: Option<String>,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub party: Option<String>,
    pub current_party: Option<String>,
    pub current_party_affiliations: Option<Vec<PartyAffiliation>>,
    pub offices: Option<Vec<ContactOffice>>,
    pub links: Option<Vec<Link>>,
    pub image: Option<String>,
    pub jurisdiction: Option<Jurisdiction>,
    pub current_role: Option<OpenStatesRole>,
    #[serde(rename = "currentRole")]
    pub current_role_camel: Option<OpenStatesRole>,
    pub current_roles: Option<Vec<OpenStatesRole>>,
}

impl OpenStatesPerson {
    /// Lenient parse; records that fail are skipped and their keys logged
    pub fn parse_all(raw: &[Value]) -> Vec<OpenStatesPerson> {
        raw.iter()
            .filter_map(|value| match serde_json::from_value(value.clone()) {
                Ok(person) => Some(person),
                Err(e) => {
                    warn!(error = %e, keys = ?record_keys(value), "Skipping unparseable OpenStates record");
                    None
                }
            })
            .collect()
    }

    pub fn role(&self) -> Option<&OpenStatesRole> {
        self.current_role
            .as_ref()
            .or(self.current_role_camel.as_ref())
            .or_else(|| self.current_roles.as_ref().and_then(|roles| roles.first()))
    }

    pub fn is_federal(&self) -> bool {
        let person_level = self.jurisdiction.as_ref();
        let role_level = self.role().and_then(|r| r.jurisdiction.as_ref());
        [person_level, role_level]
            .into_iter()
            .flatten()
            .filter_map(|j| j.classification.as_deref())
            .any(|c| c.eq_ignore_ascii_case(FEDERAL_JURISDICTION))
    }

    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!(
                "{} {}",
                self.given_name.as_deref().unwrap_or_default(),
                self.family_name.as_deref().unwrap_or_default()
            )
            .trim()
            .to_string(),
        }
    }

    pub fn party(&self) -> Option<String> {
        self.party
            .clone()
            .or_else(|| self.current_party.clone())
            .or_else(|| {
                self.current_party_affiliations
                    .as_ref()
                    .and_then(|a| a.first())
                    .and_then(|a| a.name.clone())
            })
    }

    pub fn to_official(&self) -> Official {
        let phone = self
            .offices
            .as_ref()
            .and_then(|o| o.first())
            .and_then(|o| o.voice.clone());
        let url = self
            .links
            .as_ref()
            .and_then(|l| l.first())
            .and_then(|l| l.url.clone());
        Official {
            name: self.display_name(),
            party: self.party(),
            phones: phone.into_iter().collect(),
            urls: url.into_iter().collect(),
            photo_url: self.image.clone().filter(|s| !s.is_empty()),
        }
    }
}

/// A person with a usable current role
#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    person: &'a OpenStatesPerson,
    chamber: Chamber,
    district: Option<&'a str>,
}

fn candidates(people: &[OpenStatesPerson]) -> Vec<Candidate<'_>> {
    people
        .iter()
        .filter(|p| !p.is_federal())
        .filter_map(|person| {
            let role = person.role()?;
            Some(Candidate {
                person,
                chamber: role.chamber()?,
                district: role.district(),
            })
        })
        .collect()
}

fn pick<'a>(
    candidates: &[Candidate<'a>],
    chamber: Chamber,
    target: Option<&str>,
    policy: StateDistrictMatch,
) -> Option<Candidate<'a>> {
    let mut in_chamber = candidates.iter().filter(|c| c.chamber == chamber);
    let Some(target) = target.filter(|t| !t.trim().is_empty()) else {
        return in_chamber.next().copied();
    };

    let exact = candidates.iter().find(|c| {
        c.chamber == chamber && c.district.map(|d| same_district(d, target)).unwrap_or(false)
    });
    match (exact, policy) {
        (Some(found), _) => Some(*found),
        (None, StateDistrictMatch::Exact) => None,
        (None, StateDistrictMatch::ChamberFallback) => in_chamber.next().copied(),
    }
}

/// Reduce `people.geo` results to one upper and one lower chamber legislator
pub fn select_state_legislators(
    people: &[OpenStatesPerson],
    upper_district: Option<&str>,
    lower_district: Option<&str>,
    policy: StateDistrictMatch,
) -> Roster {
    let candidates = candidates(people);
    let upper = pick(&candidates, Chamber::Upper, upper_district, policy);
    let lower = pick(&candidates, Chamber::Lower, lower_district, policy);

    info!(
        total_people = people.len(),
        state_candidates = candidates.len(),
        upper_picked = upper.is_some(),
        lower_picked = lower.is_some(),
        upper_target = ?upper_district,
        lower_target = ?lower_district,
        upper_name = ?upper.map(|c| c.person.display_name()),
        lower_name = ?lower.map(|c| c.person.display_name()),
        "State selection"
    );
    if upper.is_none() || lower.is_none() {
        debug!(
            candidate_sample = ?candidates
                .iter()
                .take(10)
                .map(|c| (c.person.display_name(), c.chamber, c.district))
                .collect::<Vec<_>>(),
            "State candidates"
        );
    }

    let mut roster = Roster::empty();
    for candidate in [upper, lower].into_iter().flatten() {
        roster.push(candidate.person.to_official(), |index| {
            Office::state_legislator(candidate.chamber, index)
        });
    }
    roster
}

/// OpenStates-backed resolver for state legislators
pub struct StateResolver {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
    district_match: StateDistrictMatch,
}

impl StateResolver {
    pub fn new(
        http_client: Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        district_match: StateDistrictMatch,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            api_key,
            district_match,
        }
    }

    pub fn from_config(http_client: &Client, config: &Config) -> Self {
        let StateConfig {
            openstates_base_url,
            district_match,
            ..
        } = &config.state;
        Self::new(
            http_client.clone(),
            openstates_base_url.clone(),
            config.openstates_api_key().map(str::to_string),
            *district_match,
        )
    }

    /// State legislators for a geocoded location. Without a credential the
    /// roster is empty and no request is made.
    pub async fn resolve(&self, location: &GeoLocation) -> Result<Roster, SourceError> {
        let Some(api_key) = self.api_key.as_deref() else {
            info!("OPENSTATES_API_KEY not set; skipping state representatives");
            return Ok(Roster::empty());
        };

        let raw = self.fetch_people(location.lat, location.lng, api_key).await?;
        let people = OpenStatesPerson::parse_all(&raw);
        Ok(select_state_legislators(
            &people,
            location.upper_state_district.as_deref(),
            location.lower_state_district.as_deref(),
            self.district_match,
        ))
    }

    async fn fetch_people(&self, lat: f64, lng: f64, api_key: &str) -> Result<Vec<Value>, SourceError> {
        let url = join_url(&self.base_url, PEOPLE_GEO_PATH);
        debug!(url = %url, lat, lng, "Querying OpenStates");

        let response = self
            .http_client
            .get(&url)
            .header(API_KEY_HEADER, api_key)
            .query(&[("lat", lat.to_string()), ("lng", lng.to_string())])
            .send()
            .await?;
        let response = ensure_success(response).await.map_err(|e| {
            warn!(url = %url, error = %e, "OpenStates request failed");
            e
        })?;

        let body: PeopleGeoResponse = response.json().await?;
        Ok(body.results.unwrap_or_default())
    }
}
