//! Census geocoder client
//!
//! Resolves a one-line address to coordinates, state, and the congressional
//! and state-legislative districts containing it.
//!
//! The Census service renames its geography layers every vintage
//! ("118th Congressional Districts" → "119th Congressional Districts",
//! "2022 State Legislative Districts - Upper" → "2024 ..."), so layers are
//! located by case-insensitive substring rather than by exact key.

use std::collections::BTreeMap;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{GeocodeError, SourceError};
use crate::models::GeoLocation;
use crate::normalize::{loose_string, pad_district, pad_fips, state_for_fips};
use crate::services::{ensure_success, join_url};

const GEOGRAPHIES_PATH: &str = "geocoder/geographies/onelineaddress";
const BENCHMARK: &str = "Public_AR_Current";
const VINTAGE: &str = "Current_Current";

/// Shortest address accepted before any network call
pub const MIN_ADDRESS_LEN: usize = 5;

type GeoRecord = BTreeMap<String, Value>;

#[derive(Debug, Deserialize)]
struct CensusResponse {
    result: Option<CensusResult>,
}

#[derive(Debug, Deserialize)]
struct CensusResult {
    #[serde(default, rename = "addressMatches")]
    address_matches: Vec<AddressMatch>,
}

#[derive(Debug, Deserialize)]
struct AddressMatch {
    #[serde(rename = "matchedAddress")]
    matched_address: Option<String>,
    coordinates: Option<Coordinates>,
    #[serde(default)]
    geographies: BTreeMap<String, Vec<GeoRecord>>,
}

#[derive(Debug, Deserialize)]
struct Coordinates {
    x: Option<f64>,
    y: Option<f64>,
}

/// Geography layer families the resolver cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeographyLayer {
    Congressional,
    StateUpper,
    StateLower,
    States,
}

impl GeographyLayer {
    /// Each inner slice is a set of substrings that must all appear in the key
    fn key_patterns(self) -> &'static [&'static [&'static str]] {
        match self {
            GeographyLayer::Congressional => &[&["congressional districts"]],
            GeographyLayer::StateUpper => &[&["state legislative districts", "upper"], &["sldu"]],
            GeographyLayer::StateLower => &[&["state legislative districts", "lower"], &["sldl"]],
            GeographyLayer::States => &[&["states"]],
        }
    }

    pub fn matches_key(self, key: &str) -> bool {
        let key = key.to_ascii_lowercase();
        self.key_patterns()
            .iter()
            .any(|needles| needles.iter().all(|needle| key.contains(needle)))
    }
}

/// First record of the first layer (in key order) belonging to `layer`
fn find_layer<'a>(
    geographies: &'a BTreeMap<String, Vec<GeoRecord>>,
    layer: GeographyLayer,
) -> Option<&'a GeoRecord> {
    geographies
        .iter()
        .find(|(key, _)| layer.matches_key(key))
        .and_then(|(_, records)| records.first())
}

fn field(record: &GeoRecord, name: &str) -> Option<String> {
    record.get(name).and_then(loose_string)
}

/// Vintage-specific district fields such as `CD119`
fn is_cd_vintage_field(name: &str) -> bool {
    name.strip_prefix("CD")
        .map(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

fn congressional_district(record: &GeoRecord) -> Option<String> {
    let vintage_fields = record
        .iter()
        .filter(|(name, _)| is_cd_vintage_field(name))
        .map(|(_, value)| value);

    record
        .get("DISTRICT")
        .into_iter()
        .chain(vintage_fields)
        .chain(record.get("BASENAME"))
        .chain(record.get("CONG_DIST"))
        .filter_map(loose_string)
        .find(|value| value.chars().all(|c| c.is_ascii_digit()))
        .map(|value| pad_district(&value))
}

fn legislative_district(record: &GeoRecord) -> Option<String> {
    field(record, "BASENAME").or_else(|| field(record, "DISTRICT"))
}

/// Reject addresses too short to geocode
pub fn validate_address(address: &str) -> Result<&str, GeocodeError> {
    let trimmed = address.trim();
    if trimmed.chars().count() < MIN_ADDRESS_LEN {
        return Err(GeocodeError::InvalidAddress(format!(
            "address must be at least {} characters",
            MIN_ADDRESS_LEN
        )));
    }
    Ok(trimmed)
}

/// Census geocoder client
pub struct Geocoder {
    http_client: Client,
    base_url: String,
}

impl Geocoder {
    pub fn new(http_client: Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }

    /// Geocode a one-line address
    ///
    /// # Errors
    /// - `InvalidAddress` for input under five characters (no request is made)
    /// - `NoMatch` when the service finds no address match
    /// - `UnknownState` when the state FIPS code is absent or unmapped
    pub async fn geocode(&self, address: &str) -> Result<GeoLocation, GeocodeError> {
        let address = validate_address(address)?;
        let url = join_url(&self.base_url, GEOGRAPHIES_PATH);

        debug!(url = %url, "Querying Census geocoder");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("address", address),
                ("benchmark", BENCHMARK),
                ("vintage", VINTAGE),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(SourceError::from)?;

        let response = ensure_success(response).await.map_err(|e| {
            warn!(url = %url, error = %e, "Census geocoder request failed");
            e
        })?;

        let body: CensusResponse = response.json().await.map_err(SourceError::from)?;
        let address_match = body
            .result
            .and_then(|r| r.address_matches.into_iter().next())
            .ok_or(GeocodeError::NoMatch)?;

        let location = location_from_match(address_match)?;

        info!(
            state = %location.state,
            congressional = ?location.congressional_district,
            upper = ?location.upper_state_district,
            lower = ?location.lower_state_district,
            "Census geocode"
        );

        Ok(location)
    }
}

fn location_from_match(address_match: AddressMatch) -> Result<GeoLocation, GeocodeError> {
    let geographies = &address_match.geographies;
    let congressional = find_layer(geographies, GeographyLayer::Congressional);
    let upper = find_layer(geographies, GeographyLayer::StateUpper);
    let lower = find_layer(geographies, GeographyLayer::StateLower);
    let states = find_layer(geographies, GeographyLayer::States);

    let state_fips = [congressional, upper, lower, states]
        .into_iter()
        .flatten()
        .find_map(|record| field(record, "STATE"));

    let state = match state_fips.as_deref().and_then(state_for_fips) {
        Some(state) => state,
        None => {
            warn!(
                layers = ?geographies.keys().collect::<Vec<_>>(),
                fips = ?state_fips,
                "Geocode response has no mappable state"
            );
            return Err(GeocodeError::UnknownState(state_fips));
        }
    };

    let (lng, lat) = match address_match.coordinates {
        Some(Coordinates {
            x: Some(x),
            y: Some(y),
        }) => (x, y),
        _ => return Err(GeocodeError::MissingCoordinates),
    };

    Ok(GeoLocation {
        lat,
        lng,
        state_fips: pad_fips(state_fips.as_deref().unwrap_or_default()),
        state: state.to_string(),
        congressional_district: congressional.and_then(congressional_district),
        upper_state_district: upper.and_then(legislative_district),
        lower_state_district: lower.and_then(legislative_district),
        matched_address: address_match.matched_address,
    })
}
