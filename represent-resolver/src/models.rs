//! Request-scoped data model
//!
//! Wire names follow the Civic-style shape consumers already parse
//! (`officialIndices`, `divisionId`, `photoUrl`, `normalizedAddress`).

use serde::{Deserialize, Serialize};

use crate::normalize::strip_leading_zeros;

pub const ROLE_UPPER: &str = "legislatorUpperBody";
pub const ROLE_LOWER: &str = "legislatorLowerBody";
pub const LEVEL_COUNTRY: &str = "country";
pub const LEVEL_STATE: &str = "administrativeArea1";

/// Geocoded address with the districts that contain it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoLocation {
    pub lat: f64,
    pub lng: f64,
    /// Two-digit state FIPS code, e.g. "17"
    pub state_fips: String,
    /// USPS code, always valid when the record exists
    pub state: String,
    /// Zero-padded to two digits, e.g. "05"
    pub congressional_district: Option<String>,
    pub upper_state_district: Option<String>,
    pub lower_state_district: Option<String>,
    /// Address as the geocoder matched it
    pub matched_address: Option<String>,
}

/// Legislative chamber, shared by the federal and state sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chamber {
    Upper,
    Lower,
}

impl Chamber {
    pub fn role(self) -> &'static str {
        match self {
            Chamber::Upper => ROLE_UPPER,
            Chamber::Lower => ROLE_LOWER,
        }
    }

    /// Chamber label as OpenStates reports it
    pub fn classification(self) -> &'static str {
        match self {
            Chamber::Upper => "upper",
            Chamber::Lower => "lower",
        }
    }

    pub fn from_classification(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "upper" => Some(Chamber::Upper),
            "lower" => Some(Chamber::Lower),
            _ => None,
        }
    }
}

/// One officeholder
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Official {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// An office and the positions of its holders in the officials list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Office {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division_id: Option<String>,
    #[serde(default)]
    pub levels: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub official_indices: Vec<usize>,
}

impl Office {
    pub fn us_senator(state: &str, index: usize) -> Self {
        Self {
            name: "United States Senator".to_string(),
            division_id: Some(state_division(state)),
            levels: vec![LEVEL_COUNTRY.to_string()],
            roles: vec![ROLE_UPPER.to_string()],
            official_indices: vec![index],
        }
    }

    pub fn us_representative(state: &str, district: Option<&str>, index: usize) -> Self {
        let division = match district.map(strip_leading_zeros) {
            Some(cd) if cd != "0" => format!("{}/cd:{}", state_division(state), cd),
            _ => state_division(state),
        };
        Self {
            name: "United States Representative".to_string(),
            division_id: Some(division),
            levels: vec![LEVEL_COUNTRY.to_string()],
            roles: vec![ROLE_LOWER.to_string()],
            official_indices: vec![index],
        }
    }

    pub fn state_legislator(chamber: Chamber, index: usize) -> Self {
        let name = match chamber {
            Chamber::Upper => "State Senator",
            Chamber::Lower => "State Representative",
        };
        Self {
            name: name.to_string(),
            division_id: None,
            levels: vec![LEVEL_STATE.to_string()],
            roles: vec![chamber.role().to_string()],
            official_indices: vec![index],
        }
    }
}

fn state_division(state: &str) -> String {
    format!("ocd-division/country:us/state:{}", state.to_ascii_lowercase())
}

/// Output of a single resolver branch; indices are local to this roster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub officials: Vec<Official>,
    pub offices: Vec<Office>,
}

impl Roster {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append an official and the office built for its index
    pub fn push(&mut self, official: Official, office: impl FnOnce(usize) -> Office) {
        let index = self.officials.len();
        self.officials.push(official);
        self.offices.push(office(index));
    }

    pub fn len(&self) -> usize {
        self.officials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.officials.is_empty()
    }
}

/// The only entity returned across the resolver boundary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    pub officials: Vec<Official>,
    pub offices: Vec<Office>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_address: Option<String>,
}

/// Flattened office + official pair for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Representative {
    pub office: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}
