//! Congress.gov member API client (primary federal roster source)
//!
//! The member schema is loose: `terms` arrives as an array, as
//! `{ "item": [...] }`, as `{ "item": {...} }`, or as a bare object; the state
//! may be a code or a full name on the member or on a term; districts may be
//! strings or numbers. `CongressMember` absorbs all of these shapes.

use std::cmp::Reverse;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::models::{Chamber, Official};
use crate::normalize::{de_opt_loose_string, normalize_state_to_code};
use crate::services::{ensure_success, join_url};

const PAGE_LIMIT: &str = "250";

/// One term of service as reported by Congress.gov
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CongressTerm {
    pub chamber: Option<String>,
    #[serde(default, deserialize_with = "de_opt_loose_string")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "de_opt_loose_string")]
    pub state_code: Option<String>,
    #[serde(default, deserialize_with = "de_opt_loose_string")]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "de_opt_loose_string")]
    pub start_year: Option<String>,
}

impl CongressTerm {
    fn start_year(&self) -> Option<i64> {
        self.start_year.as_deref().and_then(|y| y.parse().ok())
    }

    fn is_chamber(&self, chamber: Chamber) -> bool {
        let Some(label) = self.chamber.as_deref() else {
            return false;
        };
        let label = label.trim();
        match chamber {
            Chamber::Upper => label.eq_ignore_ascii_case("senate"),
            Chamber::Lower => {
                label.eq_ignore_ascii_case("house of representatives")
                    || label.eq_ignore_ascii_case("house")
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TermItems {
    List(Vec<Option<CongressTerm>>),
    Single(CongressTerm),
}

impl TermItems {
    fn into_list(self) -> Vec<CongressTerm> {
        match self {
            TermItems::List(items) => items.into_iter().flatten().collect(),
            TermItems::Single(term) => vec![term],
        }
    }
}

/// Every shape `terms` has been observed in
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TermsField {
    List(Vec<Option<CongressTerm>>),
    Wrapped { item: TermItems },
    Single(CongressTerm),
}

impl TermsField {
    fn into_list(self) -> Vec<CongressTerm> {
        match self {
            TermsField::List(items) => items.into_iter().flatten().collect(),
            TermsField::Wrapped { item } => item.into_list(),
            TermsField::Single(term) => vec![term],
        }
    }
}

fn de_terms<'de, D>(deserializer: D) -> Result<Vec<CongressTerm>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let terms = Option::<TermsField>::deserialize(deserializer)?;
    Ok(terms.map(TermsField::into_list).unwrap_or_default())
}

/// Member record from the Congress.gov member list
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CongressMember {
    #[serde(alias = "bioguide_id")]
    pub bioguide_id: Option<String>,
    pub uri: Option<String>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub party_name: Option<String>,
    pub party: Option<String>,
    #[serde(default, deserialize_with = "de_opt_loose_string")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "de_opt_loose_string")]
    pub state_code: Option<String>,
    #[serde(default, deserialize_with = "de_opt_loose_string")]
    pub district: Option<String>,
    pub phone: Option<String>,
    pub url: Option<String>,
    #[serde(default, deserialize_with = "de_terms")]
    pub terms: Vec<CongressTerm>,
}

impl CongressMember {
    /// Parse raw member records, skipping (and logging) any that do not fit
    pub fn parse_all(raw: &[Value]) -> Vec<CongressMember> {
        raw.iter()
            .filter_map(|value| match CongressMember::deserialize(value) {
                Ok(member) => Some(member),
                Err(e) => {
                    warn!(
                        error = %e,
                        keys = ?record_keys(value),
                        "Skipping unparseable Congress.gov member"
                    );
                    None
                }
            })
            .collect()
    }

    /// Terms ordered most recent first: by start year when every term has
    /// one, otherwise by reverse position (the list is chronological).
    pub fn terms_newest_first(&self) -> Vec<&CongressTerm> {
        let mut terms: Vec<&CongressTerm> = self.terms.iter().rev().collect();
        if terms.iter().all(|t| t.start_year().is_some()) {
            terms.sort_by_key(|t| Reverse(t.start_year()));
        }
        terms
    }

    /// Most recent term served in `chamber`
    pub fn current_term(&self, chamber: Chamber) -> Option<&CongressTerm> {
        self.terms_newest_first()
            .into_iter()
            .find(|term| term.is_chamber(chamber))
    }

    /// Canonical state code, preferring the chamber term over the member
    pub fn state_for(&self, chamber: Chamber) -> Option<&'static str> {
        let term = self.current_term(chamber);
        let first_term = self.terms.first();
        [
            term.and_then(|t| t.state.as_deref()),
            term.and_then(|t| t.state_code.as_deref()),
            self.state.as_deref(),
            self.state_code.as_deref(),
            first_term.and_then(|t| t.state.as_deref()),
            first_term.and_then(|t| t.state_code.as_deref()),
        ]
        .into_iter()
        .flatten()
        .find_map(normalize_state_to_code)
    }

    pub fn district_for(&self, chamber: Chamber) -> Option<&str> {
        self.current_term(chamber)
            .and_then(|t| t.district.as_deref())
            .or(self.district.as_deref())
    }

    /// Identifier stable across duplicate records of the same person
    pub fn stable_id(&self) -> Option<&str> {
        self.bioguide_id
            .as_deref()
            .or(self.uri.as_deref())
            .or(self.name.as_deref())
            .filter(|id| !id.trim().is_empty())
    }

    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => format!(
                "{} {}",
                self.first_name.as_deref().unwrap_or_default(),
                self.last_name.as_deref().unwrap_or_default()
            )
            .trim()
            .to_string(),
        }
    }

    pub fn to_official(&self, photo_base_url: &str) -> Official {
        Official {
            name: self.display_name(),
            party: self.party_name.clone().or_else(|| self.party.clone()),
            phones: self.phone.iter().cloned().collect(),
            urls: self.url.iter().cloned().collect(),
            photo_url: self
                .bioguide_id
                .as_deref()
                .map(|id| crate::services::federal_resolver::photo_url(photo_base_url, id)),
        }
    }
}

/// Top-level keys of a raw record, for schema-drift diagnostics
pub fn record_keys(value: &Value) -> Vec<&str> {
    value
        .as_object()
        .map(|obj| obj.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct MemberListResponse {
    #[serde(default)]
    members: Vec<Value>,
}

/// Congress.gov member API client
pub struct CongressClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl CongressClient {
    pub fn new(http_client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Current members for a state and chamber (and district, for the House)
    ///
    /// Returns raw records so callers can log their shape when filtering
    /// finds nothing.
    pub async fn fetch_members(
        &self,
        state: &str,
        chamber: Chamber,
        district: Option<&str>,
    ) -> Result<Vec<Value>, SourceError> {
        let url = join_url(&self.base_url, "member");
        let chamber_param = match chamber {
            Chamber::Upper => "Senate",
            Chamber::Lower => "House",
        };

        let mut query: Vec<(&str, &str)> = vec![
            ("state", state),
            ("chamber", chamber_param),
            ("currentMember", "true"),
            ("limit", PAGE_LIMIT),
            ("format", "json"),
        ];
        if let Some(district) = district {
            query.push(("district", district));
        }

        debug!(url = %url, state = %state, chamber = chamber_param, district = ?district, "Querying Congress.gov");

        let response = self
            .http_client
            .get(&url)
            .query(&query)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let body: MemberListResponse = response.json().await?;
        Ok(body.members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn member(value: Value) -> CongressMember {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_terms_shapes_normalize() {
        let as_list = member(json!({ "terms": [{ "chamber": "Senate" }, { "chamber": "House of Representatives" }] }));
        assert_eq!(as_list.terms.len(), 2);

        let wrapped = member(json!({ "terms": { "item": [{ "chamber": "Senate" }, null] } }));
        assert_eq!(wrapped.terms.len(), 1);

        let wrapped_single = member(json!({ "terms": { "item": { "chamber": "Senate" } } }));
        assert_eq!(wrapped_single.terms.len(), 1);

        let bare = member(json!({ "terms": { "chamber": "Senate", "state": "IL" } }));
        assert_eq!(bare.terms.len(), 1);
        assert_eq!(bare.terms[0].state.as_deref(), Some("IL"));

        let missing = member(json!({ "name": "X" }));
        assert!(missing.terms.is_empty());
    }

    #[test]
    fn test_current_term_scans_newest_first() {
        // House first, then Senate, then a later House stint listed last
        let m = member(json!({
            "terms": { "item": [
                { "chamber": "House of Representatives", "state": "Illinois", "district": 1 },
                { "chamber": "Senate", "state": "Illinois" },
                { "chamber": "House of Representatives", "state": "Illinois", "district": 7 }
            ]}
        }));
        assert_eq!(m.current_term(Chamber::Lower).unwrap().district.as_deref(), Some("7"));
        assert_eq!(m.current_term(Chamber::Upper).unwrap().chamber.as_deref(), Some("Senate"));
    }

    #[test]
    fn test_current_term_orders_by_start_year() {
        let m = member(json!({
            "terms": [
                { "chamber": "House of Representatives", "district": "9", "startYear": 2021 },
                { "chamber": "House of Representatives", "district": "3", "startYear": 2013 }
            ]
        }));
        assert_eq!(m.current_term(Chamber::Lower).unwrap().district.as_deref(), Some("9"));
    }

    #[test]
    fn test_state_resolution_shapes() {
        let top_code = member(json!({ "state": "il" }));
        assert_eq!(top_code.state_for(Chamber::Upper), Some("IL"));

        let top_name = member(json!({ "state": "ILLINOIS" }));
        assert_eq!(top_name.state_for(Chamber::Upper), Some("IL"));

        let nested = member(json!({ "terms": [{ "chamber": "Senate", "stateCode": "Ill." }, { "chamber": "Senate", "state": "New York" }] }));
        assert_eq!(nested.state_for(Chamber::Upper), Some("NY"));

        let unknown = member(json!({ "state": "Atlantis" }));
        assert_eq!(unknown.state_for(Chamber::Upper), None);
    }

    #[test]
    fn test_district_prefers_term() {
        let m = member(json!({
            "district": 2,
            "terms": [{ "chamber": "House of Representatives", "district": "05" }]
        }));
        assert_eq!(m.district_for(Chamber::Lower), Some("05"));
        let flat = member(json!({ "district": 2 }));
        assert_eq!(flat.district_for(Chamber::Lower), Some("2"));
    }

    #[test]
    fn test_official_mapping() {
        let m = member(json!({
            "bioguideId": "D000563",
            "firstName": "Richard",
            "lastName": "Durbin",
            "party": "D",
            "url": "https://api.congress.gov/v3/member/D000563"
        }));
        let official = m.to_official("https://img.example/225x275");
        assert_eq!(official.name, "Richard Durbin");
        assert_eq!(official.party.as_deref(), Some("D"));
        assert_eq!(official.urls.len(), 1);
        assert!(official.phones.is_empty());
        assert_eq!(
            official.photo_url.as_deref(),
            Some("https://img.example/225x275/D000563.jpg")
        );
    }

    #[test]
    fn test_parse_all_skips_bad_records() {
        let raw = vec![json!({ "name": "Ok" }), json!("not an object"), json!({ "name": 5 })];
        let members = CongressMember::parse_all(&raw);
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].display_name(), "Ok");
    }
}
