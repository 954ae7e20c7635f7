//! Flattened display view of a resolution result

use std::collections::HashSet;

use serde::Serialize;

use crate::models::{
    Office, ResolutionResult, Representative, LEVEL_COUNTRY, LEVEL_STATE, ROLE_LOWER, ROLE_UPPER,
};

/// Body of `POST /representatives/list` and `represent resolve --list`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepresentativeList {
    pub representatives: Vec<Representative>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_address: Option<String>,
}

impl From<&ResolutionResult> for RepresentativeList {
    fn from(result: &ResolutionResult) -> Self {
        Self {
            representatives: representatives(result),
            normalized_address: result.normalized_address.clone(),
        }
    }
}

fn is_legislative(office: &Office) -> bool {
    let has_role = office
        .roles
        .iter()
        .any(|r| r == ROLE_UPPER || r == ROLE_LOWER);
    let has_level = office
        .levels
        .iter()
        .any(|l| l.eq_ignore_ascii_case(LEVEL_COUNTRY) || l.eq_ignore_ascii_case(LEVEL_STATE));
    has_role && has_level
}

/// One entry per (office, official) pair of a federal or state legislative
/// office. Out-of-range indices are dropped; repeats of the same office name
/// and official name appear once.
pub fn representatives(result: &ResolutionResult) -> Vec<Representative> {
    let mut seen = HashSet::new();
    let mut reps = Vec::new();

    for office in result.offices.iter().filter(|o| is_legislative(o)) {
        for &index in &office.official_indices {
            let Some(official) = result.officials.get(index) else {
                continue;
            };
            if !seen.insert(format!("{}|{}", office.name, official.name)) {
                continue;
            }
            reps.push(Representative {
                office: office.name.clone(),
                name: official.name.clone(),
                party: official.party.clone(),
                phones: official.phones.clone(),
                urls: official.urls.clone(),
                photo_url: official.photo_url.clone(),
            });
        }
    }

    reps
}
