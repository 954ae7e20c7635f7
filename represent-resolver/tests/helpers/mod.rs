//! Shared mock upstreams for integration tests
//!
//! One `MockServer` stands in for every external service, each under its
//! own path prefix.

#![allow(dead_code)]

use httpmock::prelude::*;
use httpmock::Mock;
use represent_common::config::{FederalSource, StateDistrictMatch};
use represent_common::Config;
use serde_json::{json, Value};

pub const ADDRESS: &str = "100 W Randolph St, Chicago, IL 60601";
pub const MATCHED_ADDRESS: &str = "100 W RANDOLPH ST, CHICAGO, IL, 60601";
pub const MIRROR_PATH: &str = "/mirror/legislators-current.json";

/// Config pointing every source at `server`
pub fn config_for(server: &MockServer, congress_key: bool, openstates_key: bool) -> Config {
    let mut config = Config::default();
    config.geocoder.base_url = server.base_url();
    config.federal.source = FederalSource::Congress;
    config.federal.congress_base_url = server.url("/congress");
    config.federal.congress_api_key = congress_key.then(|| "congress-key".to_string());
    config.dataset.mirrors = vec![server.url(MIRROR_PATH)];
    config.dataset.bundled_path = std::env::temp_dir().join("represent-tests-no-such-file.json");
    config.dataset.min_entries = 3;
    config.state.openstates_base_url = server.url("/openstates");
    config.state.openstates_api_key = openstates_key.then(|| "openstates-key".to_string());
    config.state.district_match = StateDistrictMatch::Exact;
    config
}

pub fn census_body(congressional_layer: &str) -> Value {
    let mut geographies = serde_json::Map::new();
    geographies.insert(
        congressional_layer.to_string(),
        json!([{ "STATE": "17", "BASENAME": "13", "CD119": "13" }]),
    );
    geographies.insert(
        "2024 State Legislative Districts - Upper".to_string(),
        json!([{ "STATE": "17", "BASENAME": "3" }]),
    );
    geographies.insert(
        "2024 State Legislative Districts - Lower".to_string(),
        json!([{ "STATE": "17", "BASENAME": "5" }]),
    );
    geographies.insert("States".to_string(), json!([{ "STATE": "17", "STUSAB": "IL" }]));

    json!({
        "result": {
            "addressMatches": [{
                "matchedAddress": MATCHED_ADDRESS,
                "coordinates": { "x": -87.6324, "y": 41.8847 },
                "geographies": geographies
            }]
        }
    })
}

pub async fn mock_census<'a>(server: &'a MockServer, congressional_layer: &str) -> Mock<'a> {
    let body = census_body(congressional_layer);
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/geocoder/geographies/onelineaddress")
                .query_param("address", ADDRESS);
            then.status(200).json_body(body);
        })
        .await
}

pub async fn mock_census_no_match(server: &MockServer) -> Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/geocoder/geographies/onelineaddress");
            then.status(200)
                .json_body(json!({ "result": { "addressMatches": [] } }));
        })
        .await
}

pub fn illinois_senators() -> Value {
    json!({
        "members": [
            {
                "bioguideId": "D000563",
                "name": "Durbin, Richard J.",
                "partyName": "Democratic",
                "state": "Illinois",
                "terms": { "item": [
                    { "chamber": "House of Representatives", "startYear": 1983 },
                    { "chamber": "Senate", "startYear": 1997 }
                ]}
            },
            {
                "bioguideId": "D000622",
                "name": "Duckworth, Tammy",
                "partyName": "Democratic",
                "state": "Illinois",
                "terms": { "item": [{ "chamber": "Senate", "startYear": 2017 }] }
            }
        ]
    })
}

pub fn illinois_district_13() -> Value {
    json!({
        "members": [{
            "bioguideId": "B001315",
            "name": "Budzinski, Nikki",
            "partyName": "Democratic",
            "state": "Illinois",
            "district": 13,
            "terms": { "item": [{ "chamber": "House of Representatives", "startYear": 2023 }] }
        }]
    })
}

pub async fn mock_congress<'a>(
    server: &'a MockServer,
    chamber: &str,
    body: Value,
) -> Mock<'a> {
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/congress/member")
                .query_param("state", "IL")
                .query_param("chamber", chamber)
                .query_param("currentMember", "true")
                .query_param("api_key", "congress-key");
            then.status(200).json_body(body);
        })
        .await
}

/// Dataset in the mirror's shape (`terms`, `sen`/`rep`)
pub fn dataset_body() -> Value {
    json!([
        {
            "id": { "bioguide": "D000563" },
            "name": { "first": "Richard", "last": "Durbin", "official_full": "Richard J. Durbin" },
            "terms": [
                { "type": "rep", "state": "IL", "district": 20, "party": "Democrat" },
                { "type": "sen", "state": "IL", "party": "Democrat", "phone": "202-224-2152" }
            ]
        },
        {
            "id": { "bioguide": "D000622" },
            "name": { "first": "Tammy", "last": "Duckworth" },
            "terms": [{ "type": "sen", "state": "IL", "party": "Democrat" }]
        },
        {
            "id": { "bioguide": "B001315" },
            "name": { "official_full": "Nikki Budzinski" },
            "terms": [{ "type": "rep", "state": "IL", "district": 13, "party": "Democrat" }]
        },
        {
            "id": { "bioguide": "S000148" },
            "name": { "official_full": "Charles E. Schumer" },
            "terms": [{ "type": "sen", "state": "NY", "party": "Democrat" }]
        }
    ])
}

pub async fn mock_dataset(server: &MockServer) -> Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(GET).path(MIRROR_PATH);
            then.status(200).json_body(dataset_body());
        })
        .await
}

pub async fn mock_openstates(server: &MockServer) -> Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/openstates/people.geo")
                .header("X-API-Key", "openstates-key");
            then.status(200).json_body(json!({
                "results": [
                    {
                        "name": "Dick Durbin",
                        "current_role": { "chamber": "upper", "district": "1" },
                        "jurisdiction": { "classification": "country" }
                    },
                    {
                        "name": "Wrong District Senator",
                        "party": "Republican",
                        "current_role": { "chamber": "upper", "district": "30" },
                        "jurisdiction": { "classification": "state" }
                    },
                    {
                        "name": "Mattie Hunter",
                        "party": "Democratic",
                        "current_role": { "chamber": "upper", "district": "03" },
                        "jurisdiction": { "classification": "state" },
                        "offices": [{ "voice": "217-782-5966" }]
                    },
                    {
                        "name": "Kam Buckner",
                        "current_party": "Democratic",
                        "current_role": { "org_classification": "lower", "district": "5" },
                        "jurisdiction": { "classification": "state" },
                        "links": [{ "url": "https://ilga.gov/buckner" }]
                    }
                ]
            }));
        })
        .await
}

/// Standard Chicago scenario: complete primary federal answer
pub async fn mock_primary_federal(server: &MockServer) {
    mock_congress(server, "Senate", illinois_senators()).await;
    mock_congress(server, "House", illinois_district_13()).await;
}
