//! End-to-end resolution against mocked upstream services

mod helpers;

use std::collections::HashSet;
use std::io::Write;
use std::time::{Duration, Instant};

use helpers::*;
use httpmock::prelude::*;
use represent_common::config::FederalSource;
use represent_resolver::present::representatives;
use represent_resolver::{ResolutionResult, ResolveError, Resolver};

fn resolver(config: &represent_common::Config) -> Resolver {
    Resolver::from_config(config).unwrap()
}

fn names(result: &ResolutionResult) -> Vec<&str> {
    result.officials.iter().map(|o| o.name.as_str()).collect()
}

fn assert_indices_valid(result: &ResolutionResult) {
    for office in &result.offices {
        for &index in &office.official_indices {
            assert!(
                index < result.officials.len(),
                "office {} points past the officials list",
                office.name
            );
        }
    }
}

/// Chicago address resolves to two senators and the district 13 representative
#[tokio::test]
async fn tc_pipeline_001_federal_primary() {
    // Given: Congress.gov answers completely, no state credential
    let server = MockServer::start_async().await;
    mock_census(&server, "119th Congressional Districts").await;
    mock_primary_federal(&server).await;
    let dataset = mock_dataset(&server).await;

    // When: Resolving the address
    let result = resolver(&config_for(&server, true, false))
        .resolve(ADDRESS)
        .await
        .unwrap();

    // Then: Three federal officials, fallback never consulted
    assert_eq!(
        names(&result),
        vec!["Durbin, Richard J.", "Duckworth, Tammy", "Budzinski, Nikki"]
    );
    let senate_offices = result
        .offices
        .iter()
        .filter(|o| o.name == "United States Senator")
        .count();
    assert_eq!(senate_offices, 2);
    assert_eq!(
        result.offices[2].division_id.as_deref(),
        Some("ocd-division/country:us/state:il/cd:13")
    );
    assert_eq!(result.normalized_address.as_deref(), Some(MATCHED_ADDRESS));
    assert_indices_valid(&result);
    dataset.assert_calls_async(0).await;
}

/// State credential adds one legislator per chamber for the geocoded districts
#[tokio::test]
async fn tc_pipeline_002_with_state_legislators() {
    // Given: All sources available
    let server = MockServer::start_async().await;
    mock_census(&server, "119th Congressional Districts").await;
    mock_primary_federal(&server).await;
    let openstates = mock_openstates(&server).await;

    // When: Resolving
    let result = resolver(&config_for(&server, true, true))
        .resolve(ADDRESS)
        .await
        .unwrap();

    // Then: 3 federal + 2 state, state indices offset past federal ones
    openstates.assert_async().await;
    assert_eq!(result.officials.len(), 5);
    assert_eq!(result.officials[3].name, "Mattie Hunter");
    assert_eq!(result.officials[4].name, "Kam Buckner");
    assert_eq!(result.offices[3].name, "State Senator");
    assert_eq!(result.offices[3].official_indices, vec![3]);
    assert_eq!(result.offices[4].name, "State Representative");
    assert_eq!(result.offices[4].official_indices, vec![4]);
    assert_indices_valid(&result);
}

/// An empty primary answer is served from the fallback dataset without error
#[tokio::test]
async fn tc_pipeline_003_empty_primary_uses_dataset() {
    // Given: Congress.gov returns no members
    let server = MockServer::start_async().await;
    mock_census(&server, "119th Congressional Districts").await;
    mock_congress(&server, "Senate", serde_json::json!({ "members": [] })).await;
    mock_congress(&server, "House", serde_json::json!({ "members": [] })).await;
    let dataset = mock_dataset(&server).await;

    // When: Resolving
    let resolver = resolver(&config_for(&server, true, false));
    assert!(!resolver.dataset_loaded());
    let result = resolver.resolve(ADDRESS).await.unwrap();

    // Then: Senators and representative come from the dataset
    dataset.assert_async().await;
    assert!(resolver.dataset_loaded());
    assert_eq!(
        names(&result),
        vec!["Richard J. Durbin", "Tammy Duckworth", "Nikki Budzinski"]
    );
    assert_eq!(
        result.officials[2].photo_url.as_deref(),
        Some("https://theunitedstates.io/images/congress/225x275/B001315.jpg")
    );
    assert_indices_valid(&result);
}

/// Congressional layer found under a vintage name never seen before
#[tokio::test]
async fn tc_pipeline_004_unseen_layer_name() {
    let server = MockServer::start_async().await;
    mock_census(&server, "121st Congressional Districts").await;
    mock_primary_federal(&server).await;

    let result = resolver(&config_for(&server, true, false))
        .resolve(ADDRESS)
        .await
        .unwrap();

    assert_eq!(result.officials.len(), 3);
    assert_eq!(result.officials[2].name, "Budzinski, Nikki");
}

/// Dataset-only source never contacts Congress.gov
#[tokio::test]
async fn tc_pipeline_005_dataset_source() {
    let server = MockServer::start_async().await;
    mock_census(&server, "119th Congressional Districts").await;
    let congress = server
        .mock_async(|when, then| {
            when.path("/congress/member");
            then.status(200).json_body(illinois_senators());
        })
        .await;
    mock_dataset(&server).await;

    let mut config = config_for(&server, true, false);
    config.federal.source = FederalSource::Dataset;
    let result = resolver(&config).resolve(ADDRESS).await.unwrap();

    congress.assert_calls_async(0).await;
    assert_eq!(result.officials.len(), 3);
}

/// Every federal source down still yields a successful, empty federal part
#[tokio::test]
async fn tc_pipeline_006_all_federal_sources_down() {
    let server = MockServer::start_async().await;
    mock_census(&server, "119th Congressional Districts").await;
    server
        .mock_async(|when, then| {
            when.path("/congress/member");
            then.status(503);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.path(MIRROR_PATH);
            then.status(404);
        })
        .await;

    let result = resolver(&config_for(&server, true, false))
        .resolve(ADDRESS)
        .await
        .unwrap();

    assert!(result.officials.is_empty());
    assert!(result.offices.is_empty());
    assert_eq!(result.normalized_address.as_deref(), Some(MATCHED_ADDRESS));
}

/// State source failure degrades to federal-only
#[tokio::test]
async fn tc_pipeline_007_state_failure_is_not_fatal() {
    let server = MockServer::start_async().await;
    mock_census(&server, "119th Congressional Districts").await;
    mock_primary_federal(&server).await;
    server
        .mock_async(|when, then| {
            when.path("/openstates/people.geo");
            then.status(500).body("upstream exploded");
        })
        .await;

    let result = resolver(&config_for(&server, true, true))
        .resolve(ADDRESS)
        .await
        .unwrap();

    assert_eq!(result.officials.len(), 3);
}

/// Identical upstream answers give identical results
#[tokio::test]
async fn tc_pipeline_008_deterministic() {
    let server = MockServer::start_async().await;
    mock_census(&server, "119th Congressional Districts").await;
    mock_primary_federal(&server).await;
    mock_openstates(&server).await;

    let resolver = resolver(&config_for(&server, true, true));
    let first = resolver.resolve(ADDRESS).await.unwrap();
    let second = resolver.resolve(ADDRESS).await.unwrap();

    assert_eq!(first, second);
}

/// Short address is rejected before any request
#[tokio::test]
async fn tc_pipeline_009_short_address() {
    let server = MockServer::start_async().await;
    let census = mock_census_no_match(&server).await;

    let err = resolver(&config_for(&server, true, true))
        .resolve(" 1 a ")
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::InvalidInput(_)));
    census.assert_calls_async(0).await;
}

/// Geocoder without a match is a failed precondition
#[tokio::test]
async fn tc_pipeline_010_no_geocode_match() {
    let server = MockServer::start_async().await;
    mock_census_no_match(&server).await;

    let err = resolver(&config_for(&server, true, true))
        .resolve(ADDRESS)
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::FailedPrecondition(_)));
}

/// Presentation list has one entry per legislator and no duplicates
#[tokio::test]
async fn tc_pipeline_011_presentation_list() {
    let server = MockServer::start_async().await;
    mock_census(&server, "119th Congressional Districts").await;
    mock_primary_federal(&server).await;
    mock_openstates(&server).await;

    let result = resolver(&config_for(&server, true, true))
        .resolve(ADDRESS)
        .await
        .unwrap();
    let reps = representatives(&result);

    assert_eq!(reps.len(), 5);
    let keys: HashSet<String> = reps.iter().map(|r| format!("{}|{}", r.office, r.name)).collect();
    assert_eq!(keys.len(), reps.len());
}

/// Hanging mirrors must not keep the federal branch from the bundled dataset
#[tokio::test]
async fn tc_pipeline_012_slow_mirrors_reach_bundled_dataset() {
    // Given: Five mirrors that answer only after 5 s, a bundled copy on disk,
    // no Congress.gov key and a 3 s federal deadline
    let server = MockServer::start_async().await;
    mock_census(&server, "119th Congressional Districts").await;
    let mirror_paths: Vec<String> = (1..=5).map(|i| format!("/slow-mirror-{}.json", i)).collect();
    for path in &mirror_paths {
        server
            .mock_async(|when, then| {
                when.method(GET).path(path.as_str());
                then.status(200)
                    .delay(Duration::from_secs(5))
                    .json_body(dataset_body());
            })
            .await;
    }
    let mut bundled = tempfile::NamedTempFile::new().unwrap();
    write!(bundled, "{}", dataset_body()).unwrap();

    let mut config = config_for(&server, false, false);
    config.dataset.mirrors = mirror_paths.iter().map(|path| server.url(path)).collect();
    config.dataset.bundled_path = bundled.path().to_path_buf();
    config.dataset.mirror_budget_secs = 1;
    config.http.request_timeout_secs = 1;
    config.http.federal_branch_timeout_secs = 3;

    // When: Resolving
    let resolver = resolver(&config);
    let result = resolver.resolve(ADDRESS).await.unwrap();

    // Then: Federal officials come from the bundled file within the deadline
    assert_eq!(
        names(&result),
        vec!["Richard J. Durbin", "Tammy Duckworth", "Nikki Budzinski"]
    );
    assert!(resolver.dataset_loaded());
    assert_indices_valid(&result);
}

/// A state source slower than its deadline leaves a federal-only answer
#[tokio::test]
async fn tc_pipeline_013_state_branch_timeout() {
    // Given: OpenStates answers after 3 s, state deadline is 1 s
    let server = MockServer::start_async().await;
    mock_census(&server, "119th Congressional Districts").await;
    mock_primary_federal(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/openstates/people.geo");
            then.status(200)
                .delay(Duration::from_secs(3))
                .json_body(serde_json::json!({ "results": [] }));
        })
        .await;
    let mut config = config_for(&server, true, true);
    config.http.state_branch_timeout_secs = 1;

    // When: Resolving
    let started = Instant::now();
    let result = resolver(&config).resolve(ADDRESS).await.unwrap();

    // Then: Federal officials only, returned before OpenStates would answer
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(
        names(&result),
        vec!["Durbin, Richard J.", "Duckworth, Tammy", "Budzinski, Nikki"]
    );
    assert_indices_valid(&result);
}

/// A federal branch slower than its deadline leaves a state-only answer
#[tokio::test]
async fn tc_pipeline_014_federal_branch_timeout() {
    // Given: Congress.gov answers after 3 s, federal deadline is 1 s
    let server = MockServer::start_async().await;
    mock_census(&server, "119th Congressional Districts").await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/congress/member");
            then.status(200)
                .delay(Duration::from_secs(3))
                .json_body(illinois_senators());
        })
        .await;
    mock_openstates(&server).await;
    let mut config = config_for(&server, true, true);
    config.http.federal_branch_timeout_secs = 1;

    // When: Resolving
    let started = Instant::now();
    let result = resolver(&config).resolve(ADDRESS).await.unwrap();

    // Then: State legislators only, indices start at zero
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(names(&result), vec!["Mattie Hunter", "Kam Buckner"]);
    assert_eq!(result.offices[0].name, "State Senator");
    assert_eq!(result.offices[0].official_indices, vec![0]);
    assert_indices_valid(&result);
}
