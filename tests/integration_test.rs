use netflix_daas::api::{dispatch, parse_request, AppState, HttpRequest};
use netflix_daas::config::Config;
use netflix_daas::executor::QueryExecutor;
use netflix_daas::ingestion::IngestPipeline;
use netflix_daas::store::Store;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

const FIVE_ROWS: &str = "\
title,type,release_year,age_certification,runtime,imdb_score,imdb_votes
Stranger Things,SHOW,2016,TV-14,50,8.7,1200000
Breaking Point,SHOW,2015,TV-MA,45,9.1,900000
Bird Box,MOVIE,2018,R,124,6.6,340000
Night Drive,MOVIE,2019,,95,7.4,120000
Quiet Harbor,MOVIE,2021,PG,102,7.4,80000
";

const TWO_ROWS: &str = "\
title,type,release_year,age_certification,runtime,imdb_score,imdb_votes
Stranger Things,SHOW,2016,TV-14,50,8.7,1200000
Bird Box,MOVIE,2018,R,124,6.6,340000
";

/// Create a scratch data directory with a fixture CSV and run the pipeline.
fn ingest_fixture(test_name: &str, csv: &str) -> Config {
    let data_dir = std::env::temp_dir().join(format!("netflix_daas_{}", test_name));
    let _ = fs::remove_dir_all(&data_dir);
    fs::create_dir_all(&data_dir).unwrap();

    let config = Config::with_data_dir(data_dir);
    fs::write(config.csv_path(), csv).unwrap();

    println!("📊 Ingesting fixture for {}", test_name);
    IngestPipeline::new(config.clone()).run().unwrap();
    config
}

fn fixture_state(config: &Config) -> AppState {
    let store = Arc::new(Store::open(config).unwrap());
    AppState::new(QueryExecutor::new(store), config.clone())
}

fn get(path: &str) -> HttpRequest {
    parse_request(&format!("GET {} HTTP/1.1\r\n\r\n", path)).unwrap()
}

fn post(path: &str, body: &str) -> HttpRequest {
    parse_request(&format!(
        "POST {} HTTP/1.1\r\nContent-Length: {}\r\n\r\n{}",
        path,
        body.len(),
        body
    ))
    .unwrap()
}

fn json_body(state: &AppState, req: &HttpRequest, expected_status: u16) -> serde_json::Value {
    let (status, body) = dispatch(state, req);
    assert_eq!(status, expected_status, "body was: {}", body);
    serde_json::from_str(&body).unwrap()
}

#[test]
fn test_pipeline_is_idempotent_across_reruns() {
    let config = ingest_fixture("idempotent", FIVE_ROWS);

    let first = IngestPipeline::new(config.clone()).run().unwrap();
    assert_eq!(first.rows_loaded, 5);
    assert_eq!(first.verified_count, 5);
    assert!(config.store_path().exists());
    assert!(config.setup_sql_path().exists());
    assert!(config.analytics_sql_path().exists());

    // Re-running replaces the table rather than accumulating
    let second = IngestPipeline::new(config.clone()).run().unwrap();
    assert_eq!(second.rows_loaded, first.rows_loaded);
    assert_eq!(second.verified_count, first.verified_count);

    let first_cols: Vec<(String, String)> = first
        .columns
        .iter()
        .map(|c| (c.name.clone(), c.declared_type.clone()))
        .collect();
    let second_cols: Vec<(String, String)> = second
        .columns
        .iter()
        .map(|c| (c.name.clone(), c.declared_type.clone()))
        .collect();
    assert_eq!(first_cols, second_cols);
}

#[test]
fn test_generated_setup_script_contains_schema() {
    let config = ingest_fixture("setup_script", TWO_ROWS);

    let script = fs::read_to_string(config.setup_sql_path()).unwrap();
    assert!(script.contains("DROP TABLE IF EXISTS netflix_shows;"));
    assert!(script.contains("CREATE TABLE netflix_shows ("));
    assert!(script.contains("imdb_score DOUBLE"));
    assert!(script.contains("title VARCHAR"));

    let queries = fs::read_to_string(config.analytics_sql_path()).unwrap();
    assert!(queries.contains("-- Content Type Distribution"));
    assert!(queries.contains("-- Runtime Distribution"));
}

#[test]
fn test_content_types_returns_one_group_per_type() {
    let config = ingest_fixture("content_types", TWO_ROWS);
    let state = fixture_state(&config);

    let v = json_body(&state, &get("/api/netflix/content-types"), 200);
    let rows = v["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(v["metadata"]["rowCount"], 2);

    let group = |name: &str| {
        rows.iter()
            .find(|r| r["type"] == name)
            .unwrap_or_else(|| panic!("missing {} group", name))
            .clone()
    };

    let show = group("SHOW");
    assert_eq!(show["count"], 1);
    assert!((show["avg_imdb_score"].as_f64().unwrap() - 8.7).abs() < 1e-9);

    let movie = group("MOVIE");
    assert_eq!(movie["count"], 1);
    assert!((movie["avg_imdb_score"].as_f64().unwrap() - 6.6).abs() < 1e-9);
}

#[test]
fn test_top_rated_respects_limit_and_ordering() {
    let config = ingest_fixture("top_rated", FIVE_ROWS);
    let state = fixture_state(&config);

    let v = json_body(&state, &get("/api/netflix/top-rated?limit=3"), 200);
    let rows = v["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(v["metadata"]["rowCount"], 3);

    // Score descending, then votes descending for the 7.4 tie
    assert_eq!(rows[0]["title"], "Breaking Point");
    assert_eq!(rows[1]["title"], "Stranger Things");
    assert_eq!(rows[2]["title"], "Night Drive");
}

#[test]
fn test_age_ratings_coalesce_null_certification() {
    let config = ingest_fixture("age_ratings", FIVE_ROWS);
    let state = fixture_state(&config);

    let v = json_body(&state, &get("/api/netflix/age-ratings"), 200);
    let rows = v["rows"].as_array().unwrap();

    let labels: Vec<&str> = rows
        .iter()
        .map(|r| r["age_certification"].as_str().unwrap())
        .collect();
    assert!(labels.contains(&"Not Rated"), "labels were {:?}", labels);
    assert!(rows.iter().all(|r| !r["age_certification"].is_null()));

    let not_rated = rows
        .iter()
        .find(|r| r["age_certification"] == "Not Rated")
        .unwrap();
    assert_eq!(not_rated["content_count"], 1);
}

#[test]
fn test_generic_query_envelope_and_allow_list() {
    let config = ingest_fixture("generic_query", FIVE_ROWS);
    let state = fixture_state(&config);

    let v = json_body(
        &state,
        &post(
            "/api/query",
            r#"{"sql":"SELECT title, imdb_score FROM netflix_shows WHERE imdb_score > 8.0","dataSourceId":"netflix-store"}"#,
        ),
        200,
    );
    let rows = v["rows"].as_array().unwrap();
    assert_eq!(rows.len(), v["metadata"]["rowCount"].as_u64().unwrap() as usize);
    assert_eq!(v["columns"].as_array().unwrap().len(), 2);
    assert_eq!(v["metadata"]["dataScanned"], 0);
    assert_eq!(v["metadata"]["cached"], false);

    // Any other identifier is rejected before execution
    let v = json_body(
        &state,
        &post(
            "/api/query",
            r#"{"sql":"SELECT 1","dataSourceId":"warehouse-7"}"#,
        ),
        400,
    );
    assert!(v["error"].as_str().unwrap().contains("Invalid data source"));
}

#[test]
fn test_runtime_distribution_buckets() {
    let config = ingest_fixture("runtime_distribution", FIVE_ROWS);
    let state = fixture_state(&config);

    let v = json_body(&state, &get("/api/netflix/runtime-distribution"), 200);
    let rows = v["rows"].as_array().unwrap();

    let bucket = |label: &str| -> u64 {
        rows.iter()
            .find(|r| r["runtime_category"] == label)
            .map(|r| r["count"].as_u64().unwrap())
            .unwrap_or(0)
    };

    // 50 and 45 minutes → Medium; 95 and 102 → Long; 124 → Extended
    assert_eq!(bucket("Medium (30-60 min)"), 2);
    assert_eq!(bucket("Long (90-120 min)"), 2);
    assert_eq!(bucket("Extended (2-3 hours)"), 1);
}

#[test]
fn test_highly_rated_filters_by_min_score() {
    let config = ingest_fixture("highly_rated", FIVE_ROWS);
    let state = fixture_state(&config);

    let v = json_body(&state, &get("/api/netflix/highly-rated?minScore=7.4"), 200);
    let rows = v["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert!(rows
        .iter()
        .all(|r| r["imdb_score"].as_f64().unwrap() >= 7.4));
}

#[test]
fn test_server_requires_existing_store() {
    let data_dir = std::env::temp_dir().join("netflix_daas_no_store");
    let _ = fs::remove_dir_all(&data_dir);
    fs::create_dir_all(&data_dir).unwrap();

    let config = Config::with_data_dir(PathBuf::from(&data_dir));
    match Store::open(&config) {
        Err(netflix_daas::DaasError::StoreNotFound(msg)) => {
            assert!(msg.contains("ingest load"));
        }
        other => panic!("expected StoreNotFound, got {:?}", other.map(|_| ())),
    }
}
