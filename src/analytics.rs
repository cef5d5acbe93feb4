//! Canned analytical statements for the Netflix store
//!
//! Server-authored SQL exposed via dedicated routes. Caller-supplied knobs
//! (`limit`, `minScore`) are parsed into typed numbers and range-checked
//! before they are rendered into a statement; the engine's SQL interface
//! takes a single statement string, so typed validation stands in for
//! parameter binding.

use crate::error::{DaasError, Result};

pub const DEFAULT_LIMIT: i64 = 20;
pub const DEFAULT_MIN_SCORE: f64 = 8.0;

const LIMIT_RANGE: std::ops::RangeInclusive<i64> = 1..=1000;
const MIN_SCORE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=10.0;

/// A fixed, server-authored statement with a display name for logs and the
/// generated query library.
#[derive(Clone, Debug)]
pub struct CannedQuery {
    pub name: &'static str,
    pub sql: String,
}

/// Parse and bound the `limit` query parameter. Absent means the default.
pub fn parse_limit(raw: Option<&str>) -> Result<i64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_LIMIT);
    };
    let limit: i64 = raw
        .trim()
        .parse()
        .map_err(|_| DaasError::BadRequest(format!("limit must be an integer, got '{}'", raw)))?;
    if !LIMIT_RANGE.contains(&limit) {
        return Err(DaasError::BadRequest(format!(
            "limit must be between {} and {}",
            LIMIT_RANGE.start(),
            LIMIT_RANGE.end()
        )));
    }
    Ok(limit)
}

/// Parse and bound the `minScore` query parameter. Absent means the default.
pub fn parse_min_score(raw: Option<&str>) -> Result<f64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_MIN_SCORE);
    };
    let score: f64 = raw
        .trim()
        .parse()
        .map_err(|_| DaasError::BadRequest(format!("minScore must be a number, got '{}'", raw)))?;
    if !MIN_SCORE_RANGE.contains(&score) {
        return Err(DaasError::BadRequest(format!(
            "minScore must be between {} and {}",
            MIN_SCORE_RANGE.start(),
            MIN_SCORE_RANGE.end()
        )));
    }
    Ok(score)
}

pub fn count_rows(table: &str) -> CannedQuery {
    CannedQuery {
        name: "Record Count",
        sql: format!("SELECT COUNT(*) AS count FROM {}", table),
    }
}

pub fn content_types(table: &str) -> CannedQuery {
    CannedQuery {
        name: "Content Type Distribution",
        sql: format!(
            "SELECT \
                type, \
                COUNT(*) AS count, \
                ROUND(AVG(imdb_score), 2) AS avg_imdb_score, \
                ROUND(AVG(runtime), 0) AS avg_runtime \
            FROM {} \
            WHERE imdb_score IS NOT NULL \
            GROUP BY type \
            ORDER BY count DESC",
            table
        ),
    }
}

pub fn top_rated(table: &str, limit: i64) -> CannedQuery {
    CannedQuery {
        name: "Top Rated Content",
        sql: format!(
            "SELECT \
                title, \
                type, \
                release_year, \
                imdb_score, \
                imdb_votes, \
                runtime, \
                age_certification \
            FROM {} \
            WHERE imdb_score IS NOT NULL \
            ORDER BY imdb_score DESC, imdb_votes DESC \
            LIMIT {}",
            table, limit
        ),
    }
}

pub fn release_years(table: &str, year_floor: i32) -> CannedQuery {
    CannedQuery {
        name: "Content by Release Year",
        sql: format!(
            "SELECT \
                release_year, \
                COUNT(*) AS total_content, \
                SUM(CASE WHEN type = 'MOVIE' THEN 1 ELSE 0 END) AS movies, \
                SUM(CASE WHEN type = 'SHOW' THEN 1 ELSE 0 END) AS shows, \
                ROUND(AVG(imdb_score), 2) AS avg_imdb_score \
            FROM {} \
            WHERE release_year >= {} \
            GROUP BY release_year \
            ORDER BY release_year DESC",
            table, year_floor
        ),
    }
}

pub fn age_ratings(table: &str) -> CannedQuery {
    CannedQuery {
        name: "Age Certification Analysis",
        sql: format!(
            "SELECT \
                COALESCE(age_certification, 'Not Rated') AS age_certification, \
                COUNT(*) AS content_count, \
                ROUND(AVG(imdb_score), 2) AS avg_rating, \
                ROUND(AVG(runtime), 0) AS avg_runtime_minutes \
            FROM {} \
            GROUP BY COALESCE(age_certification, 'Not Rated') \
            ORDER BY content_count DESC",
            table
        ),
    }
}

const RUNTIME_BUCKETS: &str = "CASE \
    WHEN runtime < 30 THEN 'Short (< 30 min)' \
    WHEN runtime < 60 THEN 'Medium (30-60 min)' \
    WHEN runtime < 90 THEN 'Standard (60-90 min)' \
    WHEN runtime < 120 THEN 'Long (90-120 min)' \
    WHEN runtime < 180 THEN 'Extended (2-3 hours)' \
    ELSE 'Epic (3+ hours)' \
END";

pub fn runtime_distribution(table: &str) -> CannedQuery {
    CannedQuery {
        name: "Runtime Distribution",
        sql: format!(
            "SELECT \
                {buckets} AS runtime_category, \
                COUNT(*) AS count, \
                ROUND(AVG(imdb_score), 2) AS avg_score, \
                MIN(runtime) AS min_runtime, \
                MAX(runtime) AS max_runtime \
            FROM {table} \
            WHERE runtime IS NOT NULL \
            GROUP BY {buckets} \
            ORDER BY count DESC",
            buckets = RUNTIME_BUCKETS,
            table = table
        ),
    }
}

pub fn highly_rated(table: &str, min_score: f64) -> CannedQuery {
    CannedQuery {
        name: "Highly Rated Content",
        sql: format!(
            "SELECT \
                title, \
                type, \
                release_year, \
                age_certification, \
                runtime, \
                imdb_score, \
                imdb_votes \
            FROM {} \
            WHERE imdb_score >= {} \
            ORDER BY imdb_score DESC, imdb_votes DESC",
            table, min_score
        ),
    }
}

/// The full canned-query library, in the order it is written to the generated
/// analytics script and run in the ingestion report.
pub fn library(table: &str, year_floor: i32) -> Vec<CannedQuery> {
    vec![
        content_types(table),
        top_rated(table, DEFAULT_LIMIT),
        release_years(table, year_floor),
        age_ratings(table),
        runtime_distribution(table),
        highly_rated(table, DEFAULT_MIN_SCORE),
    ]
}
