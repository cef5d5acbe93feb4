//! HTTP Endpoint Layer - Fixed routes over the Query Executor
//!
//! Hand-rolled HTTP over tokio: read the request with a timeout, parse the
//! request line and query string, dispatch on (method, path), write a JSON
//! response. State is constructor-injected so tests can drive `dispatch`
//! directly against a fixture store.

use crate::analytics;
use crate::config::Config;
use crate::error::DaasError;
use crate::executor::{QueryEnvelope, QueryExecutor};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{error, info};

pub struct AppState {
    pub executor: QueryExecutor,
    pub config: Config,
}

impl AppState {
    pub fn new(executor: QueryExecutor, config: Config) -> Self {
        Self { executor, config }
    }
}

/// A parsed inbound request: method, normalized path, raw query string, body.
#[derive(Debug)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub query_string: Option<String>,
    pub body: String,
}

/// Parse an HTTP/1.1 request buffer. Returns None when the request line is
/// unusable.
pub fn parse_request(raw: &str) -> Option<HttpRequest> {
    let request_line = raw.lines().next()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let full_path = parts.next()?.to_string();

    // Query string comes off before path normalization
    let (path_str, query_string) = match full_path.find('?') {
        Some(idx) => (
            full_path[..idx].to_string(),
            Some(full_path[idx + 1..].to_string()),
        ),
        None => (full_path, None),
    };

    // Normalize path (remove trailing slash except for root)
    let mut path = path_str.trim_end_matches('/').to_string();
    if path.is_empty() {
        path = "/".to_string();
    }

    let body = raw
        .find("\r\n\r\n")
        .map(|idx| raw[idx + 4..].to_string())
        .unwrap_or_default();

    Some(HttpRequest {
        method,
        path,
        query_string,
        body,
    })
}

/// Extract one query parameter, with minimal URL decoding.
pub fn query_param(query_string: Option<&str>, key: &str) -> Option<String> {
    let qs = query_string?;
    for param in qs.split('&') {
        if let Some((k, v)) = param.split_once('=') {
            if k == key {
                return Some(url_decode(v));
            }
        }
    }
    None
}

fn url_decode(value: &str) -> String {
    value
        .replace("%20", " ")
        .replace("%2B", "+")
        .replace("%2F", "/")
        .replace("%3D", "=")
        .replace("%26", "&")
        .replace("%3F", "?")
        .replace("%25", "%")
}

#[derive(Deserialize)]
struct QueryRequest {
    sql: Option<String>,
    #[serde(rename = "dataSourceId")]
    data_source_id: Option<String>,
}

/// Route a parsed request to its handler. Returns (status, JSON body).
pub fn dispatch(state: &AppState, req: &HttpRequest) -> (u16, String) {
    match (req.method.as_str(), req.path.as_str()) {
        ("GET", "/health") => handle_liveness(state),
        ("GET", "/api/health") => handle_store_health(state),
        ("POST", "/api/query") => handle_query(state, &req.body),
        ("GET", "/api/netflix/content-types") => envelope_response(
            state
                .executor
                .execute_canned(&analytics::content_types(&state.config.table_name)),
        ),
        ("GET", "/api/netflix/top-rated") => {
            let limit = match analytics::parse_limit(
                query_param(req.query_string.as_deref(), "limit").as_deref(),
            ) {
                Ok(limit) => limit,
                Err(e) => return error_response(e),
            };
            envelope_response(
                state
                    .executor
                    .execute_canned(&analytics::top_rated(&state.config.table_name, limit)),
            )
        }
        ("GET", "/api/netflix/release-years") => envelope_response(
            state.executor.execute_canned(&analytics::release_years(
                &state.config.table_name,
                state.config.release_year_floor,
            )),
        ),
        ("GET", "/api/netflix/age-ratings") => envelope_response(
            state
                .executor
                .execute_canned(&analytics::age_ratings(&state.config.table_name)),
        ),
        ("GET", "/api/netflix/runtime-distribution") => envelope_response(
            state
                .executor
                .execute_canned(&analytics::runtime_distribution(&state.config.table_name)),
        ),
        ("GET", "/api/netflix/highly-rated") => {
            let min_score = match analytics::parse_min_score(
                query_param(req.query_string.as_deref(), "minScore").as_deref(),
            ) {
                Ok(score) => score,
                Err(e) => return error_response(e),
            };
            envelope_response(
                state
                    .executor
                    .execute_canned(&analytics::highly_rated(&state.config.table_name, min_score)),
            )
        }
        ("OPTIONS", _) => (200, "{}".to_string()),
        (method, path) => {
            error!("404: {} {} not found", method, path);
            (
                404,
                json!({ "error": format!("Endpoint not found: {} {}", method, path) }).to_string(),
            )
        }
    }
}

fn handle_liveness(state: &AppState) -> (u16, String) {
    let database = state
        .executor
        .store()
        .path()
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| state.config.table_name.clone());

    let body = json!({
        "status": "healthy",
        "service": "netflix-daas",
        "database": database,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    (200, body.to_string())
}

fn handle_store_health(state: &AppState) -> (u16, String) {
    let source_id = state.config.data_source_id.as_str();
    let count_query = analytics::count_rows(&state.config.table_name);
    match state.executor.execute_canned(&count_query) {
        Ok(envelope) => {
            let record_count = envelope
                .rows
                .first()
                .and_then(|row| row.get("count"))
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            let body = json!({
                (source_id): {
                    "status": "healthy",
                    "details": {
                        "connected": true,
                        "recordCount": record_count,
                        "tableExists": true
                    }
                }
            });
            (200, body.to_string())
        }
        Err(e) => {
            let body = json!({
                (source_id): {
                    "status": "unhealthy",
                    "details": { "error": e.to_string() }
                }
            });
            (500, body.to_string())
        }
    }
}

fn handle_query(state: &AppState, body: &str) -> (u16, String) {
    let request: QueryRequest = match serde_json::from_str(body.trim()) {
        Ok(req) => req,
        Err(_) => {
            return error_response(DaasError::BadRequest("JSON body required".to_string()));
        }
    };

    let Some(sql) = request.sql else {
        return error_response(DaasError::BadRequest("SQL query is required".to_string()));
    };

    // Allow-list of exactly one logical data-source identifier
    if request.data_source_id.as_deref() != Some(state.config.data_source_id.as_str()) {
        return error_response(DaasError::BadRequest(format!(
            "Invalid data source. Use \"{}\"",
            state.config.data_source_id
        )));
    }

    envelope_response(state.executor.execute(&sql))
}

fn envelope_response(result: crate::error::Result<QueryEnvelope>) -> (u16, String) {
    match result {
        Ok(envelope) => (
            200,
            serde_json::to_string(&envelope)
                .unwrap_or_else(|e| json!({ "error": e.to_string() }).to_string()),
        ),
        Err(e) => error_response(e),
    }
}

fn error_response(e: DaasError) -> (u16, String) {
    (e.http_status(), json!({ "error": e.to_string() }).to_string())
}

pub fn create_response(status: u16, body: &str) -> String {
    format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: application/json\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
         Access-Control-Allow-Headers: Content-Type\r\n\
         Content-Length: {}\r\n\
         \r\n\
         {}",
        status,
        status_text(status),
        body.len(),
        body
    )
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

fn extract_content_length(request: &str) -> Option<usize> {
    for line in request.lines() {
        if line.to_lowercase().starts_with("content-length:") {
            if let Some(value) = line.split(':').nth(1) {
                return value.trim().parse().ok();
            }
        }
    }
    None
}

/// Read one request off the stream, dispatch it, write the response.
pub async fn handle_connection(mut stream: TcpStream, state: Arc<AppState>) {
    use tokio::time::{timeout, Duration};

    let mut buffer = Vec::new();
    let mut temp_buf = [0u8; 8192];

    let read_result = timeout(Duration::from_secs(5), async {
        loop {
            match stream.read(&mut temp_buf).await {
                Ok(0) => break,
                Ok(n) => {
                    buffer.extend_from_slice(&temp_buf[..n]);
                    if let Ok(s) = std::str::from_utf8(&buffer) {
                        if let Some(headers_end) = s.find("\r\n\r\n") {
                            match extract_content_length(s) {
                                Some(content_length) => {
                                    if buffer.len() >= headers_end + 4 + content_length {
                                        break;
                                    }
                                }
                                None => break,
                            }
                        }
                    }
                    // Bound the request size
                    if buffer.len() > 1_000_000 {
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to read from stream: {}", e);
                    return Err(e);
                }
            }
        }
        Ok(())
    })
    .await;

    if read_result.is_err() {
        error!("Request read timeout");
        return;
    }
    if buffer.is_empty() {
        return;
    }

    let raw = match String::from_utf8(buffer) {
        Ok(raw) => raw,
        Err(e) => {
            error!("Failed to parse request as UTF-8: {}", e);
            return;
        }
    };

    let (status, body) = match parse_request(&raw) {
        Some(req) => {
            info!("{} {}", req.method, req.path);
            dispatch(&state, &req)
        }
        None => (400, json!({ "error": "Bad Request" }).to_string()),
    };

    let response = create_response(status, &body);
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        error!("Failed to write response: {}", e);
    }
}
