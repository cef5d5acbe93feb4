//! HTTP API Server for the Netflix analytics store
//!
//! Opens the single store handle at startup (ingestion must have run first)
//! and serves the fixed analytics routes plus the generic query endpoint.

use netflix_daas::analytics;
use netflix_daas::api::{handle_connection, AppState};
use netflix_daas::config::Config;
use netflix_daas::executor::QueryExecutor;
use netflix_daas::store::Store;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env();

    println!("🎬 Netflix Analytics API Server");
    println!("{}", "=".repeat(50));

    // The store handle is created once here and injected into the HTTP
    // layer; a missing store file is fatal at startup.
    let store = match Store::open(&config) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("❌ Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    let executor = QueryExecutor::new(Arc::clone(&store));
    let record_count = match executor.execute_canned(&analytics::count_rows(&config.table_name)) {
        Ok(envelope) => envelope
            .rows
            .first()
            .and_then(|row| row.get("count"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0),
        Err(e) => {
            eprintln!("❌ Failed to start server: {}", e);
            std::process::exit(1);
        }
    };
    println!("✅ Store connected: {} records loaded", record_count);

    let state = Arc::new(AppState::new(executor, config.clone()));

    let listener = TcpListener::bind(&config.bind_addr).await?;
    println!("✅ Server listening on {}", config.bind_addr);
    println!("\n📋 Available Endpoints:");
    println!("  - GET  /health");
    println!("  - GET  /api/health");
    println!("  - POST /api/query");
    println!("  - GET  /api/netflix/content-types");
    println!("  - GET  /api/netflix/top-rated?limit=10");
    println!("  - GET  /api/netflix/release-years");
    println!("  - GET  /api/netflix/age-ratings");
    println!("  - GET  /api/netflix/runtime-distribution");
    println!("  - GET  /api/netflix/highly-rated?minScore=8.5");

    loop {
        let (stream, addr) = listener.accept().await?;
        debug!("New connection from {}", addr);
        tokio::spawn(handle_connection(stream, Arc::clone(&state)));
    }
}
