//! Ingest CLI - Fetches the Netflix dataset and loads it into the store

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use itertools::Itertools;
use netflix_daas::analytics;
use netflix_daas::config::Config;
use netflix_daas::executor::QueryExecutor;
use netflix_daas::ingestion::{IngestPipeline, IngestReport};
use netflix_daas::store::Store;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "ingest")]
#[command(about = "Netflix dataset ingestion for the analytics store")]
#[command(version)]
struct Args {
    /// Path to data directory (default: ./data)
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the source CSV dataset
    Fetch {
        /// Dataset URL (or set NETFLIX_CSV_URL)
        #[arg(long)]
        url: Option<String>,
    },
    /// Load the CSV into the store, verify it, and print the report
    Load,
    /// Print the structural report for an already-built store
    Inspect,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = Config::with_data_dir(args.data_dir);

    match args.command {
        Commands::Fetch { url } => fetch(&config, url).await,
        Commands::Load => load(&config),
        Commands::Inspect => inspect(&config),
    }
}

async fn fetch(config: &Config, url: Option<String>) -> Result<()> {
    println!("🎬 Netflix Dataset Download");
    println!("{}", "=".repeat(40));

    let Some(url) = url.or_else(|| config.dataset_url.clone()) else {
        bail!("no dataset URL given; pass --url or set NETFLIX_CSV_URL");
    };

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating data directory {}", config.data_dir.display()))?;

    info!("📥 Downloading dataset from {}", url);
    let bytes = reqwest::get(&url)
        .await
        .and_then(|resp| resp.error_for_status())
        .context("dataset download failed")?
        .bytes()
        .await
        .context("dataset download failed")?;

    let target = config.csv_path();
    std::fs::write(&target, &bytes)
        .with_context(|| format!("writing {}", target.display()))?;
    println!("✅ Dataset saved to {}", target.display());

    // Header + record-count sanity check before the file is trusted
    let mut reader = csv::Reader::from_path(&target)
        .with_context(|| format!("reading back {}", target.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .context("downloaded file has no CSV header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let record_count = reader.records().filter_map(|r| r.ok()).count();

    println!("📈 Dataset statistics:");
    println!("   Records: {}", record_count);
    println!("   Columns: {} ({})", headers.len(), headers.iter().join(", "));
    println!("   Size: {:.1} KB", bytes.len() as f64 / 1024.0);
    println!("\nNext step: ingest load");
    Ok(())
}

fn load(config: &Config) -> Result<()> {
    println!("🎬 Netflix Dataset Ingestion");
    println!("{}", "=".repeat(40));

    let pipeline = IngestPipeline::new(config.clone());
    match pipeline.run() {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Ingestion failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn inspect(config: &Config) -> Result<()> {
    let store = Arc::new(Store::open(config)?);
    let executor = QueryExecutor::new(store);

    let probe = executor.execute(&format!(
        "SELECT * FROM {} LIMIT 1",
        config.table_name
    ))?;
    let count = executor
        .execute_canned(&analytics::count_rows(&config.table_name))?
        .rows
        .first()
        .and_then(|row| row.get("count"))
        .and_then(|v| v.as_u64())
        .unwrap_or(0);

    println!("🗃️  Store: {}", config.store_path().display());
    println!("   Records: {}", count);
    println!("\n📋 Table Schema:");
    for column in &probe.columns {
        println!("   {:<22} {}", column.name, column.type_label);
    }

    println!("\n📈 Sample Analytics:");
    for query in analytics::library(&config.table_name, config.release_year_floor) {
        let envelope = executor.execute_canned(&query)?;
        println!("\n-- {} ({} rows)", query.name, envelope.metadata.row_count);
        for row in envelope.rows.iter().take(5) {
            let line = row.iter().map(|(k, v)| format!("{}={}", k, v)).join("  ");
            println!("   {}", line);
        }
    }
    Ok(())
}

fn print_report(report: &IngestReport) {
    println!(
        "\n✅ Loaded {} records in {}ms (run {})",
        report.rows_loaded, report.duration_ms, report.run_id
    );
    println!("   Verified count: {}", report.verified_count);
    println!("📍 Store: {}", report.store_path.display());

    println!("\n📋 Table Schema:");
    for column in &report.columns {
        println!(
            "   {:<22} {:<10} {} nulls ({:.1}%)",
            column.name, column.declared_type, column.null_count, column.null_percentage
        );
    }

    println!("\n📝 Generated artifacts:");
    println!("   - {}", report.setup_sql_path.display());
    println!("   - {}", report.analytics_sql_path.display());

    println!("\n📈 Sample Analytics:");
    for sample in &report.samples {
        println!(
            "\n-- {} ({} rows)",
            sample.title, sample.envelope.metadata.row_count
        );
        for row in sample.envelope.rows.iter().take(5) {
            let line = row.iter().map(|(k, v)| format!("{}={}", k, v)).join("  ");
            println!("   {}", line);
        }
    }

    println!("\n🎉 Ingestion complete. Next step: start the server binary.");
}
