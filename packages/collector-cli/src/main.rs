//! Collector CLI
//!
//! Replays recorded exchanges through the collector into a SQLite database,
//! and browses what was collected.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use collector::{
    Category, Collector, CollectorConfig, DataStore, HostQuery, ScopeFilter, SqliteStore,
};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod record;

use record::ExchangeRecord;

const DEFAULT_DATABASE_URL: &str = "sqlite://collector.db?mode=rwc";

#[derive(Parser)]
#[command(name = "collector")]
#[command(about = "Passive HTTP artifact collector")]
#[command(version)]
struct Cli {
    /// Database URL (defaults to COLLECTOR_DATABASE_URL, then ./collector.db)
    #[arg(short, long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run recorded exchanges (JSON lines) through the collector
    Ingest {
        /// File with one exchange record per line
        file: PathBuf,
    },

    /// List hosts that have data in a category
    Hosts {
        /// Category (e.g. Param, Value, Path, "All Param")
        #[arg(short, long, default_value = "Param")]
        category: String,

        /// Only hosts matching this partial name
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Show collected artifacts, most frequent first
    Query {
        /// Category (e.g. Param, Value, Path, "All Param")
        #[arg(short, long, default_value = "Param")]
        category: String,

        /// Host, or `*` for every host
        #[arg(long, default_value = "*")]
        host: String,

        /// Maximum rows to show
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },
}

fn main() -> ExitCode {
    // Load environment variables
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,collector=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_writer(std::io::stderr),
        )
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = runtime.block_on(run(Cli::parse())) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> Result<()> {
    let database_url = cli
        .database
        .or_else(|| std::env::var("COLLECTOR_DATABASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

    let store = SqliteStore::new(&database_url)
        .await
        .with_context(|| format!("Failed to open database {database_url}"))?;

    match cli.command {
        Commands::Ingest { file } => cmd_ingest(store, file).await,
        Commands::Hosts { category, filter } => cmd_hosts(&store, &category, filter).await,
        Commands::Query {
            category,
            host,
            limit,
        } => cmd_query(&store, &category, &host, limit).await,
    }
}

async fn cmd_ingest(store: SqliteStore, file: PathBuf) -> Result<()> {
    let config = CollectorConfig::from_env().context("Invalid collector configuration")?;
    let filter = ScopeFilter::from_config(&config);
    let collector = Arc::new(Collector::with_config(Arc::new(store), filter, config)?);

    let reader = BufReader::new(
        File::open(&file).with_context(|| format!("Failed to open {}", file.display()))?,
    );

    // Reading and extraction are blocking work; persistence still lands on the runtime
    let worker = Arc::clone(&collector);
    let skipped = tokio::task::spawn_blocking(move || replay(&worker, reader))
        .await
        .context("Ingest worker panicked")??;

    collector.flush().await;
    let stats = collector.stats();

    println!("{}", "Ingest complete".bright_green().bold());
    println!("  Exchanges:   {}", stats.exchanges);
    println!("  Excluded:    {}", stats.excluded);
    println!("  Cache hits:  {}", stats.cache_hits);
    println!("  JSON parses: {}", stats.json_parses);
    println!("  HTML pages:  {}", stats.html_scrapes);
    println!("  Stored:      {}", stats.persisted.to_string().green());
    if stats.persist_failures > 0 {
        println!("  Failed:      {}", stats.persist_failures.to_string().red());
    }
    if skipped > 0 {
        println!("  Skipped:     {}", skipped.to_string().yellow());
    }

    Ok(())
}

/// Feed every record to the collector. Returns how many lines were skipped.
fn replay(
    collector: &Collector<SqliteStore, ScopeFilter>,
    reader: BufReader<File>,
) -> Result<u64> {
    let mut skipped = 0u64;
    for (number, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }
        match ExchangeRecord::parse(&line) {
            Ok(record) => {
                collector.collect(&record.into_exchange());
            }
            Err(e) => {
                skipped += 1;
                tracing::warn!(line = number + 1, error = %e, "skipping malformed record");
            }
        }
    }
    Ok(skipped)
}

async fn cmd_hosts(store: &SqliteStore, category: &str, filter: Option<String>) -> Result<()> {
    let category: Category = category.parse()?;
    let hosts = match filter {
        Some(input) => store.suggest_hosts(category, &input).await?,
        None => store.list_hosts(category).await?,
    };

    if hosts.is_empty() {
        println!("{}", "No hosts found".yellow());
    }
    for host in hosts {
        println!("{host}");
    }
    Ok(())
}

async fn cmd_query(store: &SqliteStore, category: &str, host: &str, limit: usize) -> Result<()> {
    let category: Category = category.parse()?;
    let Some(query) = HostQuery::from_input(category, host) else {
        bail!("a host (or `*`) is required for {category}");
    };

    let rows = store.query(&query, category, limit).await?;
    println!(
        "{} {}",
        category.to_string().bold(),
        match &query {
            HostQuery::Any => "(all hosts)".dimmed().to_string(),
            HostQuery::Exact(h) => h.cyan().to_string(),
        }
    );

    if rows.is_empty() {
        println!("{}", "No data collected".yellow());
        return Ok(());
    }
    for row in rows {
        let count = format!("{:>6}", row.count);
        match row.value {
            Some(value) => println!("{}  {} = {}", count.green(), row.name, value),
            None => println!("{}  {}", count.green(), row.name),
        }
    }
    Ok(())
}
