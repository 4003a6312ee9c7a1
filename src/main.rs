use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use openstates_web::admin;
use openstates_web::config::Config;
use openstates_web::import;
use openstates_web::logging;
use openstates_web::metrics;
use openstates_web::server;
use openstates_web::state::AppState;
use openstates_web::storage::{SqliteStorage, Storage};

#[derive(Parser)]
#[command(name = "openstates_web")]
#[command(about = "Legislative data API, bill pages and people admin tooling")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./openstates.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path, overrides configuration
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (GraphQL API, pages, admin endpoints)
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create or upgrade the database schema
    Migrate,
    /// Import a JSON data dump
    Load {
        path: PathBuf,
    },
    /// Refresh the unmatched sponsor/voter names of a session
    UpdateUnmatched {
        /// State abbreviation, e.g. ak
        state: String,
        session: String,
    },
    /// Print unmatched sponsor and voter names of a session without saving them
    CheckNames {
        state: String,
        session: String,
    },
}

fn open_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = SqliteStorage::open(&config.database.path)
        .with_context(|| format!("opening database {}", config.database.path.display()))?;
    Ok(Arc::new(storage))
}

fn print_counts(label: &str, counts: &std::collections::HashMap<String, i64>) {
    let mut rows: Vec<(&String, &i64)> = counts.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    println!("{label}: {}", rows.len());
    for (name, count) in rows {
        println!("  {count:>5}  {name}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(path) = cli.database {
        config.database.path = path;
    }

    let _log_guard = logging::init_logging(&config.logging);

    match cli.command {
        Commands::Serve { port } => {
            if let Err(e) = metrics::init() {
                warn!(error = %e, "metrics disabled");
            }
            let port = port.unwrap_or(config.server.port);
            let storage = open_storage(&config)?;
            let state = AppState::from_config(storage, &config);
            server::start_server(state, &config.server.static_dir, port).await?;
        }
        Commands::Migrate => {
            open_storage(&config)?;
            info!(path = %config.database.path.display(), "Database schema is up to date");
        }
        Commands::Load { path } => {
            let storage = open_storage(&config)?;
            let summary = import::load_dump(storage.as_ref(), &path)
                .await
                .with_context(|| format!("loading {}", path.display()))?;
            println!(
                "Imported {} jurisdictions, {} people, {} bills, {} votes",
                summary.jurisdictions, summary.people, summary.bills, summary.votes
            );
        }
        Commands::UpdateUnmatched { state, session } => {
            let storage = open_storage(&config)?;
            let outcome = admin::update_unmatched(storage.as_ref(), &state, &session).await?;
            println!(
                "{state} {session}: {} names updated, {} removed",
                outcome.upserted, outcome.removed
            );
        }
        Commands::CheckNames { state, session } => {
            let storage = open_storage(&config)?;
            let session = admin::find_session(storage.as_ref(), &state, &session).await?;
            print_counts(
                "Unmatched sponsors",
                &admin::check_sponsorships(storage.as_ref(), &session).await?,
            );
            print_counts(
                "Unmatched voters",
                &admin::check_votes(storage.as_ref(), &session).await?,
            );
        }
    }
    Ok(())
}
