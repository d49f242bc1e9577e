use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use jobsift_client::{AnySource, DetailParser};
use jobsift_core::config::{DEFAULT_MAX_PAGES, MAX_PAGES_LIMIT};
use jobsift_core::export::{self, ExportFormat};
use jobsift_core::models::{Listing, SearchOutcome, SearchRequest, SearchStats, SourceMode};
use jobsift_core::{SearchService, SourceConfig};
use jobsift_db::{Database, DatabaseConfig};

#[derive(Parser)]
#[command(name = "jobsift", version, about = "Job listing search and export for hh.ru")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search listings and print them as JSON (or write an export file)
    Search {
        /// Search text
        #[arg(short, long)]
        query: String,

        /// City name (defaults to JOBSIFT_DEFAULT_CITY)
        #[arg(short, long)]
        city: Option<String>,

        /// Number of result pages to walk
        #[arg(
            short,
            long,
            default_value_t = DEFAULT_MAX_PAGES,
            value_parser = clap::value_parser!(u32).range(1..=MAX_PAGES_LIMIT as i64)
        )]
        pages: u32,

        /// Acquisition path: "api" or "scrape"
        #[arg(short, long, env = "JOBSIFT_MODE", default_value = "api")]
        mode: SourceMode,

        /// Persist the search and its listings (requires DATABASE_URL)
        #[arg(long, default_value_t = false)]
        save: bool,

        /// Write an export file instead of printing JSON ("csv", "tsv" or "xlsx")
        #[arg(short, long)]
        export: Option<ExportFormat>,

        /// Export directory (defaults to JOBSIFT_EXPORT_DIR)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Export the stored listings of a saved search
    Export {
        /// Search id printed by `search --save`
        #[arg(short, long)]
        search_id: Uuid,

        /// "csv", "tsv" or "xlsx"
        #[arg(short, long, default_value = "csv")]
        format: ExportFormat,

        /// Export directory (defaults to JOBSIFT_EXPORT_DIR)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Fetch one listing page and print its full description
    Details {
        /// Listing URL
        #[arg(short, long)]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobsift=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = SourceConfig::from_env().context("Invalid source configuration")?;

    match cli.command {
        Commands::Search {
            query,
            city,
            pages,
            mode,
            save,
            export,
            out,
        } => {
            let request = SearchRequest::new(query, city, pages);
            let outcome = cmd_search(&config, mode, request, save).await?;
            let out = out.unwrap_or_else(|| config.export_dir.clone());
            print_results(&outcome, export, &out)?;
        }
        Commands::Export {
            search_id,
            format,
            out,
        } => {
            let out = out.unwrap_or_else(|| config.export_dir.clone());
            cmd_export(search_id, format, &out).await?;
        }
        Commands::Details { url } => {
            let parser = DetailParser::browser().context("Failed to create HTTP client")?;
            let details = parser.fetch_details(&url).await;
            println!("{}", serde_json::to_string_pretty(&details)?);
        }
    }

    Ok(())
}

/// Connect to PostgreSQL using DATABASE_URL and apply migrations.
async fn connect_db() -> Result<Database> {
    let config = DatabaseConfig::from_env().context("--save and export need a database")?;
    let db = Database::connect(&config)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to run migrations")?;
    Ok(db)
}

async fn cmd_search(
    config: &SourceConfig,
    mode: SourceMode,
    request: SearchRequest,
    save: bool,
) -> Result<SearchOutcome> {
    let source = AnySource::from_config(mode, config).context("Failed to create listing source")?;

    let outcome = if save {
        let db = connect_db().await?;
        let city = request.city.as_deref().unwrap_or(&config.default_city);
        let search = db
            .search_repo()
            .create(&request.query, city)
            .await
            .context("Failed to record search")?;
        eprintln!("Search id: {}", search.id);

        let service = SearchService::with_store(source, db.listing_repo(), &config.default_city);
        service.run(&request.with_search_id(search.id)).await?
    } else {
        let service = SearchService::new(source, &config.default_city);
        service.run(&request).await?
    };

    Ok(outcome)
}

fn print_results(outcome: &SearchOutcome, format: Option<ExportFormat>, out: &Path) -> Result<()> {
    print_stats(&outcome.listings);
    if let Some(saved) = outcome.saved {
        eprintln!("Saved {saved} new listings");
    }

    match format {
        Some(format) => write_export(&outcome.listings, format, out)?,
        None => println!("{}", serde_json::to_string_pretty(&outcome.listings)?),
    }
    Ok(())
}

async fn cmd_export(search_id: Uuid, format: ExportFormat, out: &Path) -> Result<()> {
    let db = connect_db().await?;
    let search = db
        .search_repo()
        .get(search_id)
        .await?
        .with_context(|| format!("Search {search_id} not found"))?;

    let listings = db.listing_repo().list(search.id).await?;
    eprintln!("Search \"{}\" in {}", search.query, search.city);
    print_stats(&listings);
    write_export(&listings, format, out)
}

fn write_export(listings: &[Listing], format: ExportFormat, out: &Path) -> Result<()> {
    match export::export_to_dir(out, listings, format, None)? {
        Some(path) => println!("{}", path.display()),
        None => eprintln!("No listings to export"),
    }
    Ok(())
}

fn print_stats(listings: &[Listing]) {
    let stats = SearchStats::from_listings(listings);
    eprintln!(
        "Found {} listings ({} with salary, {} cities)",
        stats.total, stats.with_salary, stats.cities
    );
}
