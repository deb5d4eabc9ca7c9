use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use secmap_fetcher::{default_cache_dir, snapshot_path, store_path, FetchConfig, SecFetcher};
use secmap_resolver::{CikQuery, Company, CompanyService};
use secmap_store::CompanyStore;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "secmap")]
#[command(about = "Resolve SEC tickers, CIK numbers, and company names", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Contact e-mail for SEC requests (overrides SECMAP_CONTACT_EMAIL)
    #[arg(long, global = true)]
    contact_email: Option<String>,

    /// Cache directory (default: ~/.secmap)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one identifier to its company record(s)
    Resolve(ResolveArgs),

    /// Ranked search across tickers and company names
    Search(SearchArgs),

    /// Show cache counts, age, and staleness
    Info,

    /// Force a fresh download of the SEC dataset
    Refresh,

    /// Remove the in-memory cache and all cached files
    #[command(name = "clear-cache")]
    ClearCache,
}

#[derive(Args)]
struct ResolveArgs {
    /// Ticker, CIK, or company name
    identifier: String,

    /// Treat the identifier as this kind instead of inferring it
    #[arg(long, value_enum)]
    kind: Option<IdentifierKind>,

    /// Disable fuzzy name matching
    #[arg(long)]
    exact: bool,
}

#[derive(Copy, Clone, ValueEnum)]
enum IdentifierKind {
    Ticker,
    Cik,
    Name,
}

#[derive(Args)]
struct SearchArgs {
    query: String,

    /// Maximum number of results (a negative value counts as zero)
    #[arg(long, default_value_t = 10)]
    limit: i64,

    /// Exact matching only
    #[arg(long)]
    exact: bool,

    /// Restrict matching to company names
    #[arg(long)]
    names_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cache_dir = cli.cache_dir.clone().unwrap_or_else(default_cache_dir);
    let config = match &cli.contact_email {
        Some(email) => FetchConfig::with_contact_email(email.clone())?,
        None => FetchConfig::from_env(),
    };

    let fetcher = SecFetcher::new(config, snapshot_path(&cache_dir))?;
    let store = CompanyStore::new(store_path(&cache_dir));
    let service = CompanyService::new(Arc::new(fetcher), Arc::new(store));

    match cli.command {
        Commands::Resolve(args) => run_resolve(&service, args).await,
        Commands::Search(args) => run_search(&service, args).await,
        Commands::Info => {
            let info = service.cache_info().await?;
            print_json(&info)
        }
        Commands::Refresh => {
            service.refresh().await?;
            let info = service.cache_info().await?;
            print_json(&info)
        }
        Commands::ClearCache => {
            service.invalidate().await;
            Ok(())
        }
    }
}

async fn run_resolve(service: &CompanyService, args: ResolveArgs) -> Result<()> {
    let fuzzy = !args.exact;
    let companies: Vec<Company> = match args.kind {
        Some(IdentifierKind::Ticker) => service
            .resolve_ticker(&args.identifier)
            .await?
            .into_iter()
            .collect(),
        Some(IdentifierKind::Cik) => {
            service
                .resolve_cik(CikQuery::Text(args.identifier.clone()))
                .await?
        }
        Some(IdentifierKind::Name) => service
            .resolve_name(&args.identifier, fuzzy)
            .await?
            .into_iter()
            .collect(),
        None => service.resolve_any(args.identifier.as_str()).await?,
    };

    if companies.is_empty() {
        anyhow::bail!("No company matched '{}'", args.identifier);
    }
    print_json(&companies)
}

async fn run_search(service: &CompanyService, args: SearchArgs) -> Result<()> {
    let limit = usize::try_from(args.limit).unwrap_or(0);
    let fuzzy = !args.exact;
    let results = if args.names_only {
        service.search_names(&args.query, limit, fuzzy).await?
    } else {
        service.search(&args.query, limit, fuzzy).await?
    };
    print_json(&results)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}
