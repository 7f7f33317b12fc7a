mod catalog;
mod enrich;
mod scrape;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use harvest_core::RendererKind;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "harvest")]
#[command(about = "Category catalog harvesting pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape category listings into per-category dataset files
    Scrape {
        /// Category listing URLs; defaults to the categories file
        urls: Vec<String>,
        /// Categories YAML file to read URLs and listing profile from
        #[arg(short, long)]
        categories: Option<PathBuf>,
        /// Directory to write `<category>_products.json` files into
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Base delay between page fetches to the same site
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Upper bound of random jitter added to the delay
        #[arg(long)]
        jitter_ms: Option<u64>,
        /// Page renderer: http or chrome
        #[arg(long)]
        renderer: Option<RendererKind>,
        /// Per-request timeout in seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout_secs: Option<u64>,
        /// Stop a category after this many pages
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        max_pages: Option<u64>,
        /// Categories scraped at the same time
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        concurrency: Option<u64>,
    },
    /// Build the product → categories index from dataset files
    Consolidate {
        /// Directory holding dataset files
        #[arg(short, long)]
        input_dir: Option<PathBuf>,
        /// Consolidated index output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Assign category ids and attach them to the raw product catalog
    Categories {
        /// Consolidated index to read
        #[arg(short, long)]
        consolidated: Option<PathBuf>,
        /// Category registry output file
        #[arg(long)]
        categories_output: Option<PathBuf>,
        /// Raw product catalog (JSON array)
        #[arg(long)]
        products_input: Option<PathBuf>,
        /// Updated product catalog output file
        #[arg(long)]
        products_output: Option<PathBuf>,
    },
    /// Run the external product scraper over every consolidated product id
    Enrich {
        /// Consolidated index to read product ids from
        #[arg(short, long)]
        consolidated: Option<PathBuf>,
        /// Output file for the enrichment results
        #[arg(short, long, default_value = "./result.json")]
        output: PathBuf,
        /// Products per batch; all at once when omitted
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        batch_size: Option<u64>,
        /// Print the commands instead of running them
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = harvest_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(env = %config.env, "configuration loaded");

    match cli.command {
        Commands::Scrape {
            urls,
            categories,
            output_dir,
            delay_ms,
            jitter_ms,
            renderer,
            timeout_secs,
            max_pages,
            concurrency,
        } => {
            let mut config = config;
            if let Some(ms) = delay_ms {
                config.scraper_page_delay_ms = ms;
            }
            if let Some(ms) = jitter_ms {
                config.scraper_page_jitter_ms = ms;
            }
            if let Some(kind) = renderer {
                config.scraper_renderer = kind;
            }
            if timeout_secs.is_some() {
                config.scraper_request_timeout_secs = timeout_secs;
            }
            if let Some(pages) = max_pages {
                config.scraper_max_pages = usize::try_from(pages)?;
            }
            if let Some(n) = concurrency {
                config.scraper_max_concurrent_categories = usize::try_from(n)?;
            }
            if let Some(dir) = output_dir {
                config.dataset_dir = dir;
            }
            scrape::run_scrape(&config, &urls, categories.as_deref()).await
        }
        Commands::Consolidate { input_dir, output } => {
            let input_dir = input_dir.unwrap_or_else(|| config.dataset_dir.clone());
            let output = output.unwrap_or_else(|| config.consolidated_path.clone());
            catalog::run_consolidate(&input_dir, &output)
        }
        Commands::Categories {
            consolidated,
            categories_output,
            products_input,
            products_output,
        } => {
            let consolidated = consolidated.unwrap_or_else(|| config.consolidated_path.clone());
            let registry = categories_output.unwrap_or_else(|| config.registry_path.clone());
            let input = products_input.unwrap_or_else(|| config.products_input_path.clone());
            let output = products_output.unwrap_or_else(|| config.products_output_path.clone());
            catalog::run_categories(&consolidated, &registry, &input, &output)
        }
        Commands::Enrich {
            consolidated,
            output,
            batch_size,
            dry_run,
        } => {
            let consolidated = consolidated.unwrap_or_else(|| config.consolidated_path.clone());
            let batch_size = batch_size.map(usize::try_from).transpose()?;
            enrich::run_enrich(&config, &consolidated, &output, batch_size, dry_run).await
        }
    }
}
