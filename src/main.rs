//! Longchau-Harvest main entry point
//!
//! This is the command-line interface for the Long Châu product harvester.

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use longchau_harvest::config::{load_config_with_hash, Config};
use longchau_harvest::output::{print_summary, save_records, OutputFormat, RunSummary};
use longchau_harvest::{run_interruptible, CategoryTarget, Coordinator, CrawlMode, RunOutcome, Taxonomy};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Traversal selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// One category path (--category-url)
    Single,
    /// Subcategories of one main category (--main-category, --subcategories)
    Subcategory,
    /// A predefined group (--group)
    Group,
    /// Every category of the taxonomy
    All,
}

/// Longchau-Harvest: a product catalog harvester
///
/// Expands category listings with a headless browser, fetches every product
/// detail page and writes the extracted records as JSON and/or CSV.
#[derive(Parser, Debug)]
#[command(name = "longchau-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Harvests product records from the Long Châu catalog", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in configuration if omitted)
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Traversal mode
    #[arg(long, value_enum, default_value_t = Mode::Single)]
    mode: Mode,

    /// Category path (main/sub) or listing URL for single mode
    #[arg(short = 'u', long)]
    category_url: Option<String>,

    /// Main category for subcategory mode
    #[arg(long)]
    main_category: Option<String>,

    /// Subcategory slugs for subcategory mode (all known ones if omitted)
    #[arg(long, num_args = 1..)]
    subcategories: Vec<String>,

    /// Predefined group name for group mode
    #[arg(long)]
    group: Option<String>,

    /// Maximum number of products for single mode
    #[arg(short = 'n', long, default_value_t = 10)]
    max_products: usize,

    /// Maximum number of products per category in multi-category modes
    #[arg(long)]
    max_products_per_category: Option<usize>,

    /// Output format: json, jsonl, csv or both
    #[arg(short = 'f', long, default_value = "both")]
    output_format: OutputFormat,

    /// Output directory (overrides the configuration)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    match &cli.config {
        Some(path) => tracing::info!("Loading configuration from: {}", path.display()),
        None => tracing::info!("Using built-in configuration"),
    }
    let (config, config_hash) =
        load_config_with_hash(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let mode = crawl_mode(&cli, &config)?;

    if cli.dry_run {
        handle_dry_run(&cli, &config, &mode)
    } else {
        handle_harvest(&cli, &config, &mode).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("longchau_harvest=info,warn"),
            1 => EnvFilter::new("longchau_harvest=debug,info"),
            2 => EnvFilter::new("longchau_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Category path from either `main/sub` or a full listing URL
fn category_path(arg: &str, base: &str) -> String {
    match Url::parse(arg) {
        Ok(url) => {
            let base_path = Url::parse(base)
                .map(|b| b.path().to_string())
                .unwrap_or_default();
            let path = url.path();
            path.strip_prefix(base_path.as_str())
                .unwrap_or(path)
                .trim_matches('/')
                .to_string()
        }
        Err(_) => arg.trim_matches('/').to_string(),
    }
}

/// Translates the command line into a traversal mode
fn crawl_mode(cli: &Cli, config: &Config) -> anyhow::Result<CrawlMode> {
    let per_category = cli.max_products_per_category.or(Some(cli.max_products));

    let mode = match cli.mode {
        Mode::Single => {
            let Some(arg) = cli.category_url.as_deref() else {
                bail!("--category-url is required in single mode");
            };
            let path = category_path(arg, &config.site.base_url);
            CrawlMode::Single {
                target: CategoryTarget::parse(&path)?,
                max_products: Some(cli.max_products),
            }
        }
        Mode::Subcategory => {
            let Some(main) = cli.main_category.clone() else {
                bail!("--main-category is required in subcategory mode");
            };
            let subcategories = if cli.subcategories.is_empty() {
                Taxonomy::from_config(config)
                    .subcategories_of(&main)
                    .map(<[String]>::to_vec)
                    .with_context(|| format!("no subcategories known for '{}'", main))?
            } else {
                cli.subcategories.clone()
            };
            CrawlMode::Subcategories {
                main,
                subcategories,
                max_per_category: per_category,
            }
        }
        Mode::Group => {
            let Some(name) = cli.group.clone() else {
                bail!("--group is required in group mode");
            };
            CrawlMode::Group {
                name,
                max_per_category: per_category,
            }
        }
        Mode::All => CrawlMode::All {
            max_per_category: per_category,
        },
    };
    Ok(mode)
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(cli: &Cli, config: &Config, mode: &CrawlMode) -> anyhow::Result<()> {
    println!("=== Longchau-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Detail suffix: {}", config.site.detail_suffix);

    println!("\nHTTP:");
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!("  Max retries: {}", config.http.max_retries);

    println!("\nBrowser:");
    println!("  Headless: {}", config.browser.headless);
    println!(
        "  Viewport: {}x{}",
        config.browser.viewport_width, config.browser.viewport_height
    );
    println!("  Max load-more clicks: {}", config.browser.max_load_more_clicks);

    println!("\nDelay: {}-{}ms", config.delay.min_ms, config.delay.max_ms);

    println!("\nOutput:");
    println!("  Directory: {}", output_dir(cli, config).display());
    println!("  Format: {}", cli.output_format);

    let targets = Taxonomy::from_config(config).resolve(mode)?;
    println!("\nTargets ({}):", targets.len());
    for target in &targets {
        println!("  - {}", target);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would harvest {} categor(ies)", targets.len());

    Ok(())
}

fn output_dir(cli: &Cli, config: &Config) -> PathBuf {
    cli.output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.directory))
}

/// Handles the main harvest operation
async fn handle_harvest(cli: &Cli, config: &Config, mode: &CrawlMode) -> anyhow::Result<()> {
    let mut coordinator =
        Coordinator::from_config(config).context("failed to set up the harvester")?;

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let outcome = run_interruptible(&mut coordinator, mode, interrupt).await;
    if let Ok(RunOutcome::Interrupted) = outcome {
        tracing::warn!("Saving {} record(s) gathered before the interrupt", coordinator.state().len());
    }

    // Flush whatever was accumulated, whatever ended the run
    let saved = save_records(
        coordinator.state(),
        cli.output_format,
        &output_dir(cli, config),
        &config.output.file_prefix,
    );

    if !cli.quiet {
        print_summary(&RunSummary::from_state(coordinator.state()));
    }

    outcome.context("harvest failed")?;
    for path in saved.context("failed to save records")? {
        println!("✓ Saved: {}", path.display());
    }

    Ok(())
}
