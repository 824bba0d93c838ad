//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use arxivdaily_core::pipeline::{DailyConfig, ProgressReporter, RunSummary};
use arxivdaily_core::publish::FileReport;
use arxivdaily_core::update::UpdateLinksConfig;
use arxivdaily_shared::{AppConfig, CONFIG_FILE_NAME, init_config, load_config, resolve_api_key};
use arxivdaily_storage::WriteOutcome;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// arxiv-daily: keep a list of new arxiv papers per topic.
#[derive(Parser)]
#[command(
    name = "arxiv-daily",
    version,
    about = "Fetch new arxiv papers per topic and publish them as JSON and markdown.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the TOML config file.
    #[arg(long, env = "ARXIV_DAILY_CONFIG", default_value = CONFIG_FILE_NAME, global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch new papers and update the indexes and markdown.
    Run {
        /// Only refresh code links of already indexed papers.
        #[arg(long)]
        update_paper_links: bool,

        /// API key for abstract summaries (defaults to the configured env var).
        #[arg(long)]
        google_api_key: Option<String>,

        /// Ignore papers published before this date (YYYY-MM-DD).
        #[arg(long, value_parser = parse_date)]
        since: Option<NaiveDate>,

        /// Papers to request per topic (overrides `fetch.max_results`).
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_results: Option<u32>,

        /// Skip abstract summaries for this run.
        #[arg(long)]
        no_summary: bool,
    },

    /// Re-render markdown from the existing JSON indexes (no network).
    Render,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a config file with the default topics.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Show resolved configuration.
    Show,
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    // Library crates log under `arxivdaily_*`, the binary under `arxiv_daily`.
    let filter = match cli.verbose {
        0 => "arxivdaily=info,arxiv_daily=info",
        1 => "arxivdaily=debug,arxiv_daily=debug",
        _ => "arxivdaily=trace,arxiv_daily=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            update_paper_links: true,
            ..
        } => cmd_update_links(&cli.config).await,
        Command::Run {
            update_paper_links: false,
            google_api_key,
            since,
            max_results,
            no_summary,
        } => {
            cmd_run(
                &cli.config,
                google_api_key.as_deref(),
                since,
                max_results,
                no_summary,
            )
            .await
        }
        Command::Render => cmd_render(&cli.config),
        Command::Config { action } => match action {
            ConfigAction::Init { force } => cmd_config_init(&cli.config, force),
            ConfigAction::Show => cmd_config_show(&cli.config),
        },
    }
}

fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().wrap_err("cannot determine working directory")
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(
    config_path: &Path,
    google_api_key: Option<&str>,
    since: Option<NaiveDate>,
    max_results: Option<u32>,
    no_summary: bool,
) -> Result<()> {
    let app = load_config(config_path)?;
    let api_key = resolve_api_key(&app, google_api_key);

    info!(
        topics = app.topics.len(),
        summaries = !no_summary && app.summarizer.enabled && api_key.is_some(),
        "running daily update"
    );

    let config = DailyConfig {
        app,
        root: current_dir()?,
        today: today(),
        since,
        max_results,
        api_key,
        summarize: !no_summary,
    };

    let reporter = CliProgress::new();
    let summary = arxivdaily_core::pipeline::run_daily(&config, &reporter).await?;

    println!();
    println!("  Daily update complete.");
    println!("  Fetched:    {}", summary.papers_fetched);
    println!("  New:        {}", summary.papers_added);
    println!("  Code links: {}", summary.code_links_found);
    println!("  Summaries:  {}", summary.summaries);
    print_files(&summary.files);
    println!("  Time:       {:.1}s", summary.elapsed.as_secs_f64());
    println!();
    Ok(())
}

async fn cmd_update_links(config_path: &Path) -> Result<()> {
    let app = load_config(config_path)?;

    info!("updating paper code links");

    let config = UpdateLinksConfig {
        app,
        root: current_dir()?,
        today: today(),
    };

    let reporter = CliProgress::new();
    let summary = arxivdaily_core::update::update_links(&config, &reporter).await?;

    println!();
    println!("  Code links updated.");
    println!("  Found:      {}", summary.code_links_found);
    print_files(&summary.files);
    println!("  Time:       {:.1}s", summary.elapsed.as_secs_f64());
    println!();
    Ok(())
}

fn cmd_render(config_path: &Path) -> Result<()> {
    let app = load_config(config_path)?;
    let files = arxivdaily_core::publish::render_all(&app, &current_dir()?, today())?;

    println!();
    println!("  Markdown re-rendered.");
    print_files(&files);
    println!();
    Ok(())
}

fn cmd_config_init(config_path: &Path, force: bool) -> Result<()> {
    let path = init_config(config_path, force)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: &Path) -> Result<()> {
    let config: AppConfig = load_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("# {}", config_path.display());
    println!("{toml_str}");

    let key_state = match resolve_api_key(&config, None) {
        Some(_) => "set",
        None => "not set",
    };
    println!("# {} is {key_state}", config.summarizer.api_key_env);
    Ok(())
}

fn print_files(files: &[FileReport]) {
    for file in files {
        let state = match file.outcome {
            WriteOutcome::Written => "written",
            WriteOutcome::Unchanged => "unchanged",
        };
        println!("  {state:<11} {}", file.path.display());
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn topic_fetched(&self, topic: &str, new_papers: usize, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Fetched [{current}/{total}] {topic}: {new_papers} new"));
    }

    fn paper_enriched(&self, id: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Enriching [{current}/{total}] {id}"));
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}
