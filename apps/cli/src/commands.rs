//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use releasewatch_api::AppState;
use releasewatch_core::{DraftPreview, ProgressReporter, ToolReport, run_sources};
use releasewatch_shared::{
    AppConfig, FetchConfig, config_file_path, init_config_at, load_config, load_config_from,
};
use releasewatch_sources::SourceRegistry;
use releasewatch_storage::Storage;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ReleaseWatch: track security-tool release notes.
#[derive(Parser)]
#[command(
    name = "releasewatch",
    version,
    about = "Scrape vendor release notes, track what changed, and serve them over HTTP.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.releasewatch/releasewatch.toml).
    #[arg(long, global = true, env = "RELEASEWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database path or libsql:// URL, overriding [database].url.
    #[arg(long, global = true, env = "RELEASEWATCH_DATABASE_URL")]
    pub database: Option<String>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

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
    /// Run the active sources once and reconcile their updates into storage.
    Run {
        /// Source key to run (repeatable). Defaults to [sources].enabled.
        #[arg(short, long = "source")]
        sources: Vec<String>,

        /// Print the run report as JSON instead of a tree.
        #[arg(long)]
        json: bool,
    },

    /// Fetch one source and print what it found, without touching storage.
    Preview {
        /// Source key (see `releasewatch sources`).
        source: String,

        /// Number of newest updates to show.
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// Print the preview as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Start the read-only query API.
    Serve {
        /// Listen address, overriding [api].bind.
        #[arg(long)]
        bind: Option<String>,
    },

    /// List registered sources.
    Sources,

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
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so reports on
/// stdout stay clean.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "releasewatch=info",
        1 => "releasewatch=debug,tower_http=debug",
        _ => "releasewatch=trace,tower_http=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
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
    let config_path = cli.config.clone();

    match cli.command {
        Command::Config { ref action } => match action {
            ConfigAction::Init => cmd_config_init(config_path.as_deref()),
            ConfigAction::Show => cmd_config_show(&resolve_config(&cli)?),
        },
        Command::Run { ref sources, json } => {
            cmd_run(&resolve_config(&cli)?, sources, json).await
        }
        Command::Preview {
            ref source,
            limit,
            json,
        } => cmd_preview(&resolve_config(&cli)?, source, limit, json).await,
        Command::Serve { ref bind } => cmd_serve(&resolve_config(&cli)?, bind.as_deref()).await,
        Command::Sources => cmd_sources(&resolve_config(&cli)?),
    }
}

/// Load the config file and apply CLI/env overrides.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            if !path.exists() {
                return Err(eyre!("config file not found: {}", path.display()));
            }
            load_config_from(path)?
        }
        None => load_config()?,
    };

    if let Some(database) = &cli.database {
        config.database.url = database.clone();
    }
    Ok(config)
}

/// Source keys for a run: explicit `--source` flags win over the config list.
fn run_keys(requested: &[String], config: &AppConfig) -> Vec<String> {
    if requested.is_empty() {
        config.sources.enabled.clone()
    } else {
        requested.to_vec()
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(config: &AppConfig, requested: &[String], json: bool) -> Result<()> {
    let registry = SourceRegistry::new(&FetchConfig::from(config))?;
    let keys = run_keys(requested, config);
    if keys.is_empty() {
        return Err(eyre!("no sources selected: pass --source or set [sources].enabled"));
    }
    let selected = registry.select(&keys)?;

    let storage = Storage::connect(&config.database).await?;
    info!(sources = ?keys, database = %config.database.url, "starting run");

    let progress = CliProgress::new(!json);
    let report = run_sources(&selected, &storage, &progress).await?;
    progress.finish();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.summary_line());
        println!("Stored updates: {}", storage.count_updates().await?);
    }
    Ok(())
}

async fn cmd_preview(config: &AppConfig, key: &str, limit: usize, json: bool) -> Result<()> {
    let registry = SourceRegistry::new(&FetchConfig::from(config))?;
    let source = registry
        .get(key)
        .ok_or_else(|| eyre!("unknown source '{key}' (available: {})", registry.keys().join(", ")))?;

    let spinner = spinner(format!("Fetching {} ({key})", source.tool_name()));
    let drafts = source.fetch_updates().await;
    spinner.finish_and_clear();

    let preview = DraftPreview::new(source.tool_name(), &drafts, limit);
    if json {
        println!("{}", serde_json::to_string_pretty(&preview)?);
    } else {
        print!("{}", preview.render());
    }
    Ok(())
}

async fn cmd_serve(config: &AppConfig, bind: Option<&str>) -> Result<()> {
    let storage = Storage::connect_readonly(&config.database).await?;
    let bind = bind.unwrap_or(&config.api.bind);
    info!(bind, database = %config.database.url, "starting query API");

    releasewatch_api::serve(AppState::new(storage, &config.api), bind).await?;
    Ok(())
}

fn cmd_sources(config: &AppConfig) -> Result<()> {
    let registry = SourceRegistry::new(&FetchConfig::from(config))?;
    for source in registry.iter() {
        let enabled = config.sources.enabled.iter().any(|k| k == source.key());
        println!(
            "{} {:<14} {}",
            if enabled { "*" } else { " " },
            source.key(),
            source.tool_name()
        );
    }
    println!();
    println!("* enabled in [sources].enabled");
    Ok(())
}

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };
    if path.exists() {
        return Err(eyre!("config already exists at {}", path.display()));
    }
    init_config_at(&path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner.set_message(message);
    spinner
}

/// CLI progress reporter: a spinner while sources run, with each tool's
/// report printed as soon as that tool finishes.
struct CliProgress {
    spinner: ProgressBar,
    print_reports: bool,
}

impl CliProgress {
    fn new(print_reports: bool) -> Self {
        Self {
            spinner: spinner("Starting".to_string()),
            print_reports,
        }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn source_started(&self, key: &str, tool: &str, index: usize, total: usize) {
        self.spinner
            .set_message(format!("[{index}/{total}] Fetching {tool} ({key})"));
    }

    fn drafts_fetched(&self, key: &str, count: usize) {
        self.spinner
            .set_message(format!("Reconciling {count} update(s) from {key}"));
    }

    fn draft_reconciled(&self, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Reconciling [{current}/{total}]"));
    }

    fn source_finished(&self, report: &ToolReport) {
        if self.print_reports {
            self.spinner.println(report.render());
        }
    }
}
