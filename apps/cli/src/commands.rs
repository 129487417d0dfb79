//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use vulnfeed_shared::{
    AppConfig, IngestState, config_file_path, init_config, load_config, validate_provider,
};
use vulnfeed_store::Store;
use vulnfeed_transform::{ErrorPolicy, TransformResult, transform_snapshot};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// vulnfeed: normalize security-advisory feed snapshots.
#[derive(Parser)]
#[command(
    name = "vulnfeed",
    version,
    about = "Normalize Known Exploited Vulnerabilities feed snapshots into a matching-ready store.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
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
    /// Transform a snapshot into normalized envelopes, printed as JSON.
    Transform {
        /// Path to the snapshot file.
        snapshot: PathBuf,

        /// Write envelopes to this file instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Per-record error policy: skip or abort. Overrides config.
        #[arg(long)]
        policy: Option<String>,
    },

    /// Transform a snapshot and persist it into the database.
    Ingest {
        /// Path to the snapshot file.
        snapshot: PathBuf,

        /// Database path. Overrides config.
        #[arg(long)]
        db: Option<PathBuf>,

        /// Per-record error policy: skip or abort. Overrides config.
        #[arg(long)]
        policy: Option<String>,
    },

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

/// Workspace crates covered by the default log filter. Listed explicitly
/// because env-filter directives match whole target segments, so a bare
/// `vulnfeed` prefix would not cover `vulnfeed_store` and friends.
const LOG_TARGETS: [&str; 5] = [
    "vulnfeed_cli",
    "vulnfeed_feed",
    "vulnfeed_transform",
    "vulnfeed_store",
    "vulnfeed_shared",
];

/// Initialize tracing based on CLI flags. `RUST_LOG` overrides the computed
/// filter entirely.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let directives = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    let builder = fmt().with_env_filter(env_filter);
    match cli.log_format {
        LogFormat::Text => builder.with_target(false).init(),
        LogFormat::Json => builder.json().init(),
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Transform {
            snapshot,
            out,
            policy,
        } => cmd_transform(&snapshot, out.as_deref(), policy.as_deref()).await,
        Command::Ingest {
            snapshot,
            db,
            policy,
        } => cmd_ingest(&snapshot, db.as_deref(), policy.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_transform(
    snapshot: &Path,
    out: Option<&Path>,
    policy: Option<&str>,
) -> Result<()> {
    let config = load_config()?;
    validate_provider(&config)?;
    let policy = resolve_policy(&config, policy)?;

    info!(snapshot = %snapshot.display(), ?policy, "transforming snapshot");

    let result = run_transform(&config, snapshot, policy)?;
    let json = serde_json::to_string_pretty(&result.envelopes)?;

    match out {
        Some(path) => {
            std::fs::write(path, json)?;
            print_summary(&result, Some(path));
        }
        None => println!("{json}"),
    }

    Ok(())
}

async fn cmd_ingest(
    snapshot: &Path,
    db: Option<&Path>,
    policy: Option<&str>,
) -> Result<()> {
    let config = load_config()?;
    validate_provider(&config)?;
    let policy = resolve_policy(&config, policy)?;

    let db_path = db
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.defaults.db_path));

    info!(
        snapshot = %snapshot.display(),
        db = %db_path.display(),
        ?policy,
        "ingesting snapshot"
    );

    let spinner = make_spinner();

    spinner.set_message("Opening database");
    let store = Store::open(&db_path).await?;
    let run_id = store.insert_ingest_run(&config.provider.name).await?;

    spinner.set_message("Transforming snapshot");
    let result = run_transform(&config, snapshot, policy)?;

    spinner.set_message("Writing entities");
    let mut written = 0;
    for envelope in &result.envelopes {
        written += store.dispatch_envelope(envelope).await?;
    }

    let stats = serde_json::json!({
        "entities": written,
        "skipped": result.skipped.len(),
    });
    store.finish_ingest_run(&run_id, &stats.to_string()).await?;

    spinner.finish_and_clear();

    println!();
    println!("  Snapshot ingested!");
    println!("  Provider: {}", config.provider.name);
    println!("  Entities: {written}");
    println!("  Skipped:  {}", result.skipped.len());
    println!("  Database: {}", db_path.display());
    println!();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config written to {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let path = config_file_path()?;

    println!("# resolved config ({})", path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Read, digest, and transform a snapshot with the configured identity.
fn run_transform(
    config: &AppConfig,
    snapshot: &Path,
    policy: ErrorPolicy,
) -> Result<TransformResult> {
    let records = vulnfeed_feed::read_snapshot(snapshot)?;
    let listing = vulnfeed_feed::snapshot_digest(snapshot)?;

    let state = IngestState {
        provider: config.provider.name.clone(),
        version: config.provider.version,
        processor: config.provider.processor.clone(),
        timestamp: chrono::Utc::now(),
        listing: Some(listing),
    };

    Ok(transform_snapshot(&records, &state, policy)?)
}

/// Resolve the error policy from the CLI flag or config default.
fn resolve_policy(config: &AppConfig, flag: Option<&str>) -> Result<ErrorPolicy> {
    let raw = flag.unwrap_or(&config.defaults.error_policy);
    raw.parse::<ErrorPolicy>()
        .map_err(|e| eyre!(e.to_string()))
}

fn print_summary(result: &TransformResult, out: Option<&Path>) {
    let entities: usize = result.envelopes.iter().map(|e| e.entities.len()).sum();
    println!();
    println!("  Snapshot transformed!");
    println!("  Entities: {entities}");
    println!("  Skipped:  {}", result.skipped.len());
    if let Some(path) = out {
        println!("  Output:   {}", path.display());
    }
    println!();
}

/// Build the CLI progress spinner.
fn make_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}
