//! CLI command definitions, routing, and tracing setup.

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::info;

use postnote_core::{ApplyOutcome, MigrationReport, ProgressReporter, run_migration};
use postnote_shared::{AppConfig, RunConfig, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Postnote — add endnote blocks to posts.
#[derive(Parser)]
#[command(
    name = "postnote",
    version,
    about = "Add an endnote HTML block to posts over the Admin API.",
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
    /// Add (or refresh) the endnote block on the targeted posts.
    Add {
        /// URL of the Admin API.
        api_url: String,

        /// Admin API key.
        admin_key: String,

        /// Comma-separated list of post ids, inside single quotes, i.e. 'id1,id2,id3'.
        #[arg(long, value_name = "IDS")]
        post_ids: String,

        /// Content for the endnote block (defaults to "Test endnote content").
        #[arg(long)]
        content: Option<String>,

        /// The delay between API calls, in ms (defaults to 50).
        #[arg(long, value_name = "MS")]
        delay_between_calls: Option<u64>,
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

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = ["cli", "core", "store", "shared", "transform"]
        .map(|krate| format!("postnote_{krate}={level}"))
        .join(",");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Add {
            api_url,
            admin_key,
            post_ids,
            content,
            delay_between_calls,
        } => {
            cmd_add(
                &api_url,
                &admin_key,
                &post_ids,
                content.as_deref(),
                delay_between_calls,
                cli.verbose,
            )
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// add
// ---------------------------------------------------------------------------

async fn cmd_add(
    api_url: &str,
    admin_key: &str,
    post_ids: &str,
    content: Option<&str>,
    delay_between_calls: Option<u64>,
    verbose: u8,
) -> Result<()> {
    let config = load_config()?;

    let ids: Vec<String> = post_ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect();

    let mut run_config = RunConfig::from_app_config(&config, api_url, admin_key, ids);
    if let Some(content) = content {
        run_config.content = content.to_string();
    }
    if let Some(delay) = delay_between_calls {
        run_config.delay_between_calls_ms = delay;
    }

    info!(
        api_url,
        posts = run_config.post_ids.len(),
        delay_ms = run_config.delay_between_calls_ms,
        "adding endnote block to posts"
    );

    // Ctrl-C lets the in-flight write finish, then stops the batch.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let reporter = CliProgress::new();
    let report = run_migration(run_config, &reporter, cancel).await?;

    print_report(&report, verbose);

    Ok(())
}

/// Print the run summary: itemized failures (detail gated behind -v),
/// then the success line when anything was updated.
fn print_report(report: &MigrationReport, verbose: u8) {
    if report.outcome == ApplyOutcome::Cancelled {
        println!("Run cancelled before all posts were attempted.");
    }

    if !report.failures.is_empty() {
        eprintln!("Done with errors");
        for failure in &report.failures {
            eprintln!("  - {failure}");
            if verbose > 0 {
                eprintln!("    {:?}", failure.error);
            }
        }
    }

    if !report.updated.is_empty() {
        println!(
            "Successfully updated {} posts in {}ms.",
            report.updated.len(),
            report.elapsed.as_millis()
        );
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
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn post_done(&self, title: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Updating [{current}/{total}] {title}"));
    }

    fn done(&self, _report: &MigrationReport) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
