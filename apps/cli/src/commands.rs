//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use tutpage_core::{
    BuildOutcome, ProgressReporter, RebuildDecision, build_status, readable_timestamp, run_build,
};
use tutpage_shared::{AppConfig, BuildConfig, init_config, load_config};
use tutpage_source::{GithubCommits, SparseFetcher};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// tutpage: the Svelte tutorial on one page.
#[derive(Parser)]
#[command(
    name = "tutpage",
    version,
    about = "Render the Svelte tutorial as a single HTML page, rebuilding only when it changes upstream.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Project directory holding tutpage.toml, the template and build output.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Config file to use instead of <root>/tutpage.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

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
    /// Build the page if the upstream tutorial changed since the last build.
    Build {
        /// Rebuild even when the upstream revision is unchanged.
        #[arg(long)]
        force: bool,
    },

    /// Show the revision and time of the last successful build.
    Status,

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
    /// Write tutpage.toml with defaults.
    Init,
    /// Show the effective configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "tutpage=info",
        1 => "tutpage=debug",
        _ => "tutpage=trace",
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
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().wrap_err("cannot determine working directory")?,
    };
    let explicit = cli.config.as_deref();

    match cli.command {
        Command::Build { force } => cmd_build(&root, explicit, force).await,
        Command::Status => cmd_status(&root, explicit).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(&root),
            ConfigAction::Show => cmd_config_show(&root, explicit),
        },
    }
}

fn resolve_config(root: &Path, explicit: Option<&Path>) -> Result<BuildConfig> {
    let config = load_config(root, explicit)?;
    Ok(BuildConfig::resolve(&config, root))
}

// ---------------------------------------------------------------------------
// build
// ---------------------------------------------------------------------------

async fn cmd_build(root: &Path, explicit: Option<&Path>, force: bool) -> Result<()> {
    let config = resolve_config(root, explicit)?;

    let revisions = GithubCommits::from_config(&config)?;
    let fetcher = SparseFetcher::from_config(&config);

    info!(
        repo = %config.repo,
        branch = %config.branch,
        path = %config.remote_content_path(),
        force,
        "starting build"
    );

    let reporter = CliProgress::new();
    let outcome = run_build(&config, force, &revisions, &fetcher, &reporter).await?;

    match outcome {
        BuildOutcome::Skipped { sha } => {
            println!("Up to date at {sha}; skipped.");
        }
        BuildOutcome::Built(report) => {
            println!();
            println!("  Page built ({})", report.decision);
            println!("  Revision: {}", report.sha);
            println!("  Sections: {}", report.sections);
            println!("  Chapters: {}", report.chapters);
            println!("  Examples: {}", report.example_files);
            println!("  Assets:   {}", report.assets_copied);
            println!("  Output:   {}", report.output.display());
            println!("  Time:     {:.1}s", report.elapsed.as_secs_f64());
            println!();
        }
    }

    Ok(())
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
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn decided(&self, sha: &str, decision: &RebuildDecision) {
        let short = sha.get(..7).unwrap_or(sha);
        self.spinner.set_message(format!("{short}: {decision}"));
    }

    fn done(&self, _outcome: &BuildOutcome) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        // Errors skip `done`; don't leave the spinner ticking over the report.
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

async fn cmd_status(root: &Path, explicit: Option<&Path>) -> Result<()> {
    let config = resolve_config(root, explicit)?;

    match build_status(&config).await {
        Some(info) => {
            let built_at = readable_timestamp(info.build_at_ms)?;
            println!("Last build");
            println!("  Revision: {}", info.sha);
            println!("  Built at: {built_at}");
            println!("  Output:   {}", config.output_page().display());
        }
        None => println!("No previous build ({} not found or unreadable).", config.build_info.display()),
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init(root: &Path) -> Result<()> {
    if !root.is_dir() {
        return Err(eyre!("project root '{}' is not a directory", root.display()));
    }
    let path = init_config(root)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(root: &Path, explicit: Option<&Path>) -> Result<()> {
    let config: AppConfig = load_config(root, explicit)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
