//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use docmodernizer_core::{ModernizationReport, Pipeline, ProgressReporter, Stage};
use docmodernizer_shared::{
    AppConfig, FetchErrorPolicy, PipelineState, init_config, validate_api_keys,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docmodernizer: bring outdated technical documentation up to date.
#[derive(Parser)]
#[command(
    name = "docmodernizer",
    version,
    about = "Analyze a documentation page and generate a modernized Markdown version.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv). Overrides --log-level.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log level (error, warn, info, debug, trace). Defaults to the config file value.
    #[arg(long, env = "LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

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
    /// Modernize the documentation page at URL.
    Modernize {
        /// Documentation URL to process.
        url: String,

        /// Write original.md, analysis.md, modernized.md, quality.md and
        /// state.json into this directory instead of printing.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Skip the LLM stages when the page cannot be fetched.
        #[arg(long)]
        halt_on_fetch_error: bool,
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

/// Install the global tracing subscriber. `RUST_LOG` takes precedence over
/// `-v`, which takes precedence over `--log-level` and the config file.
pub(crate) fn init_tracing(cli: &Cli, config: &AppConfig) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => cli
            .log_level
            .as_deref()
            .unwrap_or(&config.defaults.log_level)
            .to_ascii_lowercase(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("docmodernizer={level}")))
        .unwrap_or_else(|_| EnvFilter::new("docmodernizer=info"));

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
pub(crate) async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    match cli.command {
        Command::Modernize {
            url,
            out,
            halt_on_fetch_error,
        } => cmd_modernize(config, &url, out.as_deref(), halt_on_fetch_error).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&config).await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_modernize(
    mut config: AppConfig,
    url: &str,
    out: Option<&Path>,
    halt_on_fetch_error: bool,
) -> Result<()> {
    // Both providers must be usable before any work starts.
    validate_api_keys(&config)?;

    if halt_on_fetch_error {
        config.pipeline.on_fetch_error = FetchErrorPolicy::Halt;
    }

    info!(
        url,
        analysis_model = %config.analysis.model,
        review_model = %config.review.model,
        "modernizing documentation"
    );

    let pipeline = Pipeline::from_app_config(&config);
    let reporter = CliProgress::new();
    let state = pipeline.run(url, &reporter).await;

    if let Some(err) = &state.error {
        if let Some(dir) = out {
            write_state(dir, &state)?;
        }
        return Err(eyre!("{err}"));
    }

    let report = ModernizationReport::from_state(&state);
    let code_examples = docmodernizer_markdown::extract_code_blocks(&state.modernized_markdown).len();

    match out {
        Some(dir) => {
            write_outputs(dir, &report, &state)?;
            println!();
            println!("  Documentation modernized!");
            println!("  Run:           {}", state.run_id);
            println!("  Issues:        {}", state.analyzed_sections.len());
            println!("  Researched:    {}", state.research_results.len());
            println!("  Code examples: {code_examples}");
            println!("  Average score: {:.1}/10", state.quality_report.average_score);
            println!("  Output:        {}", dir.display());
            println!();
        }
        None => {
            println!("# Original Documentation\n\n{}\n", report.original);
            println!("# Analysis\n\n{}\n", report.analysis);
            println!("# Modernized Documentation\n\n{}\n", report.modernized);
            println!("# Quality Report\n\n{}\n", report.quality);
            println!("Code examples in modernized documentation: {code_examples}");
        }
    }

    Ok(())
}

/// Write the four rendered documents and the final state into `dir`.
fn write_outputs(dir: &Path, report: &ModernizationReport, state: &PipelineState) -> Result<()> {
    std::fs::create_dir_all(dir)
        .wrap_err_with(|| format!("cannot create output directory {}", dir.display()))?;

    let files = [
        ("original.md", &report.original),
        ("analysis.md", &report.analysis),
        ("modernized.md", &report.modernized),
        ("quality.md", &report.quality),
    ];
    for (name, content) in files {
        let path = dir.join(name);
        std::fs::write(&path, content)
            .wrap_err_with(|| format!("failed to write {}", path.display()))?;
    }

    write_state(dir, state)
}

fn write_state(dir: &Path, state: &PipelineState) -> Result<()> {
    std::fs::create_dir_all(dir)
        .wrap_err_with(|| format!("cannot create output directory {}", dir.display()))?;

    let path = dir.join("state.json");
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(&path, json).wrap_err_with(|| format!("failed to write {}", path.display()))?;
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
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.set_length(Stage::ORDER.len() as u64);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn stage_started(&self, stage: Stage) {
        self.spinner.set_message(format!("{}...", stage.description()));
    }

    fn stage_finished(&self, _stage: Stage) {
        self.spinner.inc(1);
    }

    fn done(&self, _state: &PipelineState) {
        self.spinner.finish_and_clear();
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}
