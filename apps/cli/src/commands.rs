//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use causespec_core::pipeline::{
    AnalysisConfig, SignificanceInput, build_estimate_request, build_significance_request,
};
use causespec_core::specification::significance_failed;
use causespec_shared::{
    AppConfig, BuildOptions, NodeRequest, RefutationType, SignificanceTestResult, init_config,
    load_config,
};
use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use serde::de::DeserializeOwned;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// causespec — build execution-service requests from causal analysis documents.
#[derive(Parser)]
#[command(
    name = "causespec",
    version,
    about = "Build causal-analysis request payloads from analysis documents.",
    long_about = None,
)]
pub(crate) struct Cli {
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
    /// Build the estimate-and-refute request for an analysis document.
    Build {
        /// Analysis document (JSON).
        analysis: PathBuf,

        /// Refutation to use when the document chooses none, either directly
        /// or through its default run's refutation type.
        #[arg(short, long, value_parser = refutation_parser())]
        refutation: Option<RefutationType>,

        /// Dataframe to use when the document does not name one.
        #[arg(short, long)]
        dataframe: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Significance tests over the specification curve.
    Significance {
        #[command(subcommand)]
        action: SignificanceAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Significance subcommands.
#[derive(Subcommand)]
pub(crate) enum SignificanceAction {
    /// Build a significance-test request for the active specifications.
    Build {
        /// Specification curve document (JSON).
        input: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Report whether a significance-test result failed.
    Status {
        /// Result document returned by the execution service (JSON).
        result: PathBuf,
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

/// Where and how to write a request.
#[derive(clap::Args)]
pub(crate) struct OutputArgs {
    /// Write the request to a file instead of stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Emit compact JSON regardless of config.
    #[arg(long)]
    pub compact: bool,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so stdout stays clean JSON.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "causespec=info",
        1 => "causespec=debug",
        _ => "causespec=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

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
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build {
            analysis,
            refutation,
            dataframe,
            output,
        } => cmd_build(&analysis, refutation, dataframe, &output),
        Command::Significance { action } => match action {
            SignificanceAction::Build { input, output } => cmd_significance_build(&input, &output),
            SignificanceAction::Status { result } => cmd_significance_status(&result),
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_build(
    path: &Path,
    refutation: Option<RefutationType>,
    dataframe: Option<String>,
    output: &OutputArgs,
) -> Result<()> {
    let config = load_config()?;
    let options = BuildOptions::from(&config).with_overrides(refutation, dataframe);

    let analysis: AnalysisConfig = read_json(path)?;
    info!(path = %path.display(), "building estimate request");

    let request = build_estimate_request(&analysis, &options)?;
    write_request(&request, output, options.pretty)
}

fn cmd_significance_build(path: &Path, output: &OutputArgs) -> Result<()> {
    let config = load_config()?;
    let input: SignificanceInput = read_json(path)?;
    info!(path = %path.display(), "building significance request");

    let request = build_significance_request(&input)?;
    write_request(&request, output, config.defaults.pretty)
}

fn cmd_significance_status(path: &Path) -> Result<()> {
    let result: SignificanceTestResult = read_json(path)?;
    if significance_failed(Some(&result)) {
        return Err(eyre!("significance test failed ({})", path.display()));
    }
    println!(
        "significance test status: {}",
        result.status.as_deref().unwrap_or("unknown")
    );
    if let Some(p_value) = &result.p_value {
        println!("p-value: {p_value}");
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Accepts exactly the refutation labels and lists them in `--help`.
fn refutation_parser() -> impl TypedValueParser<Value = RefutationType> {
    PossibleValuesParser::new(RefutationType::ALL.iter().map(|r| r.as_str()))
        .try_map(|label| label.parse::<RefutationType>())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("cannot read '{}'", path.display()))?;
    serde_json::from_str(&content).wrap_err_with(|| format!("invalid document '{}'", path.display()))
}

fn write_request(request: &NodeRequest, output: &OutputArgs, pretty: bool) -> Result<()> {
    let json = if pretty && !output.compact {
        serde_json::to_string_pretty(request)?
    } else {
        serde_json::to_string(request)?
    };

    match &output.out {
        Some(path) => {
            std::fs::write(path, json)
                .wrap_err_with(|| format!("cannot write '{}'", path.display()))?;
            info!(path = %path.display(), nodes = request.nodes.len(), "request written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
