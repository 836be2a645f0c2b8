// crates/subscription-cli/src/main.rs
// ============================================================================
// Module: Subscription Service CLI Entry Point
// Description: Command dispatcher for serving and config tooling.
// Purpose: Start the HTTP service or check configuration from the shell.
// Dependencies: clap, subscription-config, subscription-http, tokio, tracing
// ============================================================================

//! ## Overview
//! `subscription-service serve` loads configuration, installs logging, opens
//! the store, and serves until SIGINT or SIGTERM. `config validate` loads and
//! validates configuration without side effects; `config example` prints the
//! canonical example file. Startup failures exit non-zero with a message on
//! stderr.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod telemetry;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use subscription_config::ServiceConfig;
use subscription_config::config_toml_example;
use subscription_http::SubscriptionServer;
use thiserror::Error;
use tracing::error;
use tracing::info;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "subscription-service", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the subscription HTTP service.
    Serve(ConfigArgs),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a configuration file, including `APP_*` overrides.
    Validate(ConfigArgs),
    /// Print the canonical example configuration.
    Example,
}

/// Shared config path argument.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Config file path (defaults to `SUBSCRIPTION_SERVICE_CONFIG`, then
    /// subscription-service.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the selected command.
async fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Serve(args) => command_serve(args).await,
        Commands::Config {
            command,
        } => command_config(command),
    }
}

// ============================================================================
// SECTION: Serve
// ============================================================================

/// Loads configuration and serves until a shutdown signal.
async fn command_serve(args: ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(&args)?;
    telemetry::init_tracing(&config.log).map_err(|err| CliError::new(err.to_string()))?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        bind = %config.http.bind,
        port = config.http.port,
        "starting subscription service"
    );
    let server = SubscriptionServer::from_config(config).await.map_err(|err| {
        error!(error = %err, "startup failed");
        CliError::new(format!("failed to start server: {err}"))
    })?;
    server.serve().await.map_err(|err| {
        error!(error = %err, "server failed");
        CliError::new(format!("server failed: {err}"))
    })?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(args) => command_config_validate(&args),
        ConfigCommand::Example => command_config_example(),
    }
}

/// Validates configuration and reports the effective store and listener.
fn command_config_validate(args: &ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(args)?;
    let listen = config.http.socket_addr().map_err(|err| CliError::new(err.to_string()))?;
    write_stdout_line(&format!(
        "config is valid (listen={listen}, base_path={}, store={})",
        config.http.base_path,
        config.store.backend.as_str()
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Prints the example configuration.
fn command_config_example() -> CliResult<ExitCode> {
    let mut stdout = std::io::stdout();
    stdout
        .write_all(config_toml_example().as_bytes())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads and validates configuration from the resolved path.
fn load_config(args: &ConfigArgs) -> CliResult<ServiceConfig> {
    ServiceConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output stream failure.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
