//! Glue lifecycle CLI entrypoint.
//!
//! This is the main entrypoint for the glue-lifecycle command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use glue_lifecycle::cli::{Cli, Commands, IdCommands, OutputFormatter};
use glue_lifecycle::config::{
    ConfigParser, ConfigValidator, LifecycleConfig, find_config_file,
};
use glue_lifecycle::converge::Converger;
use glue_lifecycle::error::{ConfigError, LifecycleError, Result};
use glue_lifecycle::profiles::{Operation, ProfileRegistry, ResourceKind};
use glue_lifecycle::remote::{ControlPlaneClient, HttpMutation, HttpStatusFetcher};
use glue_lifecycle::waiter::{DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT, WaitSpec, Waiter};

use reqwest::Method;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    init_logging(cli.verbose, cli.log_json);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let formatter = OutputFormatter::new(cli.output);
    match runtime.block_on(run(cli, &formatter)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", formatter.error(&e.to_string()));
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system. Logs go to stderr so stdout stays
/// parseable.
fn init_logging(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Main async entry point.
async fn run(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    match cli.command {
        Commands::Id { command } => cmd_id(command, formatter),
        Commands::Profiles { kind } => cmd_profiles(cli.config.as_deref(), kind, formatter),
        Commands::Validate { warnings } => {
            cmd_validate(cli.config.as_deref(), warnings, formatter)
        }
        Commands::Wait {
            kind,
            operation,
            path,
            pending,
            target,
            timeout_secs,
            poll_interval_secs,
            status_pointer,
            entry_name,
        } => {
            let config = load_config_or_default(cli.config.as_deref())?;
            let registry = ProfileRegistry::from_config(&config)?;
            let spec = resolve_wait_spec(
                &registry,
                kind,
                operation,
                WaitOverrides {
                    pending,
                    target,
                    timeout_secs,
                    poll_interval_secs,
                },
            )?;
            let fetcher = build_fetcher(&config, kind, status_pointer, entry_name)?;

            info!("Waiting on {kind} {path}");
            let outcome = Waiter::new(spec).wait(&fetcher, path.as_str()).await?;
            emit(&formatter.format_wait_outcome(&path, &outcome))?;

            if outcome.is_converged() {
                Ok(())
            } else {
                let observation = outcome.observation();
                Err(LifecycleError::UnexpectedState {
                    id: path,
                    state: outcome.state().unwrap_or_default().to_string(),
                    reason: observation.and_then(|obs| obs.reason.clone()),
                })
            }
        }
        Commands::Converge {
            kind,
            operation,
            method,
            path,
            body,
            status_path,
            status_pointer,
            entry_name,
        } => {
            let config = load_config_or_default(cli.config.as_deref())?;
            let registry = ProfileRegistry::from_config(&config)?;
            let profile = registry
                .get(kind)
                .ok_or_else(|| ConfigError::UnknownKind {
                    name: kind.to_string(),
                })?;

            let client = ControlPlaneClient::from_config(&config.remote)?;
            let method = resolve_method(method.as_deref(), operation)?;
            let mut mutation = HttpMutation::new(client, method, path);
            if let Some(body_path) = body {
                let raw = std::fs::read_to_string(&body_path)?;
                let json = serde_json::from_str(&raw).map_err(|e| ConfigError::ParseError {
                    message: format!("Invalid JSON body: {e}"),
                    location: Some(body_path.display().to_string()),
                })?;
                mutation = mutation.with_body(json);
            }
            let fetcher = build_fetcher(&config, kind, status_pointer, entry_name)?;

            let report = Converger::new(profile)
                .run(operation, &mutation, &fetcher, status_path.as_str())
                .await?;
            emit(&formatter.format_report(&report))
        }
    }
}

/// Encode or decode an identifier.
fn cmd_id(command: IdCommands, formatter: &OutputFormatter) -> Result<()> {
    match command {
        IdCommands::Encode { kind, fields } => {
            let id = kind.encode(&fields)?;
            emit(&formatter.format_encoded(kind, &id))
        }
        IdCommands::Decode { kind, id } => {
            let fields = kind.decode(&id)?;
            emit(&formatter.format_decoded(&fields))
        }
    }
}

/// Show effective profiles.
fn cmd_profiles(
    config_path: Option<&Path>,
    kind: Option<ResourceKind>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config = load_config_or_default(config_path)?;
    let registry = ProfileRegistry::from_config(&config)?;

    let output = match kind {
        Some(kind) => formatter.format_profiles(registry.get(kind)),
        None => formatter.format_profiles(registry.iter()),
    };
    emit(&output)
}

/// Validate configuration.
fn cmd_validate(
    config_path: Option<&Path>,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config = load_config(config_path)?;
    let result = ConfigValidator::new().check(&config);
    emit(&formatter.format_validation(&result, show_warnings))?;

    if let Some(first) = result.errors.first() {
        return Err(ConfigError::validation(first.message.clone(), first.field.clone()).into());
    }

    ProfileRegistry::from_config(&config)?;
    Ok(())
}

/// Profile overrides given on the command line.
struct WaitOverrides {
    pending: Vec<String>,
    target: Vec<String>,
    timeout_secs: Option<u64>,
    poll_interval_secs: Option<u64>,
}

/// Builds the wait spec from the profile and command-line overrides.
fn resolve_wait_spec(
    registry: &ProfileRegistry,
    kind: ResourceKind,
    operation: Operation,
    overrides: WaitOverrides,
) -> Result<WaitSpec> {
    let base = registry
        .get(kind)
        .and_then(|profile| profile.operation(operation).wait.clone());

    let mut spec = if overrides.pending.is_empty() && overrides.target.is_empty() {
        base.ok_or_else(|| {
            ConfigError::validation_general(format!(
                "{kind} has no {operation} wait; pass --pending and --target"
            ))
        })?
    } else {
        let (poll_interval, timeout) = base.map_or((DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT), |b| {
            (b.poll_interval, b.timeout)
        });
        WaitSpec::new(overrides.pending, overrides.target)
            .with_poll_interval(poll_interval)
            .with_timeout(timeout)
    };

    if let Some(secs) = overrides.timeout_secs {
        spec = spec.with_timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = overrides.poll_interval_secs {
        spec = spec.with_poll_interval(Duration::from_secs(secs));
    }

    spec.validate()?;
    Ok(spec)
}

/// Picks the HTTP method for an operation.
fn resolve_method(method: Option<&str>, operation: Operation) -> Result<Method> {
    match method {
        Some(name) => Method::from_bytes(name.to_uppercase().as_bytes()).map_err(|_| {
            ConfigError::validation(format!("Invalid HTTP method: {name}"), "method").into()
        }),
        None => Ok(match operation {
            Operation::Create => Method::POST,
            Operation::Update => Method::PUT,
            Operation::Delete => Method::DELETE,
        }),
    }
}

/// Builds the status fetcher for a kind.
fn build_fetcher(
    config: &LifecycleConfig,
    kind: ResourceKind,
    status_pointer: Option<String>,
    entry_name: Option<String>,
) -> Result<HttpStatusFetcher> {
    let client = ControlPlaneClient::from_config(&config.remote)?;
    if let Some(pointer) = status_pointer {
        return Ok(HttpStatusFetcher::new(client, pointer));
    }

    match (kind.entry_list(), entry_name) {
        (Some(_), None) => Err(ConfigError::validation(
            format!("{kind} is read from its parent's list; pass --entry-name"),
            "entry_name",
        )
        .into()),
        (_, Some(name)) => Ok(HttpStatusFetcher::for_entry(client, kind, name)),
        (None, None) => Ok(HttpStatusFetcher::for_kind(client, kind)),
    }
}

/// Resolves the configuration file path.
fn resolve_config_path(config_path: Option<&Path>) -> Result<PathBuf> {
    match config_path {
        Some(path) => Ok(path.to_path_buf()),
        None => find_config_file(std::env::current_dir()?),
    }
}

/// Loads `.env` and the configuration file, with environment overrides.
fn load_config(config_path: Option<&Path>) -> Result<LifecycleConfig> {
    let config_file = resolve_config_path(config_path)?;
    debug!("Using configuration: {}", config_file.display());

    let parser = ConfigParser::new()
        .with_base_path(config_file.parent().unwrap_or_else(|| Path::new(".")));
    parser.load_dotenv()?;
    parser.load_with_env(&config_file)
}

/// Like [`load_config`], but falls back to defaults when no file exists.
fn load_config_or_default(config_path: Option<&Path>) -> Result<LifecycleConfig> {
    match load_config(config_path) {
        Err(LifecycleError::Config(ConfigError::FileNotFound { .. })) if config_path.is_none() => {
            debug!("No configuration file found, using built-in profiles");
            ConfigParser::new().load_dotenv()?;
            let mut config = LifecycleConfig::default();
            ConfigParser::apply_env_overrides(&mut config)?;
            Ok(config)
        }
        other => other,
    }
}

/// Writes command output to stdout.
fn emit(output: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", output.trim_end())?;
    Ok(())
}
