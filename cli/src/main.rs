//! CLI entrypoint for orca
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context as _, Result, anyhow, bail};
use clap::Parser;
use orca_application::Orchestrator;
use orca_domain::Participant;
use orca_infrastructure::{
    ConfigLoader, JsonlConversationLogger, LocalBackendLauncher, OrcaConfig, Severity,
};
use orca_presentation::{Cli, ConsoleChannel, ConsoleFormatter, ConsoleReplyNotifier};
use std::backtrace::Backtrace;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Pending stdin reads hold a blocking thread; don't wait on it at exit.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    let _guard = init_logging(&cli);
    install_panic_hook();

    let runtime = tokio::runtime::Runtime::new().context("Failed to start the async runtime")?;
    let result = runtime.block_on(run(cli));
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
    result
}

/// stderr output filtered by `-v` (or `RUST_LOG`), plus a daily rolling file
/// under `--log-dir`.
fn init_logging(cli: &Cli) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match &cli.log_dir {
        Some(dir) => {
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "orca.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();
    guard
}

/// Route panics (including ones inside event handlers) through `tracing`.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        error!("Panic: {}\n{}", info, Backtrace::force_capture());
        original_hook(info);
    }));
}

fn load_config(cli: &Cli) -> Result<OrcaConfig> {
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            Severity::Error => error!("Config: {}", issue),
            Severity::Warning => warn!("Config: {}", issue),
        }
    }
    let errors = issues.iter().filter(|i| i.is_error()).count();
    if errors > 0 {
        bail!("{} configuration error(s); see the log above", errors);
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    info!("Starting {}", config.name);

    // === Dependency Injection ===
    let params = config.to_conversation_params()?;
    let launcher = Arc::new(LocalBackendLauncher::new(
        config.llama_server(cli.log_dir.as_deref()),
        config.whisper_server(cli.log_dir.as_deref()),
    ));

    let mut orchestrator = Orchestrator::new(launcher, params);
    if let Some(path) = &config.transcript.log_path
        && let Some(logger) = JsonlConversationLogger::open(path)
    {
        info!("Transcript log: {}", logger.path().display());
        orchestrator = orchestrator.with_conversation_logger(Arc::new(logger));
    }
    if cli.console {
        orchestrator =
            orchestrator.with_reply_notifier(Arc::new(ConsoleReplyNotifier::stdout(&config.name)));
    }

    let shutdown = orchestrator.shutdown_token();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received, shutting down");
                    shutdown.cancel();
                }
                Err(e) => warn!("Could not listen for Ctrl-C: {}", e),
            }
        }
    });

    if cli.console {
        println!("{}", ConsoleFormatter::welcome(&config.name));
        let channel = ConsoleChannel::new(
            Participant::new("console", "console"),
            orchestrator.publisher(),
            shutdown.clone(),
        );
        tokio::spawn(async move {
            if let Err(e) = channel.run(BufReader::new(tokio::io::stdin())).await {
                warn!("Console channel stopped: {}", e);
            }
        });
    }

    orchestrator.run().await?;

    if let Some(context) = orchestrator.final_context() {
        info!("Transcript ended with {} messages", context.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_models_are_rejected() {
        let cli = Cli::parse_from(["orca", "--no-config"]);
        let err = load_config(&cli).unwrap_err();
        assert!(err.to_string().starts_with("3 configuration error(s)"));
    }
}
