use std::time::Duration;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::info;

use renderwait::cli::{Cli, Command, OutputFormat};
use renderwait::config::Config;
use renderwait::scenario::{RunReport, Scenario, run_scenario};
use renderwait::RenderOutcome;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre!("Failed to install tracing subscriber: {}", e))
}

fn print_report(report: &RunReport) {
    match &report.outcome {
        Some(RenderOutcome::Ready) => println!("{} {} ready (200)", "✓".green(), report.path.cyan()),
        Some(RenderOutcome::Redirect(info)) => println!(
            "{} {} redirect ({}) -> {}",
            "→".yellow(),
            report.path.cyan(),
            info.status,
            info.redirect_url
        ),
        Some(RenderOutcome::NotFound(info)) => {
            println!("{} {} not found ({})", "✗".red(), report.path.cyan(), info.status)
        }
        None => println!("{} {} timed out", "⧗".red(), report.path.cyan()),
    }

    for entry in &report.pending {
        println!("  pending: {} #{}", entry.action_kind.yellow(), entry.started_at);
    }
    for failure in &report.failures {
        println!("  failed: {}", failure.red());
    }
    println!("  dispatched: {}", report.dispatched.join(", ").dimmed());
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;

    info!("rw starting");

    match cli.command {
        Command::Render {
            scenario,
            timeout_ms,
            format,
        } => {
            let scenario = Scenario::load(&scenario)?;
            let timeout = timeout_ms
                .or(scenario.timeout_ms)
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.render_timeout());

            let report = run_scenario(&scenario, &config.coordinator, timeout).await?;
            match format {
                OutputFormat::Text => print_report(&report),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }

            if report.timed_out() {
                return Err(eyre!(
                    "Render of {} timed out after {:?} with {} pending",
                    report.path,
                    timeout,
                    report.pending.len()
                ));
            }
        }
        Command::Config => {
            print!("{}", serde_yaml::to_string(&config)?);
        }
    }

    Ok(())
}
