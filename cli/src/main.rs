// imageflow: desktop harness for the batch keep-alive core
//
// Runs simulated batches against console stand-ins for the Android and iOS
// hosts, sends single method-channel calls, and manages the settings file.

mod config;
mod hosts;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use imageflow_core::bridge::codec::{decode_reply, encode_method_call};
use imageflow_core::{BatchBackground, BatchSettings, MethodCall, MethodReply};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "imageflow")]
#[command(about = "ImageFlow: batch keep-alive harness", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated batch over the method channel
    Simulate {
        #[arg(short, long, value_enum, default_value = "android")]
        platform: PlatformArg,
        /// Number of images in the batch
        #[arg(short, long, default_value = "10")]
        total: u32,
        /// Delay between images (defaults to config)
        #[arg(long)]
        step_ms: Option<u64>,
        /// iOS grant budget in seconds, 0 = never revoked (defaults to config)
        #[arg(long)]
        grant_secs: Option<u64>,
    },
    /// Send one method call and print the encoded exchange
    Call {
        method: String,
        #[arg(short, long, value_enum, default_value = "android")]
        platform: PlatformArg,
        #[arg(long)]
        total: Option<i64>,
        #[arg(long)]
        completed: Option<i64>,
    },
    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Set { key: String, value: String },
    Get { key: String },
    List,
    /// Print the config file location
    Path,
    /// Restore default settings
    Reset,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PlatformArg {
    Android,
    Ios,
}

impl PlatformArg {
    fn begin_method(&self) -> &'static str {
        match self {
            PlatformArg::Android => "startForeground",
            PlatformArg::Ios => "beginBackgroundTask",
        }
    }

    fn end_method(&self) -> &'static str {
        match self {
            PlatformArg::Android => "stopForeground",
            PlatformArg::Ios => "endBackgroundTask",
        }
    }
}

fn init_tracing(
    config: &config::Config,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    if config.log_to_file {
        let log_dir = config::Config::data_dir()?.join("logs");
        let appender = tracing_appender::rolling::daily(log_dir, "imageflow.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Ok(Some(guard))
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        Ok(None)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load()?;
    let _log_guard = init_tracing(&config)?;

    match cli.command {
        Commands::Simulate {
            platform,
            total,
            step_ms,
            grant_secs,
        } => cmd_simulate(config, platform, total, step_ms, grant_secs).await,
        Commands::Call {
            method,
            platform,
            total,
            completed,
        } => cmd_call(config, method, platform, total, completed),
        Commands::Config { action } => cmd_config(config, action),
    }
}

fn build_batch(
    settings: BatchSettings,
    platform: PlatformArg,
    grant_budget: Option<Duration>,
) -> Result<Arc<BatchBackground>> {
    let batch = match platform {
        PlatformArg::Android => {
            BatchBackground::for_notifications(Arc::new(hosts::ConsoleNotificationHost), settings)
        }
        PlatformArg::Ios => BatchBackground::for_background_tasks(
            Arc::new(hosts::SimulatedTaskHost::new(
                tokio::runtime::Handle::current(),
                grant_budget,
            )),
            settings,
        ),
    };
    batch.context("Failed to set up batch keep-alive")
}

fn send(batch: &BatchBackground, call: &MethodCall) -> Result<MethodReply> {
    let request = encode_method_call(call).context("Failed to encode call")?;
    let reply = batch.handle_method_call(request);
    decode_reply(&reply).context("Failed to decode reply")
}

fn progress_args(total: u32, completed: u32) -> Value {
    json!({ "total": total, "completed": completed })
}

async fn cmd_simulate(
    config: config::Config,
    platform: PlatformArg,
    total: u32,
    step_ms: Option<u64>,
    grant_secs: Option<u64>,
) -> Result<()> {
    let step = Duration::from_millis(step_ms.unwrap_or(config.simulation.step_ms));
    let grant_budget = match grant_secs.unwrap_or(config.simulation.grant_secs) {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    println!(
        "{} {} images on {}",
        "Simulating".bold(),
        total,
        config.batch.method_channel.bright_cyan()
    );
    println!();

    let batch = build_batch(config.batch.clone(), platform, grant_budget)?;

    send(
        &batch,
        &MethodCall::new(platform.begin_method(), progress_args(total, 0)),
    )?;

    let mut revoked_reported = false;
    for completed in 1..=total {
        tokio::time::sleep(step).await;

        match platform {
            PlatformArg::Android => {
                send(
                    &batch,
                    &MethodCall::new("updateForeground", progress_args(total, completed)),
                )?;
            }
            PlatformArg::Ios => {
                println!("  {} processed {} of {}", "·".dimmed(), completed, total);
                if !batch.is_active() && !revoked_reported {
                    println!(
                        "  {} grant revoked, continuing without background time",
                        "!".bright_red()
                    );
                    revoked_reported = true;
                }
            }
        }
    }

    send(&batch, &MethodCall::bare(platform.end_method()))?;

    let stats = batch.stats();
    tracing::info!("Simulation finished: {:?}", stats);
    println!();
    println!("{}", "Lifecycle".bold());
    println!("  Grants acquired:  {}", stats.grants_acquired);
    println!("  Grants released:  {}", stats.grants_released);
    println!("  Grants revoked:   {}", stats.grants_revoked);
    println!("  Refreshes:        {}", stats.refreshes);
    if stats.acquire_failures > 0 {
        println!(
            "  Acquire failures: {}",
            stats.acquire_failures.to_string().bright_red()
        );
    }

    Ok(())
}

fn cmd_call(
    config: config::Config,
    method: String,
    platform: PlatformArg,
    total: Option<i64>,
    completed: Option<i64>,
) -> Result<()> {
    let mut args = serde_json::Map::new();
    if let Some(total) = total {
        args.insert("total".to_string(), json!(total));
    }
    if let Some(completed) = completed {
        args.insert("completed".to_string(), json!(completed));
    }
    let call = MethodCall::new(method, Value::Object(args));

    let batch = build_batch(config.batch, platform, None)?;
    let request = encode_method_call(&call).context("Failed to encode call")?;
    println!("{} {}", "→".bright_cyan(), String::from_utf8_lossy(&request));

    let reply = batch.handle_method_call(request);
    println!("{} {}", "←".bright_cyan(), String::from_utf8_lossy(&reply));

    match decode_reply(&reply).context("Failed to decode reply")? {
        MethodReply::Success(value) => println!("{} success: {}", "✓".green(), value),
        MethodReply::Error { code, message, .. } => println!(
            "{} error {}: {}",
            "✗".red(),
            code,
            message.unwrap_or_default()
        ),
        MethodReply::NotImplemented => println!("{} not implemented", "✗".yellow()),
    }

    Ok(())
}

fn cmd_config(mut config: config::Config, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            println!("{} Set {} = {}", "✓".green(), key.bright_cyan(), value);
        }

        ConfigAction::Get { key } => {
            if let Some(value) = config.get(&key) {
                println!("{} = {}", key.bright_cyan(), value);
            } else {
                anyhow::bail!("Unknown config key: {}", key);
            }
        }

        ConfigAction::List => {
            println!("{}", "Configuration".bold());
            println!();

            for (key, value) in config.list() {
                println!("  {:<26} {}", key.bright_cyan(), value);
            }
        }

        ConfigAction::Path => {
            println!("{}", config::Config::config_file()?.display());
        }

        ConfigAction::Reset => {
            config::Config::default().save()?;
            println!("{} Restored default settings", "✓".green());
        }
    }

    Ok(())
}
