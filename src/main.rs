//! charge-keeper: headless front end for the `a14-charge-keeper` battery
//! threshold tool.
//!
//! Run with:  `RUST_LOG=info charge-keeper status`

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use keeper_cli::{CliGateway, Elevation};
use keeper_config::{keys, ConfigStore};
use keeper_core::BatteryInfo;
use keeper_manager::BatteryManager;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "charge-keeper", version, about = "Battery charge threshold manager")]
struct Cli {
    /// Wrapper used for privileged subcommands, e.g. "pkexec" or "sudo -n".
    #[arg(long, global = true, default_value = "")]
    elevate: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the current threshold and battery details.
    Status {
        /// Print the snapshot as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Limit charging until the next reboot.
    Set { percent: i64 },
    /// Limit charging and keep the limit across boot and resume.
    Persist { percent: i64 },
    /// Remove the charging limit.
    Clear,
    /// Refresh periodically and log threshold changes.
    Watch {
        /// Seconds between refreshes, 5 to 300 (defaults to `refresh_interval`).
        #[arg(long, value_parser = clap::value_parser!(u64).range(5..=300))]
        interval: Option<u64>,
    },
    /// Inspect or change the settings file.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print every setting.
    Show,
    /// Print one setting.
    Get { key: String },
    /// Set one setting; the value is parsed as JSON, falling back to a string.
    Set { key: String, value: String },
    /// Restore all defaults.
    Reset,
}

fn main() -> Result<()> {
    // Structured logging; RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("charge-keeper v{} starting", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let mut config = ConfigStore::open_default();

    let elevation = Elevation::from_command_line(&cli.elevate);

    match cli.command.unwrap_or(Command::Status { json: false }) {
        Command::Config(cmd) => run_config(&mut config, cmd)?,
        Command::Status { json } => {
            let manager = connect(elevation)?;
            print_status(current(&manager)?, json)?;
        }
        Command::Set { percent } => {
            let mut manager = connect(elevation)?;
            manager.set_threshold(percent)?;
            println!("Charge limit set to {}%", current(&manager)?.end_threshold);
        }
        Command::Persist { percent } => {
            let mut manager = connect(elevation)?;
            manager.persist_threshold(percent)?;
            println!("Persistent charge limit set to {}%", current(&manager)?.end_threshold);
        }
        Command::Clear => {
            let mut manager = connect(elevation)?;
            manager.clear_threshold()?;
            println!("Charge limit cleared ({}%)", current(&manager)?.end_threshold);
        }
        Command::Watch { interval } => {
            let interval = watch_interval(&config, interval)?;
            watch(connect(elevation)?, interval, config.show_notifications())?;
        }
    }
    Ok(())
}

/// Build an initialized manager.
fn connect(elevation: Elevation) -> Result<BatteryManager> {
    let mut manager = BatteryManager::new(CliGateway::default().with_elevation(elevation));
    manager.initialize()?;
    Ok(manager)
}

fn current(manager: &BatteryManager) -> Result<&BatteryInfo> {
    manager.current_info().context("no battery snapshot available")
}

fn print_status(info: &BatteryInfo, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(info)?);
        return Ok(());
    }

    println!("{}", info.summary());
    let rows = [
        ("Device", Some(info.device.clone())),
        ("Charge limit", Some(format!("{}%", info.end_threshold))),
        ("Charge start", info.start_threshold.map(|v| format!("{v}%"))),
        ("Backups", Some(info.backup_count.to_string())),
        ("Battery", info.percentage.map(|v| format!("{v}%"))),
        ("State", info.power_state().map(|s| s.label().to_string())),
        ("Time to empty", info.time_to_empty.clone()),
        ("Time to full", info.time_to_full.clone()),
        ("Power", info.energy_rate.map(|v| format!("{v:.3}W"))),
        ("Voltage", info.voltage.map(|v| format!("{v:.3}V"))),
        ("Energy", info.energy_current.map(|v| format!("{v:.2}Wh"))),
        ("Full / design", energy_pair(info)),
        ("Health", info.health_percentage().map(|v| format!("{v:.1}%"))),
        ("Cycles", info.charge_cycles.map(|v| v.to_string())),
    ];
    for (label, value) in rows {
        if let Some(value) = value {
            println!("  {label:<14} {value}");
        }
    }
    if let Some(vendor) = &info.vendor {
        println!("  {:<14} {vendor} {}", "Hardware", info.model.as_deref().unwrap_or(""));
    }
    Ok(())
}

fn energy_pair(info: &BatteryInfo) -> Option<String> {
    match (info.energy_full, info.energy_full_design) {
        (Some(full), Some(design)) => Some(format!("{full:.2}Wh / {design:.1}Wh")),
        _ => None,
    }
}

/// Refresh period for `watch`: the override if given, else the stored setting.
fn watch_interval(config: &ConfigStore, secs: Option<u64>) -> Result<Duration> {
    let Some(secs) = secs else {
        return Ok(config.refresh_interval());
    };
    config
        .schema()
        .validate(keys::REFRESH_INTERVAL, &serde_json::json!(secs))?;
    Ok(Duration::from_secs(secs))
}

/// Refresh on a fixed interval until Ctrl-C.
///
/// Each refresh blocks on the external tool, so it runs on the blocking pool
/// with the manager moved in and handed back; a tick that arrives while a
/// refresh is in flight is skipped.
fn watch(mut manager: BatteryManager, interval: Duration, notify: bool) -> Result<()> {
    manager.register_event_callback(move |event| {
        if notify {
            println!("{event}");
        }
        tracing::info!(event_type = event.event_type(), timestamp = event.timestamp(), "{event}");
        Ok(())
    });

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("cannot start runtime")?;

    let outcome = runtime.block_on(watch_loop(manager, interval, tokio::signal::ctrl_c()));
    // Don't wait for a refresh still blocked on the external tool.
    runtime.shutdown_background();
    outcome
}

/// Refresh until `shutdown` resolves, whether waiting for a tick or for a
/// refresh in flight.
async fn watch_loop(
    mut manager: BatteryManager,
    interval: Duration,
    shutdown: impl Future<Output = std::io::Result<()>>,
) -> Result<()> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tracing::info!("Refreshing every {}s; press Ctrl-C to stop", interval.as_secs());

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            signal = &mut shutdown => return stopped(signal),
        }

        let refresh = tokio::task::spawn_blocking(move || {
            let result = manager.refresh_status();
            (manager, result)
        });
        let (returned, result) = tokio::select! {
            joined = refresh => joined?,
            signal = &mut shutdown => return stopped(signal),
        };
        manager = returned;

        match result {
            Ok(()) => {
                if let Some(info) = manager.current_info() {
                    tracing::debug!("{}", info.summary());
                }
            }
            Err(e) => tracing::warn!("{e}"),
        }
    }
}

fn stopped(signal: std::io::Result<()>) -> Result<()> {
    signal.context("cannot listen for Ctrl-C")?;
    tracing::info!("Interrupted; stopping");
    Ok(())
}

fn run_config(config: &mut ConfigStore, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            println!("{}", serde_json::to_string_pretty(&config.get_all())?);
        }
        ConfigCommand::Get { key } => match config.get(&key) {
            Some(value) => println!("{value}"),
            None => bail!("unknown setting '{key}'"),
        },
        ConfigCommand::Set { key, value } => {
            let parsed: Option<serde_json::Value> = serde_json::from_str(&value).ok();
            let value = parsed.unwrap_or(serde_json::Value::String(value));
            config.set(key, value)?;
            config.save()?;
        }
        ConfigCommand::Reset => {
            config.reset_to_defaults();
            config.save()?;
        }
    }
    Ok(())
}
