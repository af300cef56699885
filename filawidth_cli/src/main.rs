mod cli;
mod sim;

use clap::Parser;
use cli::{Cli, Commands};
use eyre::{Result, WrapErr};
use filawidth_core::{Status, WidthBuilder, runner};
use filawidth_traits::WidthSensor;
use filawidth_traits::clock::MonotonicClock;
use sim::{ConsoleFlow, ConsoleRunout, SimulatedExtruder, SimulatedSensor};
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool, level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn print_status(status: &Status, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "diameter": status.diameter,
                "raw": status.raw,
                "enabled": status.enabled,
            })
        );
    } else {
        println!(
            "diameter={:.2} raw={} enabled={}",
            status.diameter, status.raw, status.enabled
        );
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.json, &cli.log_level);

    let text = fs::read_to_string(&cli.config)
        .wrap_err_with(|| format!("reading config file {}", cli.config.display()))?;
    let cfg = filawidth_config::load_toml(&text).wrap_err("parsing config TOML")?;
    cfg.validate().wrap_err("invalid config")?;

    match cli.cmd {
        Commands::Check => {
            println!("config OK: {}", cli.config.display());
            Ok(())
        }
        Commands::Query => {
            let mut controller = WidthBuilder::new()
                .with_position_tracker(SimulatedExtruder::new(0.0))
                .with_flow_sink(ConsoleFlow)
                .with_sensor_cfg(cfg.sensor.clone())
                .build()?;
            let mut sensor = SimulatedSensor::new(0.75, None);
            let sample = sensor
                .read(Duration::from_millis(cfg.sampling.sensor_timeout_ms))
                .map_err(|e| eyre::eyre!("sensor read failed: {e}"))?;
            controller.note_sample(sample);
            print_status(&controller.status(), cli.json);
            Ok(())
        }
        Commands::Run {
            duration_s,
            feed_rate,
            runout_at_s,
            runout_for_s,
        } => {
            let mut controller = WidthBuilder::new()
                .with_position_tracker(SimulatedExtruder::new(feed_rate))
                .with_flow_sink(ConsoleFlow)
                .with_runout_sink(ConsoleRunout::default())
                .with_sensor_cfg(cfg.sensor.clone())
                .build()?;

            let shutdown = Arc::new(AtomicBool::new(false));
            let shutdown_handler = shutdown.clone();
            ctrlc::set_handler(move || {
                shutdown_handler.store(true, Ordering::Relaxed);
            })
            .wrap_err("installing Ctrl-C handler")?;

            let sensor = SimulatedSensor::new(0.75, runout_at_s.map(|at| (at, runout_for_s)));
            runner::run(
                sensor,
                &mut controller,
                cfg.sampling.report_hz,
                Duration::from_millis(cfg.sampling.sensor_timeout_ms),
                MonotonicClock::new(),
                None,
                shutdown,
                duration_s.map(Duration::from_secs),
            )?;

            print_status(&controller.status(), cli.json);
            Ok(())
        }
    }
}
