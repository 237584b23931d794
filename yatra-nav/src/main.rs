//! YatraNav - waypoint navigation controller for a vacuum-robot chassis
//!
//! Connects to the robot over a serial link and runs two actors against the
//! shared channel: this command loop, reading operator input line by line,
//! and a background sensor poller that raises obstacle notifications. Route
//! commands plan over a grid map with A*, drive the robot cell by cell, and
//! replan around obstacles as they are discovered.

use clap::Parser;
use yatra_nav::commands::{dispatch, AppContext};
use yatra_nav::config::YatraConfig;
use yatra_nav::error::{NavError, Result};
use yatra_nav::executor::NavigationExecutor;
use yatra_nav::poller::SensorPoller;

use marga_grid::GridMap;
use setu_io::{RobotLink, SerialLink};

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "yatra-nav", about = "Serial waypoint navigation controller")]
struct Args {
    /// Path to the TOML configuration
    #[arg(short, long, default_value = "yatra.toml")]
    config: PathBuf,

    /// Serial port override
    #[arg(short, long)]
    port: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = if args.config.exists() {
        log::info!("loading configuration from {}", args.config.display());
        YatraConfig::load(&args.config)?
    } else {
        log::info!("using default configuration");
        YatraConfig::default()
    };
    if let Some(port) = args.port {
        config.serial.port = port;
    }

    log::info!("YatraNav v{}", env!("CARGO_PKG_VERSION"));

    // Open the serial device. Exclusive access here is what keeps a second
    // controller process off the robot.
    let device = SerialLink::open(&config.serial.port, config.serial.baud_rate)?;
    let link = Arc::new(RobotLink::new(
        device,
        Duration::from_millis(config.serial.read_timeout_ms),
    ));

    let map = GridMap::alloc(config.grid.dim_x, config.grid.dim_y)?;
    log::info!(
        "grid {}x{}, cell size {} mm",
        config.grid.dim_x,
        config.grid.dim_y,
        config.robot.cell_size_mm
    );

    // Background sensor poller, sharing the link under its lock.
    let (event_tx, event_rx) = crossbeam_channel::bounded(16);
    let mut sensor_poller = SensorPoller::spawn(
        Arc::clone(&link),
        Duration::from_millis(config.robot.idle_poll_interval_ms),
        event_tx,
    )?;

    // Ctrl-C requests a graceful exit; the loop notices before the next
    // command.
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| NavError::Config(format!("failed to set Ctrl-C handler: {}", e)))?;

    let executor = NavigationExecutor::new(Arc::clone(&link), config.robot.clone());
    let mut ctx = AppContext {
        link,
        executor,
        map,
        route_timeout: Duration::from_secs(config.robot.route_timeout_s),
        events: event_rx,
        quit: false,
    };

    log::info!("ready; type `help` for commands");

    // Process operator input until told to quit.
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        if !running.load(Ordering::Relaxed) {
            break;
        }
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::error!("input closed: {}", e);
                break;
            }
        };

        ctx.drain_events();
        dispatch(&mut ctx, &line);

        if ctx.quit {
            break;
        }
    }

    // Best-effort stop, then wind the poller down.
    if let Err(e) = ctx.link.drive(0) {
        log::warn!("failed to stop drive on exit: {}", e);
    }
    sensor_poller.stop();

    log::info!("YatraNav stopped");
    Ok(())
}
