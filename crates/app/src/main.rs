// Copyright 2025-2026 CEMAXECUTER LLC

mod controller;

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;

use specmon_dsp::WelchEngine;
use specmon_output::{CommandListener, ConfigSlot, LogTelemetry, ResultPublisher};
use specmon_protocol::{COMMAND_TOPIC, DATA_TOPIC};
use specmon_sdr::file::ReplayDriver;
use specmon_sdr::SdrDriver;

use controller::{Controller, Timing};

#[derive(Parser, Debug)]
#[command(name = "specmon")]
#[command(about = "SDR power spectral density monitor driven over ZMQ")]
struct Cli {
    /// Command endpoint the SUB socket connects to
    #[arg(long, default_value = "ipc:///tmp/zmq_feed")]
    command_endpoint: String,

    /// Endpoint the result PUB socket binds
    #[arg(long, default_value = "ipc:///tmp/zmq_data")]
    data_endpoint: String,

    #[arg(long, default_value = COMMAND_TOPIC)]
    command_topic: String,

    #[arg(long, default_value = DATA_TOPIC)]
    data_topic: String,

    /// CS8 IQ file to replay instead of live hardware
    #[arg(short = 'f', long)]
    replay: Option<PathBuf>,

    /// Replay as fast as possible instead of at the configured sample rate
    #[arg(long)]
    no_throttle: bool,

    /// HackRF serial number
    #[arg(long)]
    serial: Option<String>,

    /// Buffer fill checks before a cycle times out
    #[arg(long, default_value = "500")]
    fill_polls: u32,

    #[arg(long, default_value = "10")]
    poll_interval_ms: u64,

    /// Device reopen attempts after a hardware fault
    #[arg(long, default_value = "3")]
    recovery_attempts: u32,

    #[arg(long, default_value = "500")]
    recovery_backoff_ms: u64,

    /// Bins either side of DC replaced after estimation
    #[arg(long, default_value = "3")]
    dc_half_width: usize,

    /// Load impedance in ohms for power scaling
    #[arg(long, default_value = "50")]
    impedance: f64,
}

impl Cli {
    fn timing(&self) -> Timing {
        Timing {
            fill_polls: self.fill_polls,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            recovery_attempts: self.recovery_attempts,
            recovery_backoff: Duration::from_millis(self.recovery_backoff_ms),
            ..Timing::default()
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if !(cli.impedance.is_finite() && cli.impedance > 0.0) {
        eprintln!("impedance must be positive, got {}", cli.impedance);
        std::process::exit(1);
    }

    if let Some(ref path) = cli.replay {
        let driver = match ReplayDriver::from_file(path, !cli.no_throttle) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        };
        serve(driver, &cli);
    } else {
        run_live(&cli);
    }
}

#[cfg(feature = "hackrf")]
fn run_live(cli: &Cli) {
    match specmon_sdr::hackrf::HackrfDriver::new(cli.serial.as_deref()) {
        Ok(driver) => serve(driver, cli),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(not(feature = "hackrf"))]
fn run_live(_cli: &Cli) {
    eprintln!("no input specified. Use --replay <file>, or build with the hackrf feature.");
    std::process::exit(1);
}

/// Clear `running` on Ctrl-C so the controller closes the device and the
/// listener thread exits.
fn watch_ctrl_c(running: Arc<AtomicBool>) -> io::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()?;
    thread::Builder::new()
        .name("signal".to_string())
        .spawn(move || match rt.block_on(tokio::signal::ctrl_c()) {
            Ok(()) => {
                log::info!("shutting down...");
                running.store(false, Ordering::Relaxed);
            }
            Err(e) => log::warn!("ctrl-c handler: {}", e),
        })?;
    Ok(())
}

/// Bring up the control plane, then hand the main thread to the controller.
fn serve<D: SdrDriver>(driver: D, cli: &Cli) {
    log::info!(
        "specmon starting ({} backend, dc half-width {}, {} ohm)",
        driver.name(),
        cli.dc_half_width,
        cli.impedance
    );

    let publisher = match ResultPublisher::bind(&cli.data_endpoint, &cli.data_topic) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    let slot = Arc::new(ConfigSlot::new());
    let running = Arc::new(AtomicBool::new(true));
    let listener = match CommandListener::connect(
        &cli.command_endpoint,
        &cli.command_topic,
        slot.clone(),
        running.clone(),
    )
    .and_then(CommandListener::spawn)
    {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = watch_ctrl_c(running.clone()) {
        log::warn!("no ctrl-c handler: {}", e);
    }

    let mut controller = Controller::new(
        driver,
        Box::new(WelchEngine::new(cli.dc_half_width)),
        Box::new(publisher),
        Box::new(LogTelemetry::new()),
        cli.timing(),
        cli.impedance,
    );
    controller.run(&slot, &running);
    drop(controller);

    if listener.join().is_err() {
        log::error!("command listener panicked");
    }
}
