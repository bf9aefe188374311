// Copyright 2025-2026 CEMAXECUTER LLC

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::{RingWriter, SdrConfig, SdrDevice, SdrDriver, SdrError};

/// libhackrf's default transfer size (131072 complex CS8 samples).
pub const TRANSFER_SIZE: usize = 262_144;

/// Replays a CS8 capture in place of a radio.
///
/// Each opened device loops over the same bytes, delivering them in
/// fixed-size transfers from a producer thread just like libhackrf does.
pub struct ReplayDriver {
    label: String,
    source: Arc<[u8]>,
    throttle: bool,
    transfer_size: usize,
}

impl ReplayDriver {
    /// Load a CS8 file (pairs of i8, I then Q).
    pub fn from_file(path: impl AsRef<Path>, throttle: bool) -> Result<Self, SdrError> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        if data.len() % 2 != 0 {
            return Err(SdrError::InvalidConfig(format!(
                "{}: CS8 length {} is not a multiple of 2",
                path.display(),
                data.len()
            )));
        }
        log::info!("replay source {} ({} bytes)", path.display(), data.len());
        Ok(Self {
            label: path.display().to_string(),
            source: data.into(),
            throttle,
            transfer_size: TRANSFER_SIZE,
        })
    }

    pub fn from_bytes(data: Vec<u8>, throttle: bool) -> Self {
        Self {
            label: "memory".to_string(),
            source: data.into(),
            throttle,
            transfer_size: TRANSFER_SIZE,
        }
    }
}

impl SdrDriver for ReplayDriver {
    type Device = ReplayDevice;

    fn open(&mut self) -> Result<ReplayDevice, SdrError> {
        if self.source.is_empty() {
            return Err(SdrError::Unavailable(format!("{}: empty replay source", self.label)));
        }
        Ok(ReplayDevice {
            source: self.source.clone(),
            throttle: self.throttle,
            transfer_size: self.transfer_size,
            sample_rate_hz: 0.0,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        })
    }

    fn name(&self) -> &str {
        "replay"
    }
}

pub struct ReplayDevice {
    source: Arc<[u8]>,
    throttle: bool,
    transfer_size: usize,
    sample_rate_hz: f64,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ReplayDevice {
    fn shutdown(&mut self) -> Result<(), SdrError> {
        let worker = self.worker.take().ok_or(SdrError::NotStreaming)?;
        self.running.store(false, Ordering::Release);
        worker
            .join()
            .map_err(|_| SdrError::Unavailable("replay producer panicked".to_string()))
    }
}

impl SdrDevice for ReplayDevice {
    fn apply_config(&mut self, config: &SdrConfig) -> Result<(), SdrError> {
        if !(config.sample_rate_hz.is_finite() && config.sample_rate_hz > 0.0) {
            return Err(SdrError::InvalidConfig(format!(
                "sample rate {} Hz",
                config.sample_rate_hz
            )));
        }
        self.sample_rate_hz = config.sample_rate_hz;
        Ok(())
    }

    fn start_rx(&mut self, writer: RingWriter) -> Result<(), SdrError> {
        if self.worker.is_some() {
            return Err(SdrError::AlreadyStreaming);
        }
        if self.sample_rate_hz <= 0.0 {
            return Err(SdrError::InvalidConfig("start_rx before apply_config".to_string()));
        }

        let source = self.source.clone();
        let running = self.running.clone();
        let transfer = self.transfer_size;
        // Two bytes per complex sample
        let period = Duration::from_secs_f64(transfer as f64 / (2.0 * self.sample_rate_hz));
        let throttle = self.throttle;

        running.store(true, Ordering::Release);
        let worker = thread::Builder::new()
            .name("replay-rx".to_string())
            .spawn(move || {
                let mut offset = 0;
                let mut next = Instant::now();
                while running.load(Ordering::Acquire) && writer.is_accepting() {
                    let end = (offset + transfer).min(source.len());
                    writer.write(&source[offset..end]);
                    offset = if end == source.len() { 0 } else { end };

                    if throttle {
                        next += period;
                        if let Some(wait) = next.checked_duration_since(Instant::now()) {
                            thread::sleep(wait);
                        }
                    } else {
                        thread::yield_now();
                    }
                }
            })?;
        self.worker = Some(worker);
        Ok(())
    }

    fn stop_rx(&mut self) -> Result<(), SdrError> {
        self.shutdown()
    }

    fn close(mut self) -> Result<(), SdrError> {
        match self.shutdown() {
            Ok(()) | Err(SdrError::NotStreaming) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for ReplayDevice {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}
