// Copyright 2025-2026 CEMAXECUTER LLC

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use specmon_dsp::{scale_psd, DspError, IqSignal, PsdEngine};
use specmon_output::ConfigSlot;
use specmon_protocol::{
    Acquisition, CycleError, CycleTimings, PsdResult, ReportSink, TelemetryEvent, TelemetrySink,
};
use specmon_sdr::{RingBuffer, SdrDevice, SdrDriver, SdrError};

/// Where the controller is within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Configured,
    Acquiring,
    Draining,
    Processing,
    ErrorRecovering,
}

/// Bounded waits of the acquisition loop.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    /// Buffer fill checks before giving up on the device.
    pub fill_polls: u32,
    /// Sleep between fill checks and between idle slot checks.
    pub poll_interval: Duration,
    pub recovery_attempts: u32,
    /// Sleep before every reopen attempt.
    pub recovery_backoff: Duration,
    /// Pause between stopping RX and closing the device.
    pub settle: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            fill_polls: 500,
            poll_interval: Duration::from_millis(10),
            recovery_attempts: 3,
            recovery_backoff: Duration::from_millis(500),
            settle: Duration::from_millis(100),
        }
    }
}

/// Owns the radio and runs one acquisition per accepted configuration.
///
/// `device` is declared before `driver` so the handle is closed before the
/// driver library is torn down.
pub struct Controller<D: SdrDriver> {
    device: Option<D::Device>,
    driver: D,
    engine: Box<dyn PsdEngine>,
    publisher: Box<dyn ReportSink>,
    telemetry: Box<dyn TelemetrySink>,
    timing: Timing,
    impedance_ohms: f64,
    state: State,
}

impl<D: SdrDriver> Controller<D> {
    /// Open the device once up front. A failed open is not fatal: the first
    /// cycle finds no handle and goes through recovery.
    pub fn new(
        mut driver: D,
        engine: Box<dyn PsdEngine>,
        publisher: Box<dyn ReportSink>,
        telemetry: Box<dyn TelemetrySink>,
        timing: Timing,
        impedance_ohms: f64,
    ) -> Self {
        let device = match driver.open() {
            Ok(dev) => {
                log::info!("{}: device opened", driver.name());
                Some(dev)
            }
            Err(e) => {
                log::warn!("{}: open failed, continuing without device: {}", driver.name(), e);
                None
            }
        };

        Self {
            device,
            driver,
            engine,
            publisher,
            telemetry,
            timing,
            impedance_ohms,
            state: State::Idle,
        }
    }

    /// Current state. After `run_cycle` fails this is where the cycle stopped.
    pub fn state(&self) -> State {
        self.state
    }

    fn device_mut(&mut self) -> Result<&mut D::Device, CycleError> {
        self.device
            .as_mut()
            .ok_or_else(|| CycleError::HardwareUnavailable("no device handle".to_string()))
    }

    fn enter(&mut self, state: State) {
        if self.state != state {
            log::debug!("controller: {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    /// Main loop: take configurations from `slot` until `running` clears.
    pub fn run(&mut self, slot: &ConfigSlot, running: &AtomicBool) {
        log::info!("controller: waiting for configuration");
        while running.load(Ordering::Relaxed) {
            if !self.poll(slot) {
                thread::sleep(self.timing.poll_interval);
            }
        }
        self.shutdown();
    }

    /// Run one cycle if a configuration is waiting. Returns whether one ran.
    pub fn poll(&mut self, slot: &ConfigSlot) -> bool {
        match slot.take() {
            Some(acq) => {
                self.step(&acq);
                true
            }
            None => false,
        }
    }

    /// One full cycle including telemetry and any recovery. Always ends Idle.
    pub fn step(&mut self, acq: &Acquisition) -> Option<PsdResult> {
        let outcome = self.run_cycle(acq);
        let result = match outcome {
            Ok((result, timings)) => {
                self.telemetry.record(&TelemetryEvent::Completed {
                    timings,
                    desired: &acq.desired,
                    bin_count: result.bin_count(),
                });
                Some(result)
            }
            Err(error) => {
                self.telemetry.record(&TelemetryEvent::Aborted {
                    desired: &acq.desired,
                    error: &error,
                });
                if error.needs_recovery() {
                    if let Err(exhausted) = self.recover() {
                        self.telemetry.record(&TelemetryEvent::Aborted {
                            desired: &acq.desired,
                            error: &exhausted,
                        });
                    }
                }
                None
            }
        };
        self.enter(State::Idle);
        result
    }

    /// Configure, capture, drain, estimate and publish. Cycle-scoped buffers
    /// are allocated here and dropped before returning.
    pub fn run_cycle(
        &mut self,
        acq: &Acquisition,
    ) -> Result<(PsdResult, CycleTimings), CycleError> {
        self.enter(State::Configured);
        let required = acq.ring.total_bytes;

        // The device vets the request before the ring is sized from it
        self.device_mut()?.apply_config(&acq.sdr)?;
        let mut ring = RingBuffer::new(acq.ring.capacity)?;

        self.enter(State::Acquiring);
        let started = Instant::now();
        self.device_mut()?.start_rx(ring.writer())?;

        let mut polls = 0;
        while ring.available() < required && polls < self.timing.fill_polls {
            thread::sleep(self.timing.poll_interval);
            polls += 1;
        }
        let filled = ring.available() >= required;

        self.enter(State::Draining);
        ring.close_writer();
        let stopped = self
            .device
            .as_mut()
            .map_or(Err(SdrError::NotStreaming), |dev| dev.stop_rx());
        let acquisition = started.elapsed();
        if !filled {
            if let Err(e) = stopped {
                log::debug!("stop after timeout: {}", e);
            }
            return Err(CycleError::AcquisitionTimeout {
                available: ring.available(),
                required,
            });
        }
        stopped?;
        if ring.dropped() > 0 {
            log::debug!("ring overwrote unread data {} times", ring.dropped());
        }

        let mut raw = Vec::new();
        raw.try_reserve_exact(required)
            .map_err(|_| CycleError::AllocationFailure(format!("{} byte drain buffer", required)))?;
        raw.resize(required, 0u8);
        ring.read(&mut raw)?;
        ring.free();

        self.enter(State::Processing);
        let dsp_started = Instant::now();
        let signal = IqSignal::from_cs8(&raw)?;
        drop(raw);

        let mut spectrum = self.engine.estimate(&signal, &acq.psd)?;
        drop(signal);
        scale_psd(&mut spectrum.power, acq.desired.scale, self.impedance_ohms);

        let result = PsdResult::new(spectrum, acq.sdr.center_freq_hz);
        let report = result
            .to_report()
            .ok_or_else(|| CycleError::Dsp(DspError::InvalidSegment("empty spectrum".to_string())))?;
        self.publisher.publish(&report)?;

        let timings = CycleTimings {
            acquisition,
            dsp: dsp_started.elapsed(),
        };
        Ok((result, timings))
    }

    /// Tear the device down and reopen it, with a fixed backoff before
    /// every attempt. On exhaustion the handle stays unset.
    pub fn recover(&mut self) -> Result<(), CycleError> {
        self.enter(State::ErrorRecovering);
        log::warn!("{}: recovering device", self.driver.name());

        if let Some(mut dev) = self.device.take() {
            match dev.stop_rx() {
                Ok(()) | Err(SdrError::NotStreaming) => {}
                Err(e) => log::debug!("recovery stop_rx: {}", e),
            }
            thread::sleep(self.timing.settle);
            if let Err(e) = dev.close() {
                log::debug!("recovery close: {}", e);
            }
        }

        let attempts = self.timing.recovery_attempts;
        for attempt in 1..=attempts {
            thread::sleep(self.timing.recovery_backoff);
            match self.driver.open() {
                Ok(dev) => {
                    log::info!("{}: reopened on attempt {}", self.driver.name(), attempt);
                    self.device = Some(dev);
                    self.enter(State::Idle);
                    return Ok(());
                }
                Err(e) => {
                    log::warn!("{}: reopen attempt {}/{} failed: {}", self.driver.name(), attempt, attempts, e);
                }
            }
        }

        log::error!("{}: recovery failed after {} attempts", self.driver.name(), attempts);
        self.enter(State::Idle);
        Err(CycleError::RecoveryExhausted { attempts })
    }

    fn shutdown(&mut self) {
        if let Some(dev) = self.device.take() {
            if let Err(e) = dev.close() {
                log::warn!("{}: close: {}", self.driver.name(), e);
            }
        }
        log::info!("controller stopped");
    }
}
