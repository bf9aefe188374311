// Copyright 2025-2026 CEMAXECUTER LLC

use std::time::Duration;

use crate::config::DesiredConfig;
use crate::error::{CycleError, PublishError};
use crate::report::PsdReport;

/// Destination of completed spectra.
pub trait ReportSink {
    fn publish(&mut self, report: &PsdReport) -> Result<(), PublishError>;
}

/// Wall-clock cost of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CycleTimings {
    /// Start of RX to stop of RX.
    pub acquisition: Duration,
    /// IQ conversion through publish.
    pub dsp: Duration,
}

/// What the controller reports at the end of every cycle.
#[derive(Debug)]
pub enum TelemetryEvent<'a> {
    Completed {
        timings: CycleTimings,
        desired: &'a DesiredConfig,
        bin_count: usize,
    },
    Aborted {
        desired: &'a DesiredConfig,
        error: &'a CycleError,
    },
}

/// Fire-and-forget observer of cycle outcomes.
pub trait TelemetrySink {
    fn record(&mut self, event: &TelemetryEvent<'_>);
}
