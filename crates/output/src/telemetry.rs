// Copyright 2025-2026 CEMAXECUTER LLC

use specmon_protocol::{TelemetryEvent, TelemetrySink};

/// Telemetry sink that writes cycle outcomes to the log.
#[derive(Debug, Default)]
pub struct LogTelemetry {
    completed: u64,
    aborted: u64,
}

impl LogTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn aborted(&self) -> u64 {
        self.aborted
    }
}

impl TelemetrySink for LogTelemetry {
    fn record(&mut self, event: &TelemetryEvent<'_>) {
        match event {
            TelemetryEvent::Completed {
                timings,
                desired,
                bin_count,
            } => {
                self.completed += 1;
                log::info!(
                    "cycle {}: {} Hz, {} bins, acquire {:.1} ms, dsp {:.1} ms",
                    self.completed,
                    desired.center_freq_hz,
                    bin_count,
                    timings.acquisition.as_secs_f64() * 1e3,
                    timings.dsp.as_secs_f64() * 1e3,
                );
            }
            TelemetryEvent::Aborted { desired, error } => {
                self.aborted += 1;
                log::warn!(
                    "cycle aborted at {} Hz ({} total): {}",
                    desired.center_freq_hz,
                    self.aborted,
                    error
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specmon_protocol::{CycleError, CycleTimings, DesiredConfig};
    use std::time::Duration;

    #[test]
    fn test_counts_outcomes() {
        let mut t = LogTelemetry::new();
        let desired = DesiredConfig::default();
        let timings = CycleTimings {
            acquisition: Duration::from_millis(1000),
            dsp: Duration::from_millis(12),
        };
        t.record(&TelemetryEvent::Completed {
            timings,
            desired: &desired,
            bin_count: 4096,
        });
        t.record(&TelemetryEvent::Completed {
            timings,
            desired: &desired,
            bin_count: 4096,
        });
        let err = CycleError::AcquisitionTimeout {
            available: 10,
            required: 20,
        };
        t.record(&TelemetryEvent::Aborted {
            desired: &desired,
            error: &err,
        });
        assert_eq!(t.completed(), 2);
        assert_eq!(t.aborted(), 1);
    }
}
