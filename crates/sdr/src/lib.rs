// Copyright 2025-2026 CEMAXECUTER LLC

pub mod error;
pub mod file;
pub mod ring;

#[cfg(feature = "hackrf")]
pub mod hackrf;

pub use error::{RingError, SdrError};
pub use ring::{RingBuffer, RingWriter};

/// Front-end settings the driver applies verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SdrConfig {
    pub sample_rate_hz: f64,
    pub center_freq_hz: u64,
    pub lna_gain: i32,
    pub vga_gain: i32,
    pub amp_enabled: bool,
    pub ppm_error: i32,
}

impl SdrConfig {
    /// Centre frequency corrected for the reference oscillator error.
    pub fn corrected_center_hz(&self) -> u64 {
        ppm_correct(self.center_freq_hz as f64, self.ppm_error).round() as u64
    }

    /// Sample rate corrected for the reference oscillator error.
    pub fn corrected_sample_rate_hz(&self) -> f64 {
        ppm_correct(self.sample_rate_hz, self.ppm_error)
    }
}

fn ppm_correct(hz: f64, ppm: i32) -> f64 {
    hz * (1.0 - ppm as f64 / 1e6)
}

/// Ring sizing for one analysis cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RingBufferConfig {
    /// Bytes consumed by one cycle (one second of CS8 I/Q).
    pub total_bytes: usize,
    /// Arena size, at least twice `total_bytes`.
    pub capacity: usize,
}

/// An opened radio.
///
/// `start_rx` hands the device a write-only view of the ring; the device
/// delivers every transfer to it from its own callback context until
/// `stop_rx` returns.
pub trait SdrDevice: Send {
    fn apply_config(&mut self, config: &SdrConfig) -> Result<(), SdrError>;

    fn start_rx(&mut self, writer: RingWriter) -> Result<(), SdrError>;

    fn stop_rx(&mut self) -> Result<(), SdrError>;

    /// Stop any stream and release the device.
    fn close(self) -> Result<(), SdrError>
    where
        Self: Sized;
}

/// Opens devices of one backend.
pub trait SdrDriver {
    type Device: SdrDevice;

    fn open(&mut self) -> Result<Self::Device, SdrError>;

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_ppm_is_identity() {
        let cfg = SdrConfig {
            sample_rate_hz: 2_000_000.0,
            center_freq_hz: 98_500_000,
            ..Default::default()
        };
        assert_eq!(cfg.corrected_center_hz(), 98_500_000);
        assert_eq!(cfg.corrected_sample_rate_hz(), 2_000_000.0);
    }

    #[test]
    fn test_ppm_correction() {
        let cfg = SdrConfig {
            sample_rate_hz: 10_000_000.0,
            center_freq_hz: 100_000_000,
            ppm_error: 10,
            ..Default::default()
        };
        assert_eq!(cfg.corrected_center_hz(), 99_999_000);
        assert!((cfg.corrected_sample_rate_hz() - 9_999_900.0).abs() < 1e-6);
    }
}
