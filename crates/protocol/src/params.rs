// Copyright 2025-2026 CEMAXECUTER LLC

use specmon_dsp::PsdConfig;
use specmon_sdr::{RingBufferConfig, SdrConfig};

use crate::config::DesiredConfig;
use crate::error::ConfigError;

/// Longest segment the deriver will hand to the FFT.
pub const MAX_NPERSEG: u64 = 1 << 30;

/// Everything one acquisition cycle needs, derived from a single request.
#[derive(Debug, Clone, PartialEq)]
pub struct Acquisition {
    pub desired: DesiredConfig,
    pub sdr: SdrConfig,
    pub psd: PsdConfig,
    pub ring: RingBufferConfig,
}

impl Acquisition {
    pub fn from_desired(desired: DesiredConfig) -> Result<Self, ConfigError> {
        let (sdr, psd, ring) = derive(&desired)?;
        Ok(Self {
            desired,
            sdr,
            psd,
            ring,
        })
    }
}

/// Turn a human request into concrete hardware, FFT and buffer settings.
///
/// `nperseg` is the smallest power of two with
/// `nperseg >= ENBW(window) * fs / rbw`, so the delivered resolution is never
/// coarser than requested. Nothing is returned on error.
pub fn derive(
    desired: &DesiredConfig,
) -> Result<(SdrConfig, PsdConfig, RingBufferConfig), ConfigError> {
    let fs = desired.sample_rate_hz;
    if !(fs.is_finite() && fs > 0.0) {
        return Err(ConfigError::Derivation(format!("sample rate {} Hz must be positive", fs)));
    }
    if desired.rbw_hz <= 0 {
        return Err(ConfigError::Derivation(format!(
            "rbw {} Hz must be positive",
            desired.rbw_hz
        )));
    }
    if !(desired.overlap >= 0.0 && desired.overlap < 1.0) {
        return Err(ConfigError::Derivation(format!(
            "overlap {} outside [0, 1)",
            desired.overlap
        )));
    }

    let required = desired.window.enbw() * fs / desired.rbw_hz as f64;
    if required > MAX_NPERSEG as f64 {
        return Err(ConfigError::Derivation(format!(
            "rbw {} Hz needs a {:.0}-point segment",
            desired.rbw_hz, required
        )));
    }
    let nperseg = (required.ceil() as u64).next_power_of_two().max(2);

    let samples_per_cycle = fs.round() as u64;
    if nperseg > samples_per_cycle {
        return Err(ConfigError::Derivation(format!(
            "rbw {} Hz needs {} samples per segment but a cycle holds {}",
            desired.rbw_hz, nperseg, samples_per_cycle
        )));
    }

    let noverlap = ((nperseg as f64 * desired.overlap).floor() as u64).min(nperseg - 1);

    let sdr = SdrConfig {
        sample_rate_hz: fs,
        center_freq_hz: desired.center_freq_hz,
        lna_gain: desired.lna_gain,
        vga_gain: desired.vga_gain,
        amp_enabled: desired.amp_enabled,
        ppm_error: desired.ppm_error,
    };

    let psd = PsdConfig {
        window: desired.window,
        sample_rate_hz: fs,
        nperseg: nperseg as u32,
        noverlap: noverlap as u32,
    };

    let total_bytes = samples_per_cycle as usize * 2;
    let ring = RingBufferConfig {
        total_bytes,
        capacity: total_bytes * 2,
    };

    Ok((sdr, psd, ring))
}
