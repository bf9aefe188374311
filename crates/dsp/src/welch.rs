// Copyright 2025-2026 CEMAXECUTER LLC

//! Welch power spectral density estimation.
//!
//! Averages the periodograms of overlapping windowed segments, rotates the
//! result so bin 0 is `-fs/2`, and flattens the zero-IF DC artifact the
//! mixer leaves in the centre bins.

use num_complex::Complex64;

use crate::error::{try_zeroed, DspError};
use crate::fft::ForwardFft;
use crate::iq::IqSignal;
use crate::window::{self, WindowKind};

/// Bins on each side of DC replaced by the neighbour mean (7 bins total).
pub const DEFAULT_DC_HALF_WIDTH: usize = 3;

/// Segmenting parameters for one Welch estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PsdConfig {
    pub window: WindowKind,
    pub sample_rate_hz: f64,
    /// Segment (and FFT) length, a power of two.
    pub nperseg: u32,
    /// Samples shared by consecutive segments, `< nperseg`.
    pub noverlap: u32,
}

impl PsdConfig {
    pub fn bin_width_hz(&self) -> f64 {
        self.sample_rate_hz / self.nperseg as f64
    }
}

/// Baseband frequency axis and power per bin, both `nperseg` long.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub frequencies_hz: Vec<f64>,
    pub power: Vec<f64>,
}

/// Interface the acquisition loop drives; Welch is the only implementation.
pub trait PsdEngine: Send {
    fn estimate(&mut self, signal: &IqSignal, config: &PsdConfig) -> Result<Spectrum, DspError>;
}

/// Welch engine with a configurable DC flattening width.
#[derive(Debug, Clone)]
pub struct WelchEngine {
    dc_half_width: usize,
}

impl WelchEngine {
    pub fn new(dc_half_width: usize) -> Self {
        Self { dc_half_width }
    }
}

impl Default for WelchEngine {
    fn default() -> Self {
        Self::new(DEFAULT_DC_HALF_WIDTH)
    }
}

impl PsdEngine for WelchEngine {
    fn estimate(&mut self, signal: &IqSignal, config: &PsdConfig) -> Result<Spectrum, DspError> {
        execute_welch_psd(signal, config, self.dc_half_width)
    }
}

/// Compute the averaged, shifted, DC-flattened periodogram of `signal`.
///
/// Power is scaled by `1 / (fs * U * K * nperseg)` where `U` is the mean
/// squared window coefficient and `K` the number of segments. Frequencies
/// are baseband offsets; callers add the centre frequency.
pub fn execute_welch_psd(
    signal: &IqSignal,
    config: &PsdConfig,
    dc_half_width: usize,
) -> Result<Spectrum, DspError> {
    let nperseg = config.nperseg as usize;
    let noverlap = config.noverlap as usize;
    let fs = config.sample_rate_hz;

    if nperseg < 2 {
        return Err(DspError::InvalidSegment(format!("nperseg {} < 2", nperseg)));
    }
    if noverlap >= nperseg {
        return Err(DspError::InvalidSegment(format!(
            "noverlap {} >= nperseg {}",
            noverlap, nperseg
        )));
    }
    if !(fs.is_finite() && fs > 0.0) {
        return Err(DspError::InvalidSegment(format!("sample rate {} Hz", fs)));
    }

    let samples = signal.samples();
    if samples.len() < nperseg {
        return Err(DspError::SignalTooShort {
            samples: samples.len(),
            nperseg,
            noverlap,
        });
    }

    let step = nperseg - noverlap;
    let k_segments = (samples.len() - noverlap) / step;

    let window = config.window.coefficients(nperseg);
    let u_norm = window::mean_power(&window);
    log::trace!(
        "welch: {} segments of {} ({} overlap, {} window)",
        k_segments,
        nperseg,
        noverlap,
        config.window.name()
    );

    let mut fft = ForwardFft::new(nperseg);
    let mut segment: Vec<Complex64> = try_zeroed(nperseg)?;
    let mut power: Vec<f64> = try_zeroed(nperseg)?;

    for k in 0..k_segments {
        let start = k * step;
        for ((dst, &x), &w) in segment
            .iter_mut()
            .zip(&samples[start..start + nperseg])
            .zip(&window)
        {
            *dst = x * w;
        }

        fft.process(&mut segment);

        for (acc, bin) in power.iter_mut().zip(&segment) {
            *acc += bin.norm_sqr();
        }
    }

    let scale = 1.0 / (fs * u_norm * k_segments as f64 * nperseg as f64);
    for p in power.iter_mut() {
        *p *= scale;
    }

    fft_shift(&mut power);
    flatten_dc(&mut power, dc_half_width);

    let mut frequencies_hz: Vec<f64> = try_zeroed(nperseg)?;
    let df = fs / nperseg as f64;
    for (i, f) in frequencies_hz.iter_mut().enumerate() {
        *f = -fs / 2.0 + i as f64 * df;
    }

    Ok(Spectrum {
        frequencies_hz,
        power,
    })
}

/// Rotate so index 0 holds the most negative frequency.
fn fft_shift(data: &mut [f64]) {
    let half = data.len() / 2;
    data.rotate_left(half);
}

/// Replace the `2 * half_width + 1` bins centred on DC with the mean of the
/// two bins just outside them. No-op when the spectrum is too short to have
/// both neighbours.
pub fn flatten_dc(power: &mut [f64], half_width: usize) {
    let n = power.len();
    match half_width.checked_add(1).and_then(|h| h.checked_mul(2)) {
        Some(span) if span < n => {}
        _ => return,
    }
    let c = n / 2;
    let neighbor_mean = (power[c - half_width - 1] + power[c + half_width + 1]) / 2.0;
    for p in &mut power[c - half_width..=c + half_width] {
        *p = neighbor_mean;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn peak_bin(spectrum: &Spectrum) -> usize {
        spectrum
            .power
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap()
    }

    fn tone(freq_hz: f64, fs: f64, amplitude: f64, len: usize) -> IqSignal {
        IqSignal::from_samples(
            (0..len)
                .map(|n| {
                    let phase = 2.0 * PI * freq_hz * n as f64 / fs;
                    Complex64::new(amplitude * phase.cos(), amplitude * phase.sin())
                })
                .collect(),
        )
    }

    /// Deterministic pseudo-noise (xorshift) in [-1, 1).
    fn noise(len: usize, seed: u64) -> IqSignal {
        let mut s = seed.max(1);
        let mut next = move || {
            s ^= s << 13;
            s ^= s >> 7;
            s ^= s << 17;
            (s >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
        };
        IqSignal::from_samples((0..len).map(|_| Complex64::new(next(), next())).collect())
    }

    fn cfg(window: WindowKind, fs: f64, nperseg: u32, noverlap: u32) -> PsdConfig {
        PsdConfig {
            window,
            sample_rate_hz: fs,
            nperseg,
            noverlap,
        }
    }

    #[test]
    fn test_tone_peak_within_one_bin() {
        let fs = 1_000_000.0;
        for &(f0, window) in &[
            (123_456.0, WindowKind::Hann),
            (-210_000.0, WindowKind::Hamming),
            (402_000.0, WindowKind::Blackman),
            (-37_500.0, WindowKind::Rectangular),
        ] {
            let config = cfg(window, fs, 1024, 512);
            let spec = execute_welch_psd(&tone(f0, fs, 10.0, 16_384), &config, 3).unwrap();
            let peak = peak_bin(&spec);
            let err = (spec.frequencies_hz[peak] - f0).abs();
            assert!(
                err <= config.bin_width_hz(),
                "{:?}: peak at {} Hz, expected {} Hz",
                window,
                spec.frequencies_hz[peak],
                f0
            );
        }
    }

    #[test]
    fn test_output_lengths_and_axis() {
        let fs = 2_000_000.0;
        let spec = execute_welch_psd(&noise(8192, 7), &cfg(WindowKind::Hann, fs, 256, 128), 3)
            .unwrap();
        assert_eq!(spec.frequencies_hz.len(), 256);
        assert_eq!(spec.power.len(), 256);
        assert_eq!(spec.frequencies_hz[0], -fs / 2.0);
        assert_eq!(spec.frequencies_hz[128], 0.0);
        let df = fs / 256.0;
        assert!((spec.frequencies_hz[255] - (fs / 2.0 - df)).abs() < 1e-6);
    }

    #[test]
    fn test_dc_bins_flattened() {
        let spec = execute_welch_psd(
            &noise(4096, 99),
            &cfg(WindowKind::Hamming, 1_000_000.0, 512, 0),
            3,
        )
        .unwrap();
        let c = 256;
        let expected = (spec.power[c - 4] + spec.power[c + 4]) / 2.0;
        for i in c - 3..=c + 3 {
            assert_eq!(spec.power[i], expected, "bin {} not flattened", i);
        }
        assert_ne!(spec.power[c - 4], spec.power[c + 4]);
    }

    #[test]
    fn test_flatten_skipped_for_short_spectrum() {
        let mut p: Vec<f64> = (0..8).map(|i| i as f64).collect();
        flatten_dc(&mut p, 3);
        assert_eq!(p, (0..8).map(|i| i as f64).collect::<Vec<_>>());

        let mut p: Vec<f64> = (0..16).map(|i| i as f64).collect();
        flatten_dc(&mut p, 3);
        assert_eq!(&p[5..12], &[8.0; 7]);
        assert_eq!(p[4], 4.0);
        assert_eq!(p[12], 12.0);
    }

    #[test]
    fn test_flatten_width_configurable() {
        let mut p: Vec<f64> = (0..32).map(|i| i as f64).collect();
        flatten_dc(&mut p, 1);
        assert_eq!(&p[15..18], &[16.0; 3]);
        assert_eq!(p[14], 14.0);
        assert_eq!(p[18], 18.0);
    }

    #[test]
    fn test_flatten_oversized_width_is_noop() {
        let orig: Vec<f64> = (0..64).map(|i| i as f64).collect();
        for width in [32, usize::MAX / 2, usize::MAX - 1, usize::MAX] {
            let mut p = orig.clone();
            flatten_dc(&mut p, width);
            assert_eq!(p, orig, "half width {}", width);
        }

        let spec = execute_welch_psd(
            &noise(4096, 3),
            &cfg(WindowKind::Hann, 1_000_000.0, 256, 0),
            usize::MAX,
        )
        .unwrap();
        assert_eq!(spec.power.len(), 256);
    }

    #[test]
    fn test_parseval_rectangular() {
        // Bin-centred tone: integrated power equals amplitude squared
        let fs = 1_024_000.0;
        let nperseg = 1024;
        let amplitude = 3.0;
        let f0 = 100.0 * fs / nperseg as f64;
        let spec = execute_welch_psd(
            &tone(f0, fs, amplitude, 8192),
            &cfg(WindowKind::Rectangular, fs, nperseg, 0),
            3,
        )
        .unwrap();
        let total: f64 = spec.power.iter().sum::<f64>() * fs / nperseg as f64;
        assert!(
            (total - amplitude * amplitude).abs() < 1e-6,
            "integrated power {}",
            total
        );
    }

    #[test]
    fn test_overlap_does_not_change_level() {
        let fs = 1_000_000.0;
        let sig = tone(250_000.0, fs, 2.0, 16_384);
        let a = execute_welch_psd(&sig, &cfg(WindowKind::Hann, fs, 512, 0), 3).unwrap();
        let b = execute_welch_psd(&sig, &cfg(WindowKind::Hann, fs, 512, 256), 3).unwrap();
        let pa = a.power[peak_bin(&a)];
        let pb = b.power[peak_bin(&b)];
        assert!((pa - pb).abs() / pa < 1e-6, "{} vs {}", pa, pb);
    }

    #[test]
    fn test_signal_too_short() {
        let err = execute_welch_psd(&noise(100, 1), &cfg(WindowKind::Hann, 1e6, 128, 0), 3)
            .unwrap_err();
        assert_eq!(
            err,
            DspError::SignalTooShort {
                samples: 100,
                nperseg: 128,
                noverlap: 0
            }
        );
    }

    #[test]
    fn test_invalid_overlap_rejected() {
        let err = execute_welch_psd(&noise(1024, 1), &cfg(WindowKind::Hann, 1e6, 128, 128), 3)
            .unwrap_err();
        assert!(matches!(err, DspError::InvalidSegment(_)));
    }

    #[test]
    fn test_engine_trait() {
        let mut engine: Box<dyn PsdEngine> = Box::new(WelchEngine::default());
        let spec = engine
            .estimate(&noise(2048, 3), &cfg(WindowKind::Blackman, 1e6, 64, 32))
            .unwrap();
        assert_eq!(spec.power.len(), 64);
        assert!(spec.power.iter().all(|p| p.is_finite() && *p >= 0.0));
    }
}
