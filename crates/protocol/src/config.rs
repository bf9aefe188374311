// Copyright 2025-2026 CEMAXECUTER LLC

use serde_json::Value;

use specmon_dsp::{ScaleUnit, WindowKind};

use crate::error::ConfigError;

/// Human-level acquisition request, as received on the command channel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DesiredConfig {
    pub center_freq_hz: u64,
    pub sample_rate_hz: f64,
    pub rbw_hz: i32,
    /// Informational only; the analysed band is set by the sample rate.
    pub span_hz: f64,
    pub overlap: f64,
    pub window: WindowKind,
    pub scale: ScaleUnit,
    pub lna_gain: i32,
    pub vga_gain: i32,
    pub amp_enabled: bool,
    pub ppm_error: i32,
}

impl DesiredConfig {
    /// Parse one command payload.
    ///
    /// Missing or non-numeric numeric fields read as zero; an unknown window
    /// falls back to rectangular and an unknown scale to dBm. Anything that
    /// is not a JSON object is rejected.
    pub fn from_json(payload: &str) -> Result<Self, ConfigError> {
        let root: Value =
            serde_json::from_str(payload).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if !root.is_object() {
            return Err(ConfigError::Parse("payload is not a JSON object".to_string()));
        }

        let number = |key: &str| root.get(key).and_then(|v| v.as_f64()).unwrap_or(0.0);

        let window = match root.get("window").and_then(|w| w.as_str()) {
            Some(name) => WindowKind::from_name(name).unwrap_or_else(|| {
                log::warn!("unknown window '{}', using rectangular", name);
                WindowKind::Rectangular
            }),
            None => WindowKind::Rectangular,
        };

        let scale = root
            .get("scale")
            .and_then(|s| s.as_str())
            .and_then(ScaleUnit::from_name)
            .unwrap_or_default();

        Ok(Self {
            center_freq_hz: number("center_freq_hz") as u64,
            sample_rate_hz: number("sample_rate_hz"),
            rbw_hz: number("rbw_hz") as i32,
            span_hz: number("span"),
            overlap: number("overlap"),
            window,
            scale,
            lna_gain: number("lna_gain") as i32,
            vga_gain: number("vga_gain") as i32,
            amp_enabled: root
                .get("antenna_amp")
                .and_then(|a| a.as_bool())
                .unwrap_or(false),
            ppm_error: 0,
        })
    }
}
