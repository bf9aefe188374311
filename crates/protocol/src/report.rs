// Copyright 2025-2026 CEMAXECUTER LLC

use serde::{Deserialize, Serialize};

use specmon_dsp::Spectrum;

/// Topic prefix of inbound acquisition commands.
pub const COMMAND_TOPIC: &str = "acquire";

/// Topic prefix of published spectra.
pub const DATA_TOPIC: &str = "data";

/// One cycle's scaled spectrum, tagged with the tuned centre frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct PsdResult {
    pub frequencies_hz: Vec<f64>,
    pub power: Vec<f64>,
    pub center_freq_hz: u64,
}

impl PsdResult {
    pub fn new(spectrum: Spectrum, center_freq_hz: u64) -> Self {
        Self {
            frequencies_hz: spectrum.frequencies_hz,
            power: spectrum.power,
            center_freq_hz,
        }
    }

    pub fn bin_count(&self) -> usize {
        self.power.len()
    }

    /// Wire form with absolute band edges. `None` for an empty spectrum.
    pub fn to_report(&self) -> Option<PsdReport> {
        let center = self.center_freq_hz as f64;
        let first = self.frequencies_hz.first()?;
        let last = self.frequencies_hz.last()?;
        Some(PsdReport {
            start_freq_hz: first + center,
            end_freq_hz: last + center,
            bin_count: self.power.len(),
            pxx: self.power.clone(),
        })
    }
}

/// Outbound `data` message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PsdReport {
    pub start_freq_hz: f64,
    pub end_freq_hz: f64,
    pub bin_count: usize,
    #[serde(rename = "Pxx")]
    pub pxx: Vec<f64>,
}

impl PsdReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// `"<topic> <payload>"`, a single ASCII space between the two.
pub fn frame(topic: &str, payload: &str) -> String {
    format!("{} {}", topic, payload)
}

/// Split a framed message on its first space.
pub fn split_frame(message: &str) -> Option<(&str, &str)> {
    message.split_once(' ')
}
