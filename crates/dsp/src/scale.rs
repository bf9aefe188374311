// Copyright 2025-2026 CEMAXECUTER LLC

/// Reference system impedance for power/voltage conversions.
pub const DEFAULT_IMPEDANCE_OHMS: f64 = 50.0;

/// Floor applied before the division by impedance so `log10` stays finite.
pub const POWER_FLOOR: f64 = 1.0e-20;

/// Output unit of the published spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleUnit {
    #[default]
    Dbm,
    Dbuv,
    Dbmv,
    Watts,
    Volts,
}

impl ScaleUnit {
    /// Exact-match lookup of the command channel spellings.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "dBm" => Some(ScaleUnit::Dbm),
            "dBuV" => Some(ScaleUnit::Dbuv),
            "dBmV" => Some(ScaleUnit::Dbmv),
            "W" => Some(ScaleUnit::Watts),
            "V" => Some(ScaleUnit::Volts),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScaleUnit::Dbm => "dBm",
            ScaleUnit::Dbuv => "dBuV",
            ScaleUnit::Dbmv => "dBmV",
            ScaleUnit::Watts => "W",
            ScaleUnit::Volts => "V",
        }
    }
}

/// Relabel raw PSD values in place into `unit`.
///
/// `p_watts = max(p, floor) / Z` anchors everything; dB units are offsets
/// from dBm. This is not a calibration: external attenuation and the real
/// front-end impedance must be accounted for elsewhere.
pub fn scale_psd(power: &mut [f64], unit: ScaleUnit, impedance_ohms: f64) {
    for p in power.iter_mut() {
        let p_watts = p.max(POWER_FLOOR) / impedance_ohms;
        let dbm = watts_to_dbm(p_watts);
        *p = match unit {
            ScaleUnit::Dbm => dbm,
            ScaleUnit::Dbuv => dbm + 107.0,
            ScaleUnit::Dbmv => dbm + 47.0,
            ScaleUnit::Watts => p_watts,
            ScaleUnit::Volts => (p_watts * impedance_ohms).sqrt(),
        };
    }
}

pub fn watts_to_dbm(p_watts: f64) -> f64 {
    10.0 * (p_watts * 1000.0).log10()
}
