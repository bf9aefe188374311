// Copyright 2025-2026 CEMAXECUTER LLC

use num_complex::Complex64;

use crate::error::DspError;

/// Complex baseband samples for one analysis cycle.
#[derive(Debug, Clone)]
pub struct IqSignal {
    samples: Vec<Complex64>,
}

impl IqSignal {
    /// Convert interleaved signed 8-bit I/Q pairs (CS8) into complex samples.
    ///
    /// A trailing odd byte is ignored. Values are kept in raw ADC units.
    pub fn from_cs8(bytes: &[u8]) -> Result<Self, DspError> {
        let n = bytes.len() / 2;
        let mut samples = Vec::new();
        samples.try_reserve_exact(n).map_err(|_| DspError::Allocation(n))?;
        samples.extend(
            bytes
                .chunks_exact(2)
                .map(|pair| Complex64::new(pair[0] as i8 as f64, pair[1] as i8 as f64)),
        );
        Ok(Self { samples })
    }

    pub fn from_samples(samples: Vec<Complex64>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[Complex64] {
        &self.samples
    }
}
