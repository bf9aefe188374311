// Copyright 2025-2026 CEMAXECUTER LLC

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    #[error("signal too short: {samples} samples cannot hold one segment of {nperseg} (overlap {noverlap})")]
    SignalTooShort {
        samples: usize,
        nperseg: usize,
        noverlap: usize,
    },
    #[error("invalid segment configuration: {0}")]
    InvalidSegment(String),
    #[error("allocation of {0} elements failed")]
    Allocation(usize),
}

/// Allocate a zero-filled vector, reporting exhaustion instead of aborting.
pub(crate) fn try_zeroed<T: Clone + Default>(len: usize) -> Result<Vec<T>, DspError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|_| DspError::Allocation(len))?;
    v.resize(len, T::default());
    Ok(v)
}
