// Copyright 2025-2026 CEMAXECUTER LLC

use thiserror::Error;

use specmon_dsp::DspError;
use specmon_sdr::{RingError, SdrError};

/// Rejection of an inbound command. The previous configuration stays in force.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unparsable configuration: {0}")]
    Parse(String),
    #[error("invalid configuration: {0}")]
    Derivation(String),
}

#[derive(Error, Debug)]
#[error("publish failed: {0}")]
pub struct PublishError(pub String);

/// Why an acquisition cycle was aborted. Never escapes one controller iteration.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("hardware unavailable: {0}")]
    HardwareUnavailable(String),
    #[error("acquisition timeout: {available} of {required} bytes buffered")]
    AcquisitionTimeout { available: usize, required: usize },
    #[error("allocation failure: {0}")]
    AllocationFailure(String),
    #[error("device recovery exhausted after {attempts} attempts")]
    RecoveryExhausted { attempts: u32 },
    #[error("hardware error: {0}")]
    Hardware(SdrError),
    #[error("dsp error: {0}")]
    Dsp(DspError),
    #[error("ring buffer error: {0}")]
    Ring(RingError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl CycleError {
    /// Whether the device is implicated and must be torn down and reopened.
    pub fn needs_recovery(&self) -> bool {
        match self {
            CycleError::HardwareUnavailable(_) | CycleError::AcquisitionTimeout { .. } => true,
            CycleError::Hardware(SdrError::InvalidConfig(_)) => false,
            CycleError::Hardware(_) => true,
            _ => false,
        }
    }
}

impl From<SdrError> for CycleError {
    fn from(e: SdrError) -> Self {
        match e {
            SdrError::Unavailable(msg) => CycleError::HardwareUnavailable(msg),
            other => CycleError::Hardware(other),
        }
    }
}

impl From<DspError> for CycleError {
    fn from(e: DspError) -> Self {
        match e {
            DspError::Allocation(n) => CycleError::AllocationFailure(format!("{} samples", n)),
            other => CycleError::Dsp(other),
        }
    }
}

impl From<RingError> for CycleError {
    fn from(e: RingError) -> Self {
        match e {
            RingError::Allocation(n) => CycleError::AllocationFailure(format!("{} byte ring", n)),
            other => CycleError::Ring(other),
        }
    }
}
