// Copyright 2025-2026 CEMAXECUTER LLC

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdrError {
    #[error("device unavailable: {0}")]
    Unavailable(String),
    #[error("{op} failed: {code}")]
    Driver { op: &'static str, code: i32 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("receive already running")]
    AlreadyStreaming,
    #[error("receive not running")]
    NotStreaming,
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RingError {
    #[error("read of {requested} bytes with only {available} available")]
    Insufficient { requested: usize, available: usize },
    #[error("producer overwrote unread bytes during read")]
    Overrun,
    #[error("allocation of {0} byte ring failed")]
    Allocation(usize),
}
