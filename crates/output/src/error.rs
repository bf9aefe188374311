// Copyright 2025-2026 CEMAXECUTER LLC

use thiserror::Error;

/// Socket setup failures. These are fatal at startup.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("zmq {op}: {source}")]
    Zmq {
        op: &'static str,
        #[source]
        source: zmq::Error,
    },
    #[error("zmq {op} {endpoint}: {source}")]
    Endpoint {
        op: &'static str,
        endpoint: String,
        #[source]
        source: zmq::Error,
    },
    #[error("thread spawn: {0}")]
    Spawn(#[from] std::io::Error),
}

pub(crate) fn zmq_err(op: &'static str) -> impl FnOnce(zmq::Error) -> TransportError {
    move |source| TransportError::Zmq { op, source }
}
