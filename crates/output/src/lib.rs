// Copyright 2025-2026 CEMAXECUTER LLC

pub mod slot;
pub mod telemetry;

#[cfg(feature = "zmq")]
pub mod error;

#[cfg(feature = "zmq")]
pub mod zmq_pub;

#[cfg(feature = "zmq")]
pub mod control;

pub use slot::ConfigSlot;
pub use telemetry::LogTelemetry;

#[cfg(feature = "zmq")]
pub use control::CommandListener;
#[cfg(feature = "zmq")]
pub use error::TransportError;
#[cfg(feature = "zmq")]
pub use zmq_pub::ResultPublisher;
