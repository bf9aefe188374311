// Copyright 2025-2026 CEMAXECUTER LLC

pub mod config;
pub mod error;
pub mod params;
pub mod report;
pub mod sink;

pub use config::DesiredConfig;
pub use error::{ConfigError, CycleError, PublishError};
pub use params::{derive, Acquisition};
pub use report::{frame, split_frame, PsdReport, PsdResult, COMMAND_TOPIC, DATA_TOPIC};
pub use sink::{CycleTimings, ReportSink, TelemetryEvent, TelemetrySink};
