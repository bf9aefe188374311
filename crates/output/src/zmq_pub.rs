// Copyright 2025-2026 CEMAXECUTER LLC

use specmon_protocol::{frame, PsdReport, PublishError, ReportSink};

use crate::error::{zmq_err, TransportError};

/// ZMQ publisher for finished spectra.
/// Binds a PUB socket; subscribers connect and filter on the topic.
pub struct ResultPublisher {
    socket: zmq::Socket,
    topic: String,
    _ctx: zmq::Context,
}

impl ResultPublisher {
    /// Create a PUB socket and bind it to `endpoint`.
    pub fn bind(endpoint: &str, topic: &str) -> Result<Self, TransportError> {
        let ctx = zmq::Context::new();
        let socket = ctx.socket(zmq::PUB).map_err(zmq_err("PUB socket"))?;

        socket.set_sndhwm(100).map_err(zmq_err("set_sndhwm"))?;
        socket.set_linger(0).map_err(zmq_err("set_linger"))?;

        socket.bind(endpoint).map_err(|source| TransportError::Endpoint {
            op: "bind",
            endpoint: endpoint.to_string(),
            source,
        })?;

        log::info!("ZMQ PUB: bound {} (topic '{}')", endpoint, topic);

        Ok(Self {
            socket,
            topic: topic.to_string(),
            _ctx: ctx,
        })
    }

    /// Resolved endpoint, useful after binding a wildcard port.
    pub fn endpoint(&self) -> Option<String> {
        self.socket.get_last_endpoint().ok().and_then(|r| r.ok())
    }

    /// Send one framed message without blocking.
    pub fn send_text(&self, payload: &str) -> Result<(), PublishError> {
        let msg = frame(&self.topic, payload);
        self.socket
            .send(msg.as_bytes(), zmq::DONTWAIT)
            .map_err(|e| PublishError(format!("zmq send: {}", e)))
    }
}

impl ReportSink for ResultPublisher {
    fn publish(&mut self, report: &PsdReport) -> Result<(), PublishError> {
        let json = report
            .to_json()
            .map_err(|e| PublishError(format!("serialize report: {}", e)))?;
        self.send_text(&json)?;
        log::debug!(
            "published {} bins {:.0}..{:.0} Hz ({} bytes)",
            report.bin_count,
            report.start_freq_hz,
            report.end_freq_hz,
            json.len()
        );
        Ok(())
    }
}
