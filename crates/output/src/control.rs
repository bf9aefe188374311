// Copyright 2025-2026 CEMAXECUTER LLC

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::{zmq_err, TransportError};
use crate::slot::ConfigSlot;

/// Receive timeout so the loop notices shutdown.
const POLL_TIMEOUT_MS: i64 = 1000;

/// Command listener: SUB socket connecting to the operator's PUB.
///
/// Each message on the command topic is parsed and derived on this thread;
/// only complete configurations reach the slot.
pub struct CommandListener {
    socket: zmq::Socket,
    _ctx: zmq::Context,
    topic: String,
    slot: Arc<ConfigSlot>,
    running: Arc<AtomicBool>,
}

impl CommandListener {
    /// Create a SUB socket, connect to `endpoint` and subscribe to `topic`.
    pub fn connect(
        endpoint: &str,
        topic: &str,
        slot: Arc<ConfigSlot>,
        running: Arc<AtomicBool>,
    ) -> Result<Self, TransportError> {
        let ctx = zmq::Context::new();
        let socket = ctx.socket(zmq::SUB).map_err(zmq_err("SUB socket"))?;

        socket.set_rcvhwm(16).map_err(zmq_err("set_rcvhwm"))?;
        socket.set_linger(0).map_err(zmq_err("set_linger"))?;
        socket
            .set_subscribe(topic.as_bytes())
            .map_err(zmq_err("set_subscribe"))?;

        socket.connect(endpoint).map_err(|source| TransportError::Endpoint {
            op: "connect",
            endpoint: endpoint.to_string(),
            source,
        })?;

        log::info!("ZMQ SUB: connected to {} (topic '{}')", endpoint, topic);

        Ok(Self {
            socket,
            _ctx: ctx,
            topic: topic.to_string(),
            slot,
            running,
        })
    }

    /// Run the receive loop (blocking). Call from a dedicated thread.
    pub fn run(&self) {
        while self.running.load(Ordering::Relaxed) {
            match self.socket.poll(zmq::POLLIN, POLL_TIMEOUT_MS) {
                Ok(events) if events > 0 => {}
                Ok(_) => continue,
                Err(e) => {
                    log::warn!("command poll: {}", e);
                    continue;
                }
            }

            let msg = match self.socket.recv_bytes(0) {
                Ok(m) => m,
                Err(e) => {
                    log::warn!("command recv: {}", e);
                    continue;
                }
            };
            let text = match std::str::from_utf8(&msg) {
                Ok(t) => t,
                Err(_) => {
                    log::warn!("command rejected: {} bytes of non-UTF-8", msg.len());
                    continue;
                }
            };

            if let Err(e) = self.slot.handle_command(text, &self.topic) {
                log::warn!("command rejected: {}", e);
            }
        }
        log::debug!("command listener stopped");
    }

    /// Move the listener onto its own thread.
    pub fn spawn(self) -> Result<JoinHandle<()>, TransportError> {
        let handle = thread::Builder::new()
            .name("command-rx".to_string())
            .spawn(move || self.run())?;
        Ok(handle)
    }
}
