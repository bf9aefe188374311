// Copyright 2025-2026 CEMAXECUTER LLC

use crossbeam::atomic::AtomicCell;

use specmon_protocol::{split_frame, Acquisition, ConfigError, DesiredConfig};

/// Single-slot, overwrite-on-publish handoff from the command listener to
/// the acquisition controller.
///
/// The slot holds one boxed value behind an atomic pointer swap: the
/// controller either takes a complete configuration or nothing.
pub struct ConfigSlot {
    cell: AtomicCell<Option<Box<Acquisition>>>,
}

impl ConfigSlot {
    pub fn new() -> Self {
        Self {
            cell: AtomicCell::new(None),
        }
    }

    /// Store `acq`, returning true if it replaced one the controller never took.
    pub fn publish(&self, acq: Acquisition) -> bool {
        self.cell.swap(Some(Box::new(acq))).is_some()
    }

    pub fn take(&self) -> Option<Acquisition> {
        self.cell.take().map(|b| *b)
    }

    /// Parse, derive and publish one framed command.
    ///
    /// Only a fully derived configuration reaches the slot; on any error the
    /// slot is left as it was.
    pub fn handle_command(&self, message: &str, topic: &str) -> Result<(), ConfigError> {
        let (msg_topic, payload) = split_frame(message)
            .ok_or_else(|| ConfigError::Parse("message has no topic separator".to_string()))?;
        if msg_topic != topic {
            return Err(ConfigError::Parse(format!("unexpected topic '{}'", msg_topic)));
        }

        let desired = DesiredConfig::from_json(payload)?;
        let acq = Acquisition::from_desired(desired)?;
        log::info!(
            "config: {} Hz, RBW {} Hz, {} S/s, {} -> nperseg {} noverlap {} ({:.1} Hz bins), scale {}",
            acq.desired.center_freq_hz,
            acq.desired.rbw_hz,
            acq.desired.sample_rate_hz,
            acq.desired.window.name(),
            acq.psd.nperseg,
            acq.psd.noverlap,
            acq.psd.bin_width_hz(),
            acq.desired.scale.name(),
        );
        if self.publish(acq) {
            log::warn!("config: replaced a configuration that was never started");
        }
        Ok(())
    }
}

impl Default for ConfigSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specmon_dsp::WindowKind;
    use std::sync::Arc;
    use std::thread;

    const GOOD: &str = r#"acquire {"center_freq_hz": 100000000, "sample_rate_hz": 2000000, "rbw_hz": 1000, "window": "hamming", "overlap": 0, "scale": "dBm"}"#;

    #[test]
    fn test_slot_is_lock_free() {
        assert!(AtomicCell::<Option<Box<Acquisition>>>::is_lock_free());
    }

    #[test]
    fn test_publish_take() {
        let slot = ConfigSlot::new();
        assert!(slot.take().is_none());
        slot.handle_command(GOOD, "acquire").unwrap();
        let acq = slot.take().unwrap();
        assert_eq!(acq.psd.nperseg, 4096);
        assert_eq!(acq.psd.window, WindowKind::Hamming);
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_latest_config_wins() {
        let slot = ConfigSlot::new();
        slot.handle_command(GOOD, "acquire").unwrap();
        slot.handle_command(
            r#"acquire {"center_freq_hz": 5, "sample_rate_hz": 1000000, "rbw_hz": 500}"#,
            "acquire",
        )
        .unwrap();
        assert_eq!(slot.take().unwrap().desired.center_freq_hz, 5);
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_rejection_keeps_previous() {
        let slot = ConfigSlot::new();
        slot.handle_command(GOOD, "acquire").unwrap();

        assert!(matches!(
            slot.handle_command("acquire {not json", "acquire"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            slot.handle_command(r#"acquire {"sample_rate_hz": 2000000}"#, "acquire"),
            Err(ConfigError::Derivation(_))
        ));
        assert!(matches!(
            slot.handle_command("acquire", "acquire"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            slot.handle_command(r#"acquired {"rbw_hz": 1}"#, "acquire"),
            Err(ConfigError::Parse(_))
        ));

        assert_eq!(slot.take().unwrap().desired.center_freq_hz, 100_000_000);
    }

    #[test]
    fn test_concurrent_handoff_never_torn() {
        let slot = Arc::new(ConfigSlot::new());
        let writer = slot.clone();
        let producer = thread::spawn(move || {
            for i in 1..=2000u64 {
                let msg = format!(
                    r#"acquire {{"center_freq_hz": {}, "sample_rate_hz": {}, "rbw_hz": 1000}}"#,
                    i,
                    i * 1000 + 1_000_000
                );
                writer.handle_command(&msg, "acquire").unwrap();
            }
        });

        let mut last = 0;
        while last < 2000 {
            if let Some(acq) = slot.take() {
                let i = acq.desired.center_freq_hz;
                // Every field comes from the same message
                assert_eq!(acq.sdr.sample_rate_hz, (i * 1000 + 1_000_000) as f64);
                assert_eq!(acq.ring.total_bytes, ((i * 1000 + 1_000_000) * 2) as usize);
                assert!(i > last, "went backwards: {} after {}", i, last);
                last = i;
            } else {
                thread::yield_now();
            }
        }
        producer.join().unwrap();
    }
}
