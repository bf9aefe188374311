// Copyright 2025-2026 CEMAXECUTER LLC

use std::ffi::CString;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;

use crate::{RingWriter, SdrConfig, SdrDevice, SdrDriver, SdrError};

const HACKRF_SUCCESS: c_int = 0;

/// Highest sample rate the HackRF One supports.
pub const MAX_SAMPLE_RATE_HZ: f64 = 20_000_000.0;

#[repr(C)]
pub struct HackrfTransfer {
    pub device: *mut c_void,
    pub buffer: *mut u8,
    pub buffer_length: i32,
    pub valid_length: i32,
    pub rx_ctx: *mut c_void,
    pub tx_ctx: *mut c_void,
}

type RawDevice = c_void;

extern "C" {
    fn hackrf_init() -> c_int;
    fn hackrf_exit() -> c_int;
    fn hackrf_open(device: *mut *mut RawDevice) -> c_int;
    fn hackrf_open_by_serial(
        desired_serial_number: *const c_char,
        device: *mut *mut RawDevice,
    ) -> c_int;
    fn hackrf_close(device: *mut RawDevice) -> c_int;
    fn hackrf_set_sample_rate(device: *mut RawDevice, freq_hz: f64) -> c_int;
    fn hackrf_set_freq(device: *mut RawDevice, freq_hz: u64) -> c_int;
    fn hackrf_set_vga_gain(device: *mut RawDevice, value: u32) -> c_int;
    fn hackrf_set_lna_gain(device: *mut RawDevice, value: u32) -> c_int;
    fn hackrf_set_amp_enable(device: *mut RawDevice, value: u8) -> c_int;
    fn hackrf_start_rx(
        device: *mut RawDevice,
        callback: unsafe extern "C" fn(*mut HackrfTransfer) -> c_int,
        rx_ctx: *mut c_void,
    ) -> c_int;
    fn hackrf_stop_rx(device: *mut RawDevice) -> c_int;
}

fn check(op: &'static str, code: c_int) -> Result<(), SdrError> {
    if code == HACKRF_SUCCESS {
        Ok(())
    } else {
        Err(SdrError::Driver { op, code })
    }
}

/// Context passed to the HackRF RX callback
struct RxContext {
    writer: RingWriter,
}

/// Runs on libhackrf's transfer thread: one copy into the ring, nothing else.
unsafe extern "C" fn rx_callback(transfer: *mut HackrfTransfer) -> c_int {
    let ctx = &*((*transfer).rx_ctx as *const RxContext);
    if !ctx.writer.is_accepting() {
        return -1;
    }
    let valid = (*transfer).valid_length.max(0) as usize;
    let data = std::slice::from_raw_parts((*transfer).buffer, valid);
    ctx.writer.write(data);
    0
}

/// Owns the libhackrf library initialisation for the process lifetime.
pub struct HackrfDriver {
    serial: Option<String>,
}

impl HackrfDriver {
    /// Initialise libhackrf. `serial` selects a board; `None` opens the first.
    pub fn new(serial: Option<&str>) -> Result<Self, SdrError> {
        unsafe { check("hackrf_init", hackrf_init())? };
        Ok(Self {
            serial: serial.map(|s| s.trim_start_matches('0').to_string()),
        })
    }
}

impl Drop for HackrfDriver {
    fn drop(&mut self) {
        unsafe {
            hackrf_exit();
        }
    }
}

impl SdrDriver for HackrfDriver {
    type Device = HackrfDevice;

    fn open(&mut self) -> Result<HackrfDevice, SdrError> {
        let mut dev: *mut RawDevice = ptr::null_mut();
        let r = unsafe {
            if let Some(ref serial) = self.serial {
                let cs = CString::new(serial.as_str())
                    .map_err(|e| SdrError::InvalidConfig(format!("serial: {}", e)))?;
                hackrf_open_by_serial(cs.as_ptr(), &mut dev)
            } else {
                hackrf_open(&mut dev)
            }
        };
        if r != HACKRF_SUCCESS || dev.is_null() {
            return Err(SdrError::Unavailable(format!("hackrf_open failed: {}", r)));
        }

        log::info!("HackRF opened (serial={:?})", self.serial);
        Ok(HackrfDevice {
            dev,
            ctx: ptr::null_mut(),
        })
    }

    fn name(&self) -> &str {
        "hackrf"
    }
}

/// An opened HackRF board.
pub struct HackrfDevice {
    dev: *mut RawDevice,
    ctx: *mut RxContext,
}

// HackRF device pointer is thread-safe (single owner)
unsafe impl Send for HackrfDevice {}

impl HackrfDevice {
    fn release(&mut self) -> Result<(), SdrError> {
        let stopped = if self.ctx.is_null() { Ok(()) } else { self.stop_rx() };
        if !self.dev.is_null() {
            let r = unsafe { hackrf_close(self.dev) };
            self.dev = ptr::null_mut();
            check("hackrf_close", r)?;
        }
        stopped
    }
}

impl SdrDevice for HackrfDevice {
    fn apply_config(&mut self, config: &SdrConfig) -> Result<(), SdrError> {
        if !(config.sample_rate_hz > 0.0 && config.sample_rate_hz <= MAX_SAMPLE_RATE_HZ) {
            return Err(SdrError::InvalidConfig(format!(
                "HackRF sample rate must be in (0, 20] MHz, got {} Hz",
                config.sample_rate_hz
            )));
        }
        if config.lna_gain < 0 || config.vga_gain < 0 {
            return Err(SdrError::InvalidConfig(format!(
                "negative gain (LNA={}, VGA={})",
                config.lna_gain, config.vga_gain
            )));
        }

        unsafe {
            check(
                "hackrf_set_sample_rate",
                hackrf_set_sample_rate(self.dev, config.corrected_sample_rate_hz()),
            )?;
            check(
                "hackrf_set_freq",
                hackrf_set_freq(self.dev, config.corrected_center_hz()),
            )?;
            check(
                "hackrf_set_lna_gain",
                hackrf_set_lna_gain(self.dev, config.lna_gain as u32),
            )?;
            check(
                "hackrf_set_vga_gain",
                hackrf_set_vga_gain(self.dev, config.vga_gain as u32),
            )?;
            check(
                "hackrf_set_amp_enable",
                hackrf_set_amp_enable(self.dev, config.amp_enabled as u8),
            )?;
        }

        log::debug!(
            "HackRF configured ({} Hz, {} S/s, LNA={} dB, VGA={} dB, amp={})",
            config.center_freq_hz,
            config.sample_rate_hz,
            config.lna_gain,
            config.vga_gain,
            config.amp_enabled,
        );
        Ok(())
    }

    fn start_rx(&mut self, writer: RingWriter) -> Result<(), SdrError> {
        if !self.ctx.is_null() {
            return Err(SdrError::AlreadyStreaming);
        }

        // Freed in stop_rx once libhackrf no longer calls back
        let ctx = Box::into_raw(Box::new(RxContext { writer }));
        let r = unsafe { hackrf_start_rx(self.dev, rx_callback, ctx as *mut c_void) };
        if r != HACKRF_SUCCESS {
            unsafe {
                drop(Box::from_raw(ctx));
            }
            return Err(SdrError::Driver {
                op: "hackrf_start_rx",
                code: r,
            });
        }
        self.ctx = ctx;
        Ok(())
    }

    fn stop_rx(&mut self) -> Result<(), SdrError> {
        if self.ctx.is_null() {
            return Err(SdrError::NotStreaming);
        }
        let r = unsafe { hackrf_stop_rx(self.dev) };
        if r == HACKRF_SUCCESS {
            unsafe {
                drop(Box::from_raw(self.ctx));
            }
        } else {
            // A failed stop may still deliver transfers; leak the context
            log::warn!("hackrf_stop_rx failed ({}), leaking RX context", r);
        }
        self.ctx = ptr::null_mut();
        check("hackrf_stop_rx", r)
    }

    fn close(mut self) -> Result<(), SdrError> {
        self.release()
    }
}

impl Drop for HackrfDevice {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("HackRF release: {}", e);
        }
    }
}
