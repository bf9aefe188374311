// Copyright 2025-2026 CEMAXECUTER LLC

pub mod error;
pub mod fft;
pub mod iq;
pub mod scale;
pub mod welch;
pub mod window;

pub use error::DspError;
pub use iq::IqSignal;
pub use scale::{scale_psd, ScaleUnit};
pub use welch::{execute_welch_psd, PsdConfig, PsdEngine, Spectrum, WelchEngine};
pub use window::WindowKind;
