// Copyright 2025-2026 CEMAXECUTER LLC

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Forward FFT processor using rustfft.
///
/// Plans once per segment length and reuses its scratch buffer across
/// every Welch segment of a cycle.
pub struct ForwardFft {
    fft: Arc<dyn Fft<f64>>,
    size: usize,
    scratch: Vec<Complex64>,
}

impl ForwardFft {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch_len = fft.get_inplace_scratch_len();
        Self {
            fft,
            size,
            scratch: vec![Complex64::new(0.0, 0.0); scratch_len],
        }
    }

    /// Perform an in-place FFT on a buffer of exactly `size` complex samples.
    pub fn process(&mut self, buffer: &mut [Complex64]) {
        assert_eq!(
            buffer.len(),
            self.size,
            "buffer length {} != FFT size {}",
            buffer.len(),
            self.size
        );
        self.fft.process_with_scratch(buffer, &mut self.scratch);
    }
}
