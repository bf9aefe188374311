// Copyright 2025-2026 CEMAXECUTER LLC

use std::f64::consts::PI;

/// Window applied to every Welch segment before the FFT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowKind {
    #[default]
    Rectangular,
    Hamming,
    Hann,
    Blackman,
}

impl WindowKind {
    /// Equivalent noise bandwidth factor, in bins.
    ///
    /// Used to size the segment length so the requested RBW is never undershot.
    pub fn enbw(self) -> f64 {
        match self {
            WindowKind::Rectangular => 1.000,
            WindowKind::Hamming => 1.363,
            WindowKind::Hann => 1.500,
            WindowKind::Blackman => 1.730,
        }
    }

    /// Case-insensitive lookup of the names accepted on the command channel.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "rectangular" => Some(WindowKind::Rectangular),
            "hamming" => Some(WindowKind::Hamming),
            "hann" => Some(WindowKind::Hann),
            "blackman" => Some(WindowKind::Blackman),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WindowKind::Rectangular => "rectangular",
            WindowKind::Hamming => "hamming",
            WindowKind::Hann => "hann",
            WindowKind::Blackman => "blackman",
        }
    }

    /// Generate `n` symmetric window coefficients.
    pub fn coefficients(self, n: usize) -> Vec<f64> {
        if n < 2 {
            return vec![1.0; n];
        }
        let denom = (n - 1) as f64;
        (0..n)
            .map(|i| {
                let x = 2.0 * PI * i as f64 / denom;
                match self {
                    WindowKind::Rectangular => 1.0,
                    WindowKind::Hamming => 0.54 - 0.46 * x.cos(),
                    WindowKind::Hann => 0.5 * (1.0 - x.cos()),
                    WindowKind::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
                }
            })
            .collect()
    }
}

/// Mean of the squared coefficients (window power normalisation `U`).
pub fn mean_power(window: &[f64]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    window.iter().map(|w| w * w).sum::<f64>() / window.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [WindowKind; 4] = [
        WindowKind::Rectangular,
        WindowKind::Hamming,
        WindowKind::Hann,
        WindowKind::Blackman,
    ];

    #[test]
    fn test_windows_symmetric() {
        for kind in ALL {
            let w = kind.coefficients(64);
            assert_eq!(w.len(), 64);
            for i in 0..32 {
                assert!(
                    (w[i] - w[63 - i]).abs() < 1e-12,
                    "{:?} asymmetry at index {}: {} != {}",
                    kind,
                    i,
                    w[i],
                    w[63 - i]
                );
            }
        }
    }

    #[test]
    fn test_window_endpoints() {
        let hamming = WindowKind::Hamming.coefficients(33);
        assert!((hamming[0] - 0.08).abs() < 1e-12);
        assert!((hamming[16] - 1.0).abs() < 1e-12);

        let hann = WindowKind::Hann.coefficients(33);
        assert!(hann[0].abs() < 1e-12);
        assert!((hann[16] - 1.0).abs() < 1e-12);

        let blackman = WindowKind::Blackman.coefficients(33);
        assert!(blackman[0].abs() < 1e-12);
        assert!((blackman[16] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_enbw_table() {
        assert_eq!(WindowKind::Rectangular.enbw(), 1.0);
        assert_eq!(WindowKind::Hamming.enbw(), 1.363);
        assert_eq!(WindowKind::Hann.enbw(), 1.5);
        assert_eq!(WindowKind::Blackman.enbw(), 1.73);
    }

    #[test]
    fn test_name_lookup() {
        assert_eq!(WindowKind::from_name("HAMMING"), Some(WindowKind::Hamming));
        assert_eq!(WindowKind::from_name("Hann"), Some(WindowKind::Hann));
        assert_eq!(WindowKind::from_name("kaiser"), None);
        for kind in ALL {
            assert_eq!(WindowKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn test_mean_power() {
        assert_eq!(mean_power(&WindowKind::Rectangular.coefficients(16)), 1.0);
        let u = mean_power(&WindowKind::Hann.coefficients(4096));
        // Hann power approaches 3/8 for long windows
        assert!((u - 0.375).abs() < 1e-3, "hann U = {}", u);
    }
}
