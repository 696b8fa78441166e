//! Window function implementations
//!
//! All windows are periodic (DFT-even): the denominator is `size`, not
//! `size - 1`, which is what librosa's `get_window(..., fftbins=True)` uses
//! for STFT analysis.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::{Arc, OnceLock, RwLock};

use serde::{Deserialize, Serialize};

/// Window function types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    #[default]
    Hann,
    Hamming,
    Blackman,
    Rectangular,
}

impl WindowType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "hann" | "hanning" => Some(Self::Hann),
            "hamming" => Some(Self::Hamming),
            "blackman" => Some(Self::Blackman),
            "rectangular" | "boxcar" | "ones" => Some(Self::Rectangular),
            _ => None,
        }
    }
}

/// Create window function
pub fn create_window(size: usize, window_type: WindowType) -> Vec<f64> {
    let n = size as f64;
    (0..size)
        .map(|i| {
            let x = i as f64;
            match window_type {
                WindowType::Hann => 0.5 - 0.5 * (2.0 * PI * x / n).cos(),
                WindowType::Hamming => 0.54 - 0.46 * (2.0 * PI * x / n).cos(),
                WindowType::Blackman => {
                    0.42 - 0.5 * (2.0 * PI * x / n).cos() + 0.08 * (4.0 * PI * x / n).cos()
                }
                WindowType::Rectangular => 1.0,
            }
        })
        .collect()
}

type WindowKey = (WindowType, usize);

fn window_cache() -> &'static RwLock<HashMap<WindowKey, Arc<[f64]>>> {
    static CACHE: OnceLock<RwLock<HashMap<WindowKey, Arc<[f64]>>>> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Shared window coefficients, computed once per (type, size) for the process.
///
/// The returned slice is read-only and may be handed to any number of threads.
pub fn cached_window(size: usize, window_type: WindowType) -> Arc<[f64]> {
    let key = (window_type, size);

    if let Ok(cache) = window_cache().read() {
        if let Some(window) = cache.get(&key) {
            return Arc::clone(window);
        }
    }

    let window: Arc<[f64]> = create_window(size, window_type).into();
    match window_cache().write() {
        Ok(mut cache) => {
            log::debug!("Caching {:?} window of length {}", window_type, size);
            Arc::clone(cache.entry(key).or_insert(window))
        }
        // A poisoned cache only costs us the reuse.
        Err(_) => window,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_window() {
        let window = create_window(4, WindowType::Hann);
        assert!((window[0]).abs() < 1e-12);
        assert!((window[1] - 0.5).abs() < 1e-12);
        assert!((window[2] - 1.0).abs() < 1e-12);
        assert!((window[3] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_hann_matches_periodic_formula() {
        let size = 2048;
        let window = create_window(size, WindowType::Hann);
        for (i, &w) in window.iter().enumerate() {
            let expected = 0.5 - 0.5 * (2.0 * PI * i as f64 / size as f64).cos();
            assert_eq!(w, expected);
        }
    }

    #[test]
    fn test_cached_window_is_shared() {
        let a = cached_window(512, WindowType::Hamming);
        let b = cached_window(512, WindowType::Hamming);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.len(), 512);

        let c = cached_window(256, WindowType::Hamming);
        assert_eq!(c.len(), 256);
    }

    #[test]
    fn test_window_from_name() {
        assert_eq!(WindowType::from_name("HANN"), Some(WindowType::Hann));
        assert_eq!(WindowType::from_name("boxcar"), Some(WindowType::Rectangular));
        assert_eq!(WindowType::from_name("kaiser"), None);
    }
}
