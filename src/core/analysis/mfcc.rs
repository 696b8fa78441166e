// src/core/analysis/mfcc.rs
//
// Log compression of mel energies and the cepstral (DCT-II) transform

use std::f64::consts::PI;

use rayon::prelude::*;

use super::mel::MelSpectrogram;
use crate::core::dsp::FeatureMatrix;
use crate::error::{FeatureError, Result};

/// MFCC matrix with shape `[n_mfcc, n_frames]`
pub type MfccMatrix = FeatureMatrix<f64>;

/// Decibel conversion parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogParams {
    /// Floor applied to power before the logarithm
    pub amin: f64,
    /// Dynamic range kept below the loudest cell, `None` keeps everything
    pub top_db: Option<f64>,
}

impl Default for LogParams {
    fn default() -> Self {
        Self {
            amin: 1e-10,
            top_db: Some(80.0),
        }
    }
}

impl LogParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.amin > 0.0) {
            return Err(FeatureError::config(format!("amin must be positive, got {}", self.amin)));
        }
        if let Some(top_db) = self.top_db {
            if !(top_db >= 0.0) {
                return Err(FeatureError::config(format!(
                    "top_db must be non-negative, got {}",
                    top_db
                )));
            }
        }
        Ok(())
    }
}

/// MFCC analysis parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MfccParams {
    pub n_mfcc: usize,
    pub log: LogParams,
}

impl Default for MfccParams {
    fn default() -> Self {
        Self {
            n_mfcc: 20,
            log: LogParams::default(),
        }
    }
}

/// `10 * log10(max(x, amin))`, floored at `max - top_db`
pub fn power_to_db(mel: &MelSpectrogram, params: &LogParams) -> Result<FeatureMatrix<f64>> {
    params.validate()?;

    let mut db = mel.map(|x| 10.0 * x.max(params.amin).log10());

    if let Some(top_db) = params.top_db {
        let peak = db.as_slice().iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if peak.is_finite() {
            let floor = peak - top_db;
            for v in db.as_mut_slice() {
                if *v < floor {
                    *v = floor;
                }
            }
        }
    }

    Ok(db)
}

/// Orthonormal DCT-II basis, row-major `[n_mfcc][n_mels]`
pub fn dct_basis(n_mfcc: usize, n_mels: usize) -> Vec<f64> {
    let n = n_mels as f64;
    let mut basis = Vec::with_capacity(n_mfcc * n_mels);

    for k in 0..n_mfcc {
        let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        for j in 0..n_mels {
            basis.push(scale * (PI * k as f64 * (2 * j + 1) as f64 / (2.0 * n)).cos());
        }
    }

    basis
}

/// Mel-frequency cepstral coefficients of a mel power spectrogram
pub fn mfcc(mel: &MelSpectrogram, n_mfcc: usize, log: &LogParams) -> Result<MfccMatrix> {
    let n_mels = mel.n_features();
    if n_mfcc == 0 {
        return Err(FeatureError::config("n_mfcc must be positive"));
    }
    if n_mfcc > n_mels {
        return Err(FeatureError::config(format!(
            "n_mfcc {} exceeds the {} available mel bands",
            n_mfcc, n_mels
        )));
    }

    let log_mel = power_to_db(mel, log)?;
    let basis = dct_basis(n_mfcc, n_mels);

    let mut out = MfccMatrix::zeros(n_mfcc, mel.n_frames());
    out.as_mut_slice()
        .par_chunks_mut(n_mfcc)
        .enumerate()
        .for_each(|(t, coeffs)| {
            let frame = log_mel.frame(t);
            for (c, row) in coeffs.iter_mut().zip(basis.chunks_exact(n_mels)) {
                *c = row.iter().zip(frame).map(|(b, x)| b * x).sum();
            }
        });

    log::debug!(
        "Computed MFCC: {} coefficients x {} frames from {} mel bands",
        n_mfcc,
        out.n_frames(),
        n_mels
    );

    Ok(out)
}

/// Per-coefficient arithmetic mean over frames
pub fn mean_mfcc(mfcc: &MfccMatrix) -> Result<Vec<f64>> {
    if mfcc.n_frames() == 0 {
        return Err(FeatureError::empty("MFCC matrix has no frames"));
    }

    let mut sums = vec![0.0; mfcc.n_features()];
    for frame in mfcc.frames() {
        for (s, &v) in sums.iter_mut().zip(frame) {
            *s += v;
        }
    }

    let n = mfcc.n_frames() as f64;
    Ok(sums.into_iter().map(|s| s / n).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_mel(n_mels: usize, n_frames: usize) -> MelSpectrogram {
        let frames: Vec<Vec<f64>> = (0..n_frames)
            .map(|t| (0..n_mels).map(|m| 1e-3 * (1 + m + t * 7) as f64).collect())
            .collect();
        FeatureMatrix::from_frames(n_mels, &frames).unwrap()
    }

    #[test]
    fn test_power_to_db_floor_and_clamp() {
        let mel = FeatureMatrix::from_frames(3, &[vec![1.0, 0.0, 1e-12]]).unwrap();

        let unclamped = power_to_db(&mel, &LogParams { amin: 1e-10, top_db: None }).unwrap();
        let expected = [0.0, -100.0, -100.0];
        for (got, want) in unclamped.frame(0).iter().zip(expected) {
            assert!((got - want).abs() < 1e-9);
        }

        let clamped = power_to_db(&mel, &LogParams::default()).unwrap();
        assert_eq!(clamped.frame(0), &[0.0, -80.0, -80.0]);
    }

    #[test]
    fn test_invalid_log_params() {
        let mel = ramp_mel(4, 2);
        let bad_amin = LogParams { amin: 0.0, top_db: None };
        assert!(matches!(power_to_db(&mel, &bad_amin), Err(FeatureError::InvalidConfiguration(_))));
        let bad_top = LogParams { amin: 1e-10, top_db: Some(-1.0) };
        assert!(matches!(power_to_db(&mel, &bad_top), Err(FeatureError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_dct_basis_orthonormal() {
        let n = 16;
        let basis = dct_basis(n, n);
        for a in 0..n {
            for b in 0..n {
                let dot: f64 = basis[a * n..(a + 1) * n]
                    .iter()
                    .zip(&basis[b * n..(b + 1) * n])
                    .map(|(x, y)| x * y)
                    .sum();
                let expected = if a == b { 1.0 } else { 0.0 };
                assert!((dot - expected).abs() < 1e-12, "rows {} and {}", a, b);
            }
        }
    }

    #[test]
    fn test_constant_log_mel_only_has_c0() {
        let frames = vec![vec![1.0; 40]; 3];
        let mel = FeatureMatrix::from_frames(40, &frames).unwrap();
        let out = mfcc(&mel, 13, &LogParams::default()).unwrap();

        // log10(1) = 0 everywhere, so every coefficient vanishes
        assert!(out.as_slice().iter().all(|c| c.abs() < 1e-12));

        let frames = vec![vec![10.0; 40]; 3];
        let mel = FeatureMatrix::from_frames(40, &frames).unwrap();
        let out = mfcc(&mel, 13, &LogParams::default()).unwrap();
        for t in 0..3 {
            assert!((out.get(0, t) - 10.0 * 40f64.sqrt()).abs() < 1e-9);
            for k in 1..13 {
                assert!(out.get(k, t).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_mfcc_shape_and_determinism() {
        let mel = ramp_mel(128, 32);
        let a = mfcc(&mel, 20, &LogParams::default()).unwrap();
        let b = mfcc(&mel, 20, &LogParams::default()).unwrap();
        assert_eq!(a.shape(), (20, 32));
        assert_eq!(a.as_slice(), b.as_slice());
    }

    #[test]
    fn test_mfcc_rejects_bad_coefficient_count() {
        let mel = ramp_mel(40, 4);
        assert!(matches!(
            mfcc(&mel, 0, &LogParams::default()),
            Err(FeatureError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            mfcc(&mel, 41, &LogParams::default()),
            Err(FeatureError::InvalidConfiguration(_))
        ));
        assert!(mfcc(&mel, 40, &LogParams::default()).is_ok());
    }

    #[test]
    fn test_mean_mfcc_of_zeros() {
        let m = MfccMatrix::zeros(40, 17);
        assert_eq!(mean_mfcc(&m).unwrap(), vec![0.0; 40]);
    }

    #[test]
    fn test_mean_mfcc_single_frame() {
        let frame = vec![1.5, -2.0, 0.25, 9.0];
        let m = FeatureMatrix::from_frames(4, &[frame.clone()]).unwrap();
        assert_eq!(mean_mfcc(&m).unwrap(), frame);
    }

    #[test]
    fn test_mean_mfcc_averages_rows() {
        let m = FeatureMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![-1.0, -1.0, 5.0]]).unwrap();
        assert_eq!(mean_mfcc(&m).unwrap(), vec![2.0, 1.0]);
    }

    #[test]
    fn test_mean_mfcc_no_frames() {
        let m = MfccMatrix::zeros(20, 0);
        assert!(matches!(mean_mfcc(&m), Err(FeatureError::EmptyInput(_))));
    }
}
