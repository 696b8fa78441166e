// src/core/analysis/mel.rs
//
// Mel filterbank construction and projection of power spectra onto mel bands.
// Filter layout follows librosa.filters.mel: n_mels + 2 points spaced evenly
// in mel, triangular weights between neighbours, optional area normalisation.

use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::stft::StftMatrix;
use crate::core::dsp::FeatureMatrix;
use crate::error::{FeatureError, Result};

/// Mel spectrogram with shape `[n_mels, n_frames]`
pub type MelSpectrogram = FeatureMatrix<f64>;

/// Hz <-> mel conversion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MelScale {
    /// `2595 * log10(1 + hz / 700)`
    #[default]
    Htk,
    /// Linear below 1 kHz, logarithmic above (Auditory Toolbox)
    Slaney,
}

/// Row normalisation of the filterbank
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MelNorm {
    /// Divide each triangle by its width in Hz so bands carry equal area
    #[default]
    Slaney,
    /// Triangles peak at 1.0
    None,
}

const SLANEY_F_SP: f64 = 200.0 / 3.0;
const SLANEY_MIN_LOG_HZ: f64 = 1000.0;
const SLANEY_MIN_LOG_MEL: f64 = SLANEY_MIN_LOG_HZ / SLANEY_F_SP;

fn slaney_logstep() -> f64 {
    6.4f64.ln() / 27.0
}

pub fn hz_to_mel(hz: f64, scale: MelScale) -> f64 {
    match scale {
        MelScale::Htk => 2595.0 * (1.0 + hz / 700.0).log10(),
        MelScale::Slaney => {
            if hz >= SLANEY_MIN_LOG_HZ {
                SLANEY_MIN_LOG_MEL + (hz / SLANEY_MIN_LOG_HZ).ln() / slaney_logstep()
            } else {
                hz / SLANEY_F_SP
            }
        }
    }
}

pub fn mel_to_hz(mel: f64, scale: MelScale) -> f64 {
    match scale {
        MelScale::Htk => 700.0 * (10f64.powf(mel / 2595.0) - 1.0),
        MelScale::Slaney => {
            if mel >= SLANEY_MIN_LOG_MEL {
                SLANEY_MIN_LOG_HZ * (slaney_logstep() * (mel - SLANEY_MIN_LOG_MEL)).exp()
            } else {
                SLANEY_F_SP * mel
            }
        }
    }
}

/// `n` frequencies in Hz, evenly spaced in mel between `fmin` and `fmax` inclusive
pub fn mel_frequencies(n: usize, fmin: f64, fmax: f64, scale: MelScale) -> Vec<f64> {
    let min_mel = hz_to_mel(fmin, scale);
    let max_mel = hz_to_mel(fmax, scale);
    if n == 1 {
        return vec![fmin];
    }
    let step = (max_mel - min_mel) / (n - 1) as f64;
    (0..n)
        .map(|i| mel_to_hz(min_mel + step * i as f64, scale))
        .collect()
}

/// Centre frequency of each real-FFT bin: `k * sample_rate / n_fft`
pub fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f64> {
    (0..=n_fft / 2)
        .map(|k| k as f64 * sample_rate as f64 / n_fft as f64)
        .collect()
}

/// Mel filterbank parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MelParams {
    pub sample_rate: u32,
    pub n_fft: usize,
    pub n_mels: usize,
    pub fmin: f64,
    /// `None` means the Nyquist frequency
    pub fmax: Option<f64>,
    pub scale: MelScale,
    pub norm: MelNorm,
}

impl MelParams {
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize) -> Self {
        Self {
            sample_rate,
            n_fft,
            n_mels,
            fmin: 0.0,
            fmax: None,
            scale: MelScale::default(),
            norm: MelNorm::default(),
        }
    }

    pub fn nyquist(&self) -> f64 {
        self.sample_rate as f64 / 2.0
    }

    pub fn resolved_fmax(&self) -> f64 {
        self.fmax.unwrap_or_else(|| self.nyquist())
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(FeatureError::config("sample rate must be positive"));
        }
        if self.n_fft == 0 {
            return Err(FeatureError::config("n_fft must be positive"));
        }
        if self.n_mels == 0 {
            return Err(FeatureError::config("n_mels must be positive"));
        }
        let fmax = self.resolved_fmax();
        if !self.fmin.is_finite() || self.fmin < 0.0 {
            return Err(FeatureError::config(format!("fmin must be >= 0, got {}", self.fmin)));
        }
        if fmax > self.nyquist() {
            return Err(FeatureError::config(format!(
                "fmax {} Hz exceeds Nyquist frequency {} Hz",
                fmax,
                self.nyquist()
            )));
        }
        if self.fmin >= fmax {
            return Err(FeatureError::config(format!(
                "fmin {} Hz must be below fmax {} Hz",
                self.fmin, fmax
            )));
        }
        Ok(())
    }
}

/// One triangular filter: weights over the contiguous bins starting at `start`
#[derive(Debug, Clone, PartialEq)]
struct MelBand {
    start: usize,
    weights: Vec<f64>,
}

/// Triangular filters mapping `n_fft / 2 + 1` linear bins onto `n_mels` bands.
///
/// Only the non-zero span of each row is stored, so projection is a short
/// inner product per band.
#[derive(Debug, Clone, PartialEq)]
pub struct MelFilterbank {
    params: MelParams,
    n_bins: usize,
    bands: Vec<MelBand>,
    center_frequencies: Vec<f64>,
}

impl MelFilterbank {
    pub fn new(params: &MelParams) -> Result<Self> {
        params.validate()?;

        let fft_freqs = fft_frequencies(params.sample_rate, params.n_fft);
        let mel_f = mel_frequencies(
            params.n_mels + 2,
            params.fmin,
            params.resolved_fmax(),
            params.scale,
        );

        let mut bands = Vec::with_capacity(params.n_mels);
        let mut empty_bands = 0;

        for i in 0..params.n_mels {
            let lower_width = mel_f[i + 1] - mel_f[i];
            let upper_width = mel_f[i + 2] - mel_f[i + 1];
            let enorm = match params.norm {
                MelNorm::Slaney => 2.0 / (mel_f[i + 2] - mel_f[i]),
                MelNorm::None => 1.0,
            };

            let row: Vec<f64> = fft_freqs
                .iter()
                .map(|&f| {
                    let lower = (f - mel_f[i]) / lower_width;
                    let upper = (mel_f[i + 2] - f) / upper_width;
                    lower.min(upper).max(0.0) * enorm
                })
                .collect();

            match row.iter().position(|&w| w > 0.0) {
                Some(start) => {
                    let end = row.iter().rposition(|&w| w > 0.0).map_or(start, |e| e + 1);
                    bands.push(MelBand {
                        start,
                        weights: row[start..end].to_vec(),
                    });
                }
                None => {
                    empty_bands += 1;
                    bands.push(MelBand {
                        start: 0,
                        weights: Vec::new(),
                    });
                }
            }
        }

        if empty_bands > 0 {
            log::warn!(
                "{} of {} mel filters are empty; n_mels may be too high for n_fft={}",
                empty_bands,
                params.n_mels,
                params.n_fft
            );
        }

        log::debug!(
            "Built mel filterbank: {} bands over {} bins ({:.1}-{:.1} Hz, {:?} scale)",
            params.n_mels,
            fft_freqs.len(),
            params.fmin,
            params.resolved_fmax(),
            params.scale
        );

        Ok(Self {
            params: *params,
            n_bins: fft_freqs.len(),
            bands,
            center_frequencies: mel_f[1..=params.n_mels].to_vec(),
        })
    }

    pub fn params(&self) -> &MelParams {
        &self.params
    }

    pub fn n_mels(&self) -> usize {
        self.bands.len()
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Bins where band `band` has non-zero weight
    pub fn band_support(&self, band: usize) -> Range<usize> {
        let b = &self.bands[band];
        b.start..b.start + b.weights.len()
    }

    /// Weights over `band_support(band)`
    pub fn band_weights(&self, band: usize) -> &[f64] {
        &self.bands[band].weights
    }

    /// Dense row of `n_bins` weights
    pub fn row(&self, band: usize) -> Vec<f64> {
        let mut row = vec![0.0; self.n_bins];
        let b = &self.bands[band];
        row[b.start..b.start + b.weights.len()].copy_from_slice(&b.weights);
        row
    }

    /// Dense `[n_mels][n_bins]` weight matrix
    pub fn to_dense(&self) -> Vec<Vec<f64>> {
        (0..self.n_mels()).map(|m| self.row(m)).collect()
    }

    /// Peak frequency of each triangle in Hz
    pub fn center_frequencies(&self) -> &[f64] {
        &self.center_frequencies
    }

    /// Band whose centre frequency is closest to `hz`
    pub fn band_for_frequency(&self, hz: f64) -> usize {
        self.center_frequencies
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (*a - hz)
                    .abs()
                    .partial_cmp(&(*b - hz).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map_or(0, |(i, _)| i)
    }

    /// Project `|X|^2` of a complex STFT onto the mel bands
    pub fn apply(&self, stft: &StftMatrix) -> Result<MelSpectrogram> {
        self.check_bins(stft.n_bins())?;
        if stft.sample_rate() != self.params.sample_rate {
            return Err(FeatureError::DimensionMismatch {
                context: "STFT sample rate vs filterbank",
                expected: self.params.sample_rate as usize,
                actual: stft.sample_rate() as usize,
            });
        }

        Ok(self.project(stft.n_frames(), |t| stft.frame(t), |c| c.norm_sqr()))
    }

    /// Project a precomputed power spectrogram `[n_bins, n_frames]`
    pub fn apply_power(&self, power: &FeatureMatrix<f64>) -> Result<MelSpectrogram> {
        self.check_bins(power.n_features())?;
        Ok(self.project(power.n_frames(), |t| power.frame(t), |p| p))
    }

    fn project<'a, T, F, P>(&self, n_frames: usize, frame: F, power: P) -> MelSpectrogram
    where
        T: Copy + Sync + 'a,
        F: Fn(usize) -> &'a [T] + Sync,
        P: Fn(T) -> f64 + Sync,
    {
        let n_mels = self.n_mels();
        let mut mel = MelSpectrogram::zeros(n_mels, n_frames);

        mel.as_mut_slice()
            .par_chunks_mut(n_mels)
            .enumerate()
            .for_each(|(t, out)| {
                let spectrum = frame(t);
                for (value, band) in out.iter_mut().zip(&self.bands) {
                    let span = &spectrum[band.start..band.start + band.weights.len()];
                    *value = band
                        .weights
                        .iter()
                        .zip(span)
                        .map(|(&w, &x)| w * power(x))
                        .sum();
                }
            });

        mel
    }

    fn check_bins(&self, actual: usize) -> Result<()> {
        if actual != self.n_bins {
            return Err(FeatureError::DimensionMismatch {
                context: "spectrum bins vs mel filterbank",
                expected: self.n_bins,
                actual,
            });
        }
        Ok(())
    }
}
