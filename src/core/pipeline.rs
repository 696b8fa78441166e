// src/core/pipeline.rs
//
// High-level feature extraction API with builder pattern. Loads audio
// through a pluggable decoder and resampler, then runs the STFT, mel and
// MFCC stages with cached per-configuration artefacts.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use rayon::prelude::*;

use super::analysis::{mean_mfcc, mfcc, MelFilterbank, MelSpectrogram, MfccMatrix, Stft, StftMatrix};
use super::decoder::{deinterleave, downmix_mono, AudioDecoder, SymphoniaDecoder};
use super::resample::{Resample, SincResampler};
use super::sample_buffer::SampleBuffer;
use crate::config::FeatureConfig;
use crate::error::{FeatureError, Result};

/// Sentinel meaning "native sample rate" or "whole file" in [`FeatureExtractor::load_and_read`]
pub const DEFAULT_SENTINEL: i32 = -1;

/// How much of a file to load and at what rate
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadOptions {
    /// Resample to this rate; `None` keeps the native rate
    pub target_sample_rate: Option<u32>,
    /// Seconds to keep after `offset_secs`; `None` reads to the end
    pub duration_secs: Option<f64>,
    /// Seconds skipped at the start
    pub offset_secs: f64,
}

impl LoadOptions {
    /// Translate integer arguments where `-1` means "use the default"
    pub fn from_sentinels(sample_rate: i32, duration: i32) -> Result<Self> {
        let target_sample_rate = match sample_rate {
            DEFAULT_SENTINEL => None,
            sr if sr > 0 => Some(sr as u32),
            sr => {
                return Err(FeatureError::config(format!(
                    "sample rate must be positive or -1, got {}",
                    sr
                )))
            }
        };
        let duration_secs = match duration {
            DEFAULT_SENTINEL => None,
            d if d > 0 => Some(d as f64),
            d => {
                return Err(FeatureError::config(format!(
                    "duration must be positive or -1, got {}",
                    d
                )))
            }
        };
        Ok(Self {
            target_sample_rate,
            duration_secs,
            offset_secs: 0.0,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.target_sample_rate == Some(0) {
            return Err(FeatureError::config("target sample rate must be positive"));
        }
        if let Some(d) = self.duration_secs {
            if !(d > 0.0) || !d.is_finite() {
                return Err(FeatureError::config(format!("duration must be positive, got {}", d)));
            }
        }
        if !(self.offset_secs >= 0.0) || !self.offset_secs.is_finite() {
            return Err(FeatureError::config(format!(
                "offset must be non-negative, got {}",
                self.offset_secs
            )));
        }
        Ok(())
    }
}

/// Audio loaded for analysis: the mono mixdown plus every channel at the
/// same rate.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedAudio {
    pub mono: SampleBuffer,
    pub channels: Vec<Vec<f32>>,
    pub native_sample_rate: u32,
}

impl LoadedAudio {
    pub fn sample_rate(&self) -> u32 {
        self.mono.sample_rate()
    }

    pub fn n_channels(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel
    pub fn n_frames(&self) -> usize {
        self.mono.len()
    }

    pub fn duration_secs(&self) -> f64 {
        self.mono.duration_secs()
    }

    /// Left and right channels when there are at least two
    pub fn stereo(&self) -> Option<(&[f32], &[f32])> {
        match self.channels.as_slice() {
            [left, right, ..] => Some((left.as_slice(), right.as_slice())),
            _ => None,
        }
    }
}

/// Builder for FeatureExtractor configuration
pub struct FeatureExtractorBuilder {
    config: FeatureConfig,
    decoder: Box<dyn AudioDecoder>,
    resampler: Box<dyn Resample>,
}

impl FeatureExtractorBuilder {
    pub fn new() -> Self {
        Self {
            config: FeatureConfig::default(),
            decoder: Box::new(SymphoniaDecoder),
            resampler: Box::new(SincResampler::default()),
        }
    }

    pub fn config(mut self, config: FeatureConfig) -> Self {
        self.config = config;
        self
    }

    pub fn decoder(mut self, decoder: impl AudioDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    pub fn resampler(mut self, resampler: impl Resample + 'static) -> Self {
        self.resampler = Box::new(resampler);
        self
    }

    pub fn build(self) -> Result<FeatureExtractor> {
        self.config.validate(None)?;
        let stft = Stft::new(&self.config.stft_params())?;

        Ok(FeatureExtractor {
            config: self.config,
            stft,
            decoder: self.decoder,
            resampler: self.resampler,
            filterbanks: Mutex::new(HashMap::new()),
        })
    }
}

impl Default for FeatureExtractorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads audio and computes spectral features with a fixed configuration.
///
/// The window, FFT plans and mel filterbanks are built once and shared, so
/// one extractor can serve any number of threads.
pub struct FeatureExtractor {
    config: FeatureConfig,
    stft: Stft,
    decoder: Box<dyn AudioDecoder>,
    resampler: Box<dyn Resample>,
    filterbanks: Mutex<HashMap<u32, Arc<MelFilterbank>>>,
}

impl FeatureExtractor {
    /// Extractor with the default decoder and resampler
    pub fn new(config: FeatureConfig) -> Result<Self> {
        FeatureExtractorBuilder::new().config(config).build()
    }

    pub fn builder() -> FeatureExtractorBuilder {
        FeatureExtractorBuilder::new()
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Load with integer arguments; `-1` keeps the native rate or full length.
    pub fn load_and_read(&self, path: &Path, sample_rate: i32, duration: i32) -> Result<LoadedAudio> {
        let options = LoadOptions::from_sentinels(sample_rate, duration)?;
        self.load(path, &options)
    }

    pub fn load(&self, path: &Path, options: &LoadOptions) -> Result<LoadedAudio> {
        options.validate()?;

        let decoded = self.decoder.decode(path)?;
        if decoded.frames() == 0 {
            return Err(FeatureError::empty(format!("{}: no samples decoded", path.display())));
        }
        let native_sr = decoded.sample_rate;
        let total = decoded.frames();

        let start = (options.offset_secs * native_sr as f64).round() as usize;
        if start >= total {
            return Err(FeatureError::empty(format!(
                "offset {:.3}s is past the end of {} ({:.3}s)",
                options.offset_secs,
                path.display(),
                decoded.duration_secs()
            )));
        }

        let end = match options.duration_secs {
            Some(d) => {
                // float-to-int casts saturate, so an absurd duration becomes usize::MAX
                let wanted = (d * native_sr as f64).round() as usize;
                if wanted == 0 {
                    return Err(FeatureError::empty(format!(
                        "duration {}s is shorter than one sample at {} Hz",
                        d, native_sr
                    )));
                }
                let requested_end = start.saturating_add(wanted);
                if requested_end > total {
                    log::warn!(
                        "{}: requested {:.3}s but only {:.3}s remain; reading to the end",
                        path.display(),
                        d,
                        (total - start) as f64 / native_sr as f64
                    );
                }
                requested_end.min(total)
            }
            None => total,
        };

        let mut channels = deinterleave(&decoded.samples, decoded.channels);
        for ch in channels.iter_mut() {
            ch.truncate(end);
            ch.drain(..start);
        }

        let sample_rate = match options.target_sample_rate {
            Some(target) if target != native_sr => {
                channels = channels
                    .par_iter()
                    .map(|ch| self.resampler.resample(ch, native_sr, target))
                    .collect::<Result<Vec<_>>>()?;
                target
            }
            _ => native_sr,
        };

        let mono = SampleBuffer::new(downmix_mono(&channels), sample_rate)?;
        log::debug!(
            "Loaded {}: {} channel(s), {} samples at {} Hz (native {} Hz)",
            path.display(),
            channels.len(),
            mono.len(),
            sample_rate,
            native_sr
        );

        Ok(LoadedAudio {
            mono,
            channels,
            native_sample_rate: native_sr,
        })
    }

    pub fn generate_stft_features(&self, buffer: &SampleBuffer) -> Result<StftMatrix> {
        self.stft.forward(buffer)
    }

    /// Resynthesise a signal; `length` forces the exact output length.
    pub fn generate_inverse_stft_features(
        &self,
        spectrum: &StftMatrix,
        length: Option<usize>,
    ) -> Result<SampleBuffer> {
        self.stft.inverse(spectrum, length)
    }

    pub fn generate_mel_spectrogram(&self, buffer: &SampleBuffer) -> Result<MelSpectrogram> {
        let filterbank = self.filterbank(buffer.sample_rate())?;
        let stft = self.stft.forward(buffer)?;
        filterbank.apply(&stft)
    }

    pub fn generate_mfcc_features(&self, buffer: &SampleBuffer) -> Result<MfccMatrix> {
        let mel = self.generate_mel_spectrogram(buffer)?;
        let params = self.config.mfcc_params();
        mfcc(&mel, params.n_mfcc, &params.log)
    }

    pub fn generate_mean_mfcc_features(&self, mfcc: &MfccMatrix) -> Result<Vec<f64>> {
        mean_mfcc(mfcc)
    }

    /// Mel filterbank for `sample_rate`, built on first use
    pub fn filterbank(&self, sample_rate: u32) -> Result<Arc<MelFilterbank>> {
        let mut cache = self
            .filterbanks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(fb) = cache.get(&sample_rate) {
            return Ok(Arc::clone(fb));
        }

        let fb = Arc::new(MelFilterbank::new(&self.config.mel_params(sample_rate))?);
        cache.insert(sample_rate, Arc::clone(&fb));
        Ok(fb)
    }
}
