// src/config/params.rs
//
// Feature extraction parameters with presets and a builder

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::analysis::{LogParams, MelNorm, MelParams, MelScale, MfccParams, StftParams};
use crate::core::dsp::{PadMode, WindowType};
use crate::error::{FeatureError, Result};

/// Preset parameter sets for common use cases
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeaturePreset {
    /// librosa defaults: 2048-point FFT, 128 mel bands, 20 coefficients
    #[default]
    Librosa,
    /// Short-window speech front end: 512-point FFT, 40 bands, 13 coefficients
    Speech,
}

/// Complete feature extraction configuration.
///
/// Every field has a default, so a JSON file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeatureConfig {
    pub n_fft: usize,
    /// `None` means `n_fft / 4`
    pub hop_length: Option<usize>,
    pub n_mels: usize,
    pub n_mfcc: usize,
    pub window: WindowType,
    /// Pad by `n_fft / 2` so frame `t` is centred on sample `t * hop_length`
    pub center: bool,
    pub pad_mode: PadMode,
    pub fmin: f64,
    /// `None` means the Nyquist frequency of the analysed signal
    pub fmax: Option<f64>,
    pub mel_scale: MelScale,
    pub mel_norm: MelNorm,
    /// Power floor before the logarithm
    pub amin: f64,
    /// Dynamic range kept below the loudest cell in dB
    pub top_db: Option<f64>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self::from_preset(FeaturePreset::Librosa)
    }
}

impl FeatureConfig {
    pub fn from_preset(preset: FeaturePreset) -> Self {
        match preset {
            FeaturePreset::Librosa => Self::librosa(),
            FeaturePreset::Speech => Self::speech(),
        }
    }

    fn librosa() -> Self {
        Self {
            n_fft: 2048,
            hop_length: None,
            n_mels: 128,
            n_mfcc: 20,
            window: WindowType::Hann,
            center: true,
            pad_mode: PadMode::Reflect,
            fmin: 0.0,
            fmax: None,
            mel_scale: MelScale::Htk,
            mel_norm: MelNorm::Slaney,
            amin: 1e-10,
            top_db: Some(80.0),
        }
    }

    fn speech() -> Self {
        Self {
            n_fft: 512,
            hop_length: Some(160),
            n_mels: 40,
            n_mfcc: 13,
            ..Self::librosa()
        }
    }

    /// Effective hop length
    pub fn hop_length(&self) -> usize {
        self.hop_length.unwrap_or(self.n_fft / 4)
    }

    pub fn stft_params(&self) -> StftParams {
        StftParams {
            n_fft: self.n_fft,
            hop_length: self.hop_length(),
            window: self.window,
            center: self.center,
            pad_mode: self.pad_mode,
        }
    }

    pub fn mel_params(&self, sample_rate: u32) -> MelParams {
        MelParams {
            sample_rate,
            n_fft: self.n_fft,
            n_mels: self.n_mels,
            fmin: self.fmin,
            fmax: self.fmax,
            scale: self.mel_scale,
            norm: self.mel_norm,
        }
    }

    pub fn log_params(&self) -> LogParams {
        LogParams {
            amin: self.amin,
            top_db: self.top_db,
        }
    }

    pub fn mfcc_params(&self) -> MfccParams {
        MfccParams {
            n_mfcc: self.n_mfcc,
            log: self.log_params(),
        }
    }

    /// Check the parameters; with a sample rate the mel band edges are
    /// checked against its Nyquist frequency as well.
    pub fn validate(&self, sample_rate: Option<u32>) -> Result<()> {
        if self.n_fft == 0 {
            return Err(FeatureError::config("n_fft must be positive"));
        }
        let hop = self.hop_length();
        if hop == 0 || hop > self.n_fft {
            return Err(FeatureError::config(format!(
                "hop_length must be in 1..={}, got {}",
                self.n_fft, hop
            )));
        }
        if self.n_mels == 0 {
            return Err(FeatureError::config("n_mels must be positive"));
        }
        if self.n_mfcc == 0 || self.n_mfcc > self.n_mels {
            return Err(FeatureError::config(format!(
                "n_mfcc must be in 1..={} (n_mels), got {}",
                self.n_mels, self.n_mfcc
            )));
        }
        self.log_params().validate()?;
        if let Some(sr) = sample_rate {
            self.mel_params(sr).validate()?;
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| FeatureError::config(format!("bad config: {}", e)))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FeatureError::config(format!("cannot serialise config: {}", e)))
    }
}

/// Builder for custom configurations
#[derive(Debug, Clone, Default)]
pub struct FeatureConfigBuilder {
    config: FeatureConfig,
}

impl FeatureConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_preset(preset: FeaturePreset) -> Self {
        Self::from_config(FeatureConfig::from_preset(preset))
    }

    /// Start from an existing configuration, e.g. one loaded from JSON
    pub fn from_config(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn n_fft(mut self, n_fft: usize) -> Self {
        self.config.n_fft = n_fft;
        self
    }

    pub fn hop_length(mut self, hop_length: usize) -> Self {
        self.config.hop_length = Some(hop_length);
        self
    }

    pub fn n_mels(mut self, n_mels: usize) -> Self {
        self.config.n_mels = n_mels;
        self
    }

    pub fn n_mfcc(mut self, n_mfcc: usize) -> Self {
        self.config.n_mfcc = n_mfcc;
        self
    }

    pub fn window(mut self, window: WindowType) -> Self {
        self.config.window = window;
        self
    }

    pub fn center(mut self, center: bool) -> Self {
        self.config.center = center;
        self
    }

    pub fn pad_mode(mut self, pad_mode: PadMode) -> Self {
        self.config.pad_mode = pad_mode;
        self
    }

    pub fn frequency_range(mut self, fmin: f64, fmax: Option<f64>) -> Self {
        self.config.fmin = fmin;
        self.config.fmax = fmax;
        self
    }

    pub fn mel_scale(mut self, scale: MelScale) -> Self {
        self.config.mel_scale = scale;
        self
    }

    pub fn mel_norm(mut self, norm: MelNorm) -> Self {
        self.config.mel_norm = norm;
        self
    }

    pub fn top_db(mut self, top_db: Option<f64>) -> Self {
        self.config.top_db = top_db;
        self
    }

    pub fn amin(mut self, amin: f64) -> Self {
        self.config.amin = amin;
        self
    }

    pub fn build(self) -> Result<FeatureConfig> {
        self.config.validate(None)?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analysis::Stft;

    #[test]
    fn test_defaults() {
        let config = FeatureConfig::default();
        assert_eq!(config.n_fft, 2048);
        assert_eq!(config.hop_length(), 512);
        assert_eq!(config.n_mels, 128);
        assert_eq!(config.n_mfcc, 20);
        assert_eq!(config.mel_params(22050).resolved_fmax(), 11025.0);
        assert!(config.validate(Some(22050)).is_ok());
    }

    #[test]
    fn test_speech_preset() {
        let config = FeatureConfig::from_preset(FeaturePreset::Speech);
        assert_eq!(config.hop_length(), 160);
        assert_eq!(config.stft_params().n_fft, 512);
        assert!(config.validate(Some(16000)).is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = FeatureConfig::from_json(r#"{"n_fft": 1024, "mel_scale": "slaney"}"#).unwrap();
        assert_eq!(config.n_fft, 1024);
        assert_eq!(config.hop_length(), 256);
        assert_eq!(config.mel_scale, MelScale::Slaney);
        assert_eq!(config.n_mels, 128);

        let back = FeatureConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = FeatureConfig::from_json(r#"{"nfft": 1024}"#).unwrap_err();
        assert!(matches!(err, FeatureError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_builder_validation() {
        let config = FeatureConfigBuilder::new()
            .n_fft(1024)
            .hop_length(256)
            .n_mels(64)
            .n_mfcc(13)
            .build()
            .unwrap();
        assert_eq!(config.stft_params().hop_length, 256);
        assert_eq!(config.mfcc_params().n_mfcc, 13);

        assert!(FeatureConfigBuilder::new().n_mfcc(0).build().is_err());
        assert!(FeatureConfigBuilder::new().n_mels(20).n_mfcc(40).build().is_err());
        assert!(FeatureConfigBuilder::new().n_fft(512).hop_length(1024).build().is_err());
        assert!(FeatureConfigBuilder::new().n_fft(3).build().is_err());
        assert_eq!(
            FeatureConfigBuilder::new().n_fft(3).build().is_err(),
            Stft::new(&StftParams::new(3)).is_err()
        );
    }

    #[test]
    fn test_fmax_checked_against_sample_rate() {
        let config = FeatureConfigBuilder::new()
            .frequency_range(0.0, Some(10000.0))
            .build()
            .unwrap();
        assert!(config.validate(Some(22050)).is_ok());
        assert!(matches!(
            config.validate(Some(16000)),
            Err(FeatureError::InvalidConfiguration(_))
        ));
    }
}
