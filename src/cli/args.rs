//! CLI argument parsing with preset support

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::Serialize;

use crate::config::{FeatureConfig, FeatureConfigBuilder, FeaturePreset};
use crate::core::dsp::{PadMode, WindowType};
use crate::core::LoadOptions;
use crate::error::Result;

/// Feature written for each input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    /// Complex STFT as `[re, im]` pairs
    Stft,
    /// STFT followed by its inverse, written as WAV
    Istft,
    /// Mel power spectrogram
    Mel,
    /// Mel-frequency cepstral coefficients
    Mfcc,
    /// MFCC averaged over frames
    MeanMfcc,
}

impl Feature {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stft => "stft",
            Self::Istft => "istft",
            Self::Mel => "mel",
            Self::Mfcc => "mfcc",
            Self::MeanMfcc => "mean-mfcc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PresetArg {
    Librosa,
    Speech,
}

impl From<PresetArg> for FeaturePreset {
    fn from(p: PresetArg) -> Self {
        match p {
            PresetArg::Librosa => FeaturePreset::Librosa,
            PresetArg::Speech => FeaturePreset::Speech,
        }
    }
}

fn parse_window(name: &str) -> std::result::Result<WindowType, String> {
    WindowType::from_name(name).ok_or_else(|| {
        format!("unknown window '{}' (hann, hamming, blackman, rectangular)", name)
    })
}

fn parse_pad_mode(name: &str) -> std::result::Result<PadMode, String> {
    PadMode::from_name(name)
        .ok_or_else(|| format!("unknown pad mode '{}' (reflect, constant, edge)", name))
}

#[derive(Parser, Debug)]
#[command(name = "melkit", version)]
#[command(about = "Extract STFT, mel spectrogram and MFCC features from audio files")]
pub struct Args {
    /// Input file or directory
    pub input: PathBuf,

    /// Feature to extract
    #[arg(short, long, value_enum, default_value_t = Feature::Mfcc)]
    pub feature: Feature,

    /// Parameter preset applied before any other option
    #[arg(short, long, value_enum)]
    pub preset: Option<PresetArg>,

    /// JSON configuration file; individual flags override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub n_fft: Option<usize>,

    #[arg(long)]
    pub hop_length: Option<usize>,

    #[arg(long)]
    pub n_mels: Option<usize>,

    #[arg(long)]
    pub n_mfcc: Option<usize>,

    /// Analysis window
    #[arg(long, value_parser = parse_window)]
    pub window: Option<WindowType>,

    /// Padding used for centred frames
    #[arg(long, value_parser = parse_pad_mode)]
    pub pad_mode: Option<PadMode>,

    /// Frame the raw signal without centre padding
    #[arg(long)]
    pub no_center: bool,

    /// Target sample rate in Hz, -1 keeps the native rate
    #[arg(short = 'r', long, default_value_t = -1, allow_hyphen_values = true)]
    pub sample_rate: i32,

    /// Seconds to read, -1 reads the whole file
    #[arg(short, long, default_value_t = -1, allow_hyphen_values = true)]
    pub duration: i32,

    /// Seconds skipped at the start of each file
    #[arg(long, default_value_t = 0.0)]
    pub offset: f64,

    /// Output directory
    #[arg(short, long, default_value = "features")]
    pub output: PathBuf,

    /// Worker threads (defaults to one per core)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Preset or config file, then per-flag overrides, validated
    pub fn feature_config(&self) -> Result<FeatureConfig> {
        let base = match (&self.config, self.preset) {
            (Some(path), _) => FeatureConfig::from_file(path)?,
            (None, Some(preset)) => FeatureConfig::from_preset(preset.into()),
            (None, None) => FeatureConfig::default(),
        };

        let mut builder = FeatureConfigBuilder::from_config(base);
        if let Some(n_fft) = self.n_fft {
            builder = builder.n_fft(n_fft);
        }
        if let Some(hop) = self.hop_length {
            builder = builder.hop_length(hop);
        }
        if let Some(n_mels) = self.n_mels {
            builder = builder.n_mels(n_mels);
        }
        if let Some(n_mfcc) = self.n_mfcc {
            builder = builder.n_mfcc(n_mfcc);
        }
        if let Some(window) = self.window {
            builder = builder.window(window);
        }
        if let Some(pad_mode) = self.pad_mode {
            builder = builder.pad_mode(pad_mode);
        }
        if self.no_center {
            builder = builder.center(false);
        }
        builder.build()
    }

    pub fn load_options(&self) -> Result<LoadOptions> {
        let mut options = LoadOptions::from_sentinels(self.sample_rate, self.duration)?;
        options.offset_secs = self.offset;
        Ok(options)
    }
}
