//! melkit - librosa-compatible spectral features in Rust
//!
//! Computes the short-time Fourier transform, its inverse, mel spectrograms,
//! MFCCs and frame-averaged MFCCs with the numerical conventions of librosa:
//! centred reflect-padded frames, a periodic Hann window, HTK or Slaney mel
//! filters and an orthonormal DCT-II.
//!
//! ## Module Structure
//!
//! - `core` - DSP primitives, decoding, resampling and the extraction pipeline
//! - `cli` - Command-line interface
//! - `config` - Feature parameters, presets and JSON loading
//! - `error` - Error type shared by every operation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use melkit::{FeatureConfig, FeatureExtractor};
//!
//! let extractor = FeatureExtractor::new(FeatureConfig::default())?;
//!
//! // -1 keeps the native sample rate and reads the whole file
//! let audio = extractor.load_and_read(path, -1, -1)?;
//!
//! let mfcc = extractor.generate_mfcc_features(&audio.mono)?;
//! let mean = extractor.generate_mean_mfcc_features(&mfcc)?;
//! println!("{} coefficients over {} frames", mfcc.n_features(), mfcc.n_frames());
//! ```
//!
//! ## Presets
//!
//! | Preset  | n_fft | hop | n_mels | n_mfcc |
//! |---------|-------|-----|--------|--------|
//! | Librosa | 2048  | 512 | 128    | 20     |
//! | Speech  | 512   | 160 | 40     | 13     |

// DSP, decoding and the feature pipeline
pub mod core;

// Command-line interface
pub mod cli;

// Configuration and presets
pub mod config;

pub mod error;

// Re-export commonly used types at crate root for convenience
pub use crate::config::{FeatureConfig, FeatureConfigBuilder, FeaturePreset};
pub use crate::core::{
    FeatureExtractor, FeatureExtractorBuilder, FeatureMatrix, LoadOptions, LoadedAudio,
    MelSpectrogram, MfccMatrix, SampleBuffer, StftMatrix,
};
pub use crate::error::{FeatureError, Result};
