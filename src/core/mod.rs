//! Core DSP, decoding and the feature extraction pipeline

pub mod analysis;
pub mod decoder;
pub mod dsp;
pub mod pipeline;
pub mod resample;
pub mod sample_buffer;

pub use analysis::{
    MelFilterbank, MelNorm, MelParams, MelScale, MelSpectrogram, MfccMatrix, Stft, StftMatrix,
    StftParams,
};
pub use decoder::{AudioDecoder, DecodedAudio, SymphoniaDecoder};
pub use dsp::FeatureMatrix;
pub use pipeline::{FeatureExtractor, FeatureExtractorBuilder, LoadOptions, LoadedAudio};
pub use resample::{Resample, SincResampler};
pub use sample_buffer::SampleBuffer;
