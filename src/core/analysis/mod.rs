//! Spectral feature algorithms
//!
//! - Short-time Fourier transform and its overlap-add inverse
//! - Mel filterbank projection
//! - Log compression and MFCC

pub mod mel;
pub mod mfcc;
pub mod stft;

pub use mel::{
    fft_frequencies, hz_to_mel, mel_frequencies, mel_to_hz, MelFilterbank, MelNorm, MelParams,
    MelScale, MelSpectrogram,
};
pub use mfcc::{dct_basis, mean_mfcc, mfcc, power_to_db, LogParams, MfccMatrix, MfccParams};
pub use stft::{Stft, StftMatrix, StftParams};
