//! Digital Signal Processing building blocks
//!
//! - `fft` - planned complex and real transforms
//! - `windows` - periodic analysis windows with a shared cache
//! - `framing` - centre padding and overlapping frames
//! - `matrix` - frame-major feature containers

pub mod fft;
pub mod framing;
pub mod matrix;
pub mod windows;

pub use fft::FftEngine;
pub use framing::{pad_signal, FramedSignal, Framer, Frames, PadMode};
pub use matrix::FeatureMatrix;
pub use windows::{cached_window, create_window, WindowType};
