// src/core/analysis/stft.rs
//
// Short-time Fourier transform and its inverse (windowed overlap-add).
// Framing, windowing and padding follow librosa.stft / librosa.istft.

use std::sync::Arc;

use num_complex::Complex64;
use rayon::prelude::*;

use crate::core::dsp::{cached_window, FeatureMatrix, FftEngine, Framer, PadMode, WindowType};
use crate::core::sample_buffer::SampleBuffer;
use crate::error::{FeatureError, Result};

/// STFT parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StftParams {
    pub n_fft: usize,
    pub hop_length: usize,
    pub window: WindowType,
    /// Pad by `n_fft / 2` on both sides so frame `t` is centred on sample `t * hop_length`
    pub center: bool,
    pub pad_mode: PadMode,
}

impl StftParams {
    /// librosa defaults for the given FFT size: hop of `n_fft / 4`, Hann, centred, reflect
    pub fn new(n_fft: usize) -> Self {
        Self {
            n_fft,
            hop_length: n_fft / 4,
            window: WindowType::Hann,
            center: true,
            pad_mode: PadMode::Reflect,
        }
    }
}

impl Default for StftParams {
    fn default() -> Self {
        Self::new(2048)
    }
}

/// Complex STFT with shape `[n_fft / 2 + 1, n_frames]`
#[derive(Debug, Clone, PartialEq)]
pub struct StftMatrix {
    bins: FeatureMatrix<Complex64>,
    n_fft: usize,
    hop_length: usize,
    sample_rate: u32,
}

impl StftMatrix {
    /// Wrap a spectrum, checking that every frame has `n_fft / 2 + 1` bins
    pub fn new(
        bins: FeatureMatrix<Complex64>,
        n_fft: usize,
        hop_length: usize,
        sample_rate: u32,
    ) -> Result<Self> {
        if n_fft == 0 || hop_length == 0 {
            return Err(FeatureError::config("n_fft and hop_length must be positive"));
        }
        if sample_rate == 0 {
            return Err(FeatureError::config("sample rate must be positive"));
        }
        if bins.n_features() != n_fft / 2 + 1 {
            return Err(FeatureError::DimensionMismatch {
                context: "STFT frequency bins",
                expected: n_fft / 2 + 1,
                actual: bins.n_features(),
            });
        }
        Ok(Self {
            bins,
            n_fft,
            hop_length,
            sample_rate,
        })
    }

    /// Build from the librosa layout `rows[bin][frame]`
    pub fn from_rows(
        rows: &[Vec<Complex64>],
        n_fft: usize,
        hop_length: usize,
        sample_rate: u32,
    ) -> Result<Self> {
        Self::new(FeatureMatrix::from_rows(rows)?, n_fft, hop_length, sample_rate)
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn n_bins(&self) -> usize {
        self.bins.n_features()
    }

    pub fn n_frames(&self) -> usize {
        self.bins.n_frames()
    }

    /// `(n_bins, n_frames)`
    pub fn shape(&self) -> (usize, usize) {
        self.bins.shape()
    }

    pub fn get(&self, bin: usize, frame: usize) -> Complex64 {
        self.bins.get(bin, frame)
    }

    pub fn frame(&self, frame: usize) -> &[Complex64] {
        self.bins.frame(frame)
    }

    pub fn bins(&self) -> &FeatureMatrix<Complex64> {
        &self.bins
    }

    /// Power spectrogram `|X|^2`
    pub fn power(&self) -> FeatureMatrix<f64> {
        self.bins.map(|c| c.norm_sqr())
    }

    pub fn magnitude(&self) -> FeatureMatrix<f64> {
        self.bins.map(|c| c.norm())
    }
}

/// Forward and inverse STFT for one parameter set.
///
/// Holds the window and FFT plans so repeated calls only pay for the
/// transforms themselves.
#[derive(Debug)]
pub struct Stft {
    params: StftParams,
    window: Arc<[f64]>,
    framer: Framer,
    engine: FftEngine,
}

impl Stft {
    pub fn new(params: &StftParams) -> Result<Self> {
        if params.n_fft == 0 {
            return Err(FeatureError::config("n_fft must be positive"));
        }
        let padding = params.center.then_some(params.pad_mode);
        let framer = Framer::new(params.n_fft, params.hop_length, padding)?;

        Ok(Self {
            params: *params,
            window: cached_window(params.n_fft, params.window),
            framer,
            engine: FftEngine::new(params.n_fft)?,
        })
    }

    pub fn params(&self) -> &StftParams {
        &self.params
    }

    /// Number of frames `forward` produces for `n_samples` samples
    pub fn frame_count(&self, n_samples: usize) -> usize {
        self.framer.frame_count(n_samples)
    }

    pub fn forward(&self, buffer: &SampleBuffer) -> Result<StftMatrix> {
        let framed = self.framer.frame(buffer.samples())?;
        let n_fft = self.params.n_fft;
        let n_bins = self.engine.spectrum_len();
        let n_frames = framed.n_frames();

        log::debug!(
            "STFT: {} samples -> {} frames x {} bins (n_fft={}, hop={})",
            buffer.len(),
            n_frames,
            n_bins,
            n_fft,
            self.params.hop_length
        );

        let mut bins = FeatureMatrix::<Complex64>::zeros(n_bins, n_frames);
        bins.as_mut_slice()
            .par_chunks_mut(n_bins)
            .enumerate()
            .try_for_each_init(
                || (vec![0.0f64; n_fft], self.engine.forward_scratch()),
                |(windowed, scratch), (t, out)| -> Result<()> {
                    for ((dst, &sample), &w) in
                        windowed.iter_mut().zip(framed.frame(t)).zip(self.window.iter())
                    {
                        *dst = sample * w;
                    }
                    self.engine.forward_real_into(windowed, out, scratch)?;

                    // real input: DC and (even n_fft) Nyquist carry no phase
                    out[0].im = 0.0;
                    if n_fft % 2 == 0 {
                        out[n_bins - 1].im = 0.0;
                    }
                    Ok(())
                },
            )?;

        StftMatrix::new(bins, n_fft, self.params.hop_length, buffer.sample_rate())
    }

    /// Inverse STFT by windowed overlap-add.
    ///
    /// Each output sample is divided by the summed squared window of the
    /// frames covering it. With `length`, the output is cut or zero-padded to
    /// exactly that many samples; otherwise the centre padding is trimmed from
    /// both ends.
    pub fn inverse(&self, spectrum: &StftMatrix, length: Option<usize>) -> Result<SampleBuffer> {
        let n_fft = self.params.n_fft;
        let hop = self.params.hop_length;

        if spectrum.n_fft() != n_fft {
            return Err(FeatureError::DimensionMismatch {
                context: "inverse STFT n_fft",
                expected: n_fft,
                actual: spectrum.n_fft(),
            });
        }
        if spectrum.hop_length() != hop {
            return Err(FeatureError::DimensionMismatch {
                context: "inverse STFT hop length",
                expected: hop,
                actual: spectrum.hop_length(),
            });
        }
        let n_frames = spectrum.n_frames();
        if n_frames == 0 {
            return Err(FeatureError::empty("STFT matrix has no frames"));
        }

        let n_bins = spectrum.n_bins();
        let mut frames = vec![0.0f64; n_frames * n_fft];
        frames
            .par_chunks_mut(n_fft)
            .enumerate()
            .try_for_each_init(
                || (vec![Complex64::default(); n_bins], self.engine.inverse_scratch()),
                |(bins, scratch), (t, out)| -> Result<()> {
                    bins.copy_from_slice(spectrum.frame(t));
                    self.engine.inverse_real_into(bins, out, scratch)?;
                    for (sample, &w) in out.iter_mut().zip(self.window.iter()) {
                        *sample *= w;
                    }
                    Ok(())
                },
            )?;

        let expected_len = n_fft + hop * (n_frames - 1);
        let mut signal = vec![0.0f64; expected_len];
        let mut window_sum = vec![0.0f64; expected_len];
        for (t, frame) in frames.chunks_exact(n_fft).enumerate() {
            let start = t * hop;
            for (i, (&sample, &w)) in frame.iter().zip(self.window.iter()).enumerate() {
                signal[start + i] += sample;
                window_sum[start + i] += w * w;
            }
        }
        for (sample, &norm) in signal.iter_mut().zip(&window_sum) {
            if norm > f64::MIN_POSITIVE {
                *sample /= norm;
            }
        }

        let start = if self.params.center { n_fft / 2 } else { 0 };
        let output: Vec<f32> = match length {
            Some(len) => (start..start + len)
                .map(|i| signal.get(i).copied().unwrap_or(0.0) as f32)
                .collect(),
            None => {
                let end = if self.params.center {
                    expected_len - n_fft / 2
                } else {
                    expected_len
                };
                signal[start..end].iter().map(|&s| s as f32).collect()
            }
        };

        log::debug!(
            "Inverse STFT: {} frames -> {} samples",
            n_frames,
            output.len()
        );

        SampleBuffer::new(output, spectrum.sample_rate())
    }
}
