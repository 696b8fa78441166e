// src/core/resample.rs
//
// Sample rate conversion. The default resampler is band-limited sinc
// interpolation from rubato; the output is aligned with the input by
// discarding the filter delay.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::{FeatureError, Result};

/// Converts mono audio between sample rates
pub trait Resample: Send + Sync {
    fn resample(&self, samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>>;
}

/// Windowed-sinc resampler
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SincResampler {
    pub sinc_len: usize,
    /// Cutoff relative to the lower Nyquist frequency
    pub f_cutoff: f32,
    pub oversampling_factor: usize,
    pub chunk_size: usize,
}

impl Default for SincResampler {
    fn default() -> Self {
        Self {
            sinc_len: 256,
            f_cutoff: 0.95,
            oversampling_factor: 256,
            chunk_size: 1024,
        }
    }
}

impl SincResampler {
    fn interpolation_params(&self) -> SincInterpolationParameters {
        SincInterpolationParameters {
            sinc_len: self.sinc_len,
            f_cutoff: self.f_cutoff,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: self.oversampling_factor,
            window: WindowFunction::BlackmanHarris2,
        }
    }
}

/// Output length for `n` input samples: `ceil(n * to / from)`
pub fn resampled_len(n: usize, from_rate: u32, to_rate: u32) -> usize {
    (n as f64 * to_rate as f64 / from_rate as f64).ceil() as usize
}

impl Resample for SincResampler {
    fn resample(&self, samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
        if from_rate == 0 || to_rate == 0 {
            return Err(FeatureError::config("sample rates must be positive"));
        }
        if from_rate == to_rate || samples.is_empty() {
            return Ok(samples.to_vec());
        }

        let ratio = to_rate as f64 / from_rate as f64;
        let mut resampler =
            SincFixedIn::<f64>::new(ratio, 1.0, self.interpolation_params(), self.chunk_size, 1)
                .map_err(|e| FeatureError::Resample(e.to_string()))?;

        let input: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
        let expected = resampled_len(samples.len(), from_rate, to_rate);
        let delay = resampler.output_delay();
        let mut output: Vec<f64> = Vec::with_capacity(expected + delay);

        let mut pos = 0;
        while pos + resampler.input_frames_next() <= input.len() {
            let n = resampler.input_frames_next();
            let block = resampler
                .process(&[&input[pos..pos + n]], None)
                .map_err(|e| FeatureError::Resample(e.to_string()))?;
            output.extend_from_slice(&block[0]);
            pos += n;
        }

        if pos < input.len() {
            let block = resampler
                .process_partial(Some(&[&input[pos..]]), None)
                .map_err(|e| FeatureError::Resample(e.to_string()))?;
            output.extend_from_slice(&block[0]);
        }

        // Flush the filter tail
        while output.len() < expected + delay {
            let block = resampler
                .process_partial(None::<&[&[f64]]>, None)
                .map_err(|e| FeatureError::Resample(e.to_string()))?;
            if block[0].is_empty() {
                break;
            }
            output.extend_from_slice(&block[0]);
        }

        output.drain(..delay.min(output.len()));
        output.resize(expected, 0.0);

        log::debug!(
            "Resampled {} samples {} Hz -> {} samples {} Hz",
            samples.len(),
            from_rate,
            output.len(),
            to_rate
        );

        Ok(output.into_iter().map(|s| s as f32).collect())
    }
}
