//! Mono sample buffers handed to the DSP pipeline

use crate::error::{FeatureError, Result};

/// One channel of samples normalised to [-1.0, 1.0] plus its sample rate.
///
/// Immutable once built; the DSP stages only ever borrow it.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(FeatureError::config("sample rate must be positive"));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

impl AsRef<[f32]> for SampleBuffer {
    fn as_ref(&self) -> &[f32] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration() {
        let buffer = SampleBuffer::new(vec![0.0; 24000], 16000).unwrap();
        assert_eq!(buffer.len(), 24000);
        assert!((buffer.duration_secs() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        assert!(matches!(
            SampleBuffer::new(vec![0.0; 4], 0),
            Err(FeatureError::InvalidConfiguration(_))
        ));
    }
}
