//! Frame decomposition with centre padding

use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, Result};

/// How the signal is extended by `frame_length / 2` samples on each side
/// before centred framing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PadMode {
    /// Mirror around the edge sample without repeating it (numpy `reflect`)
    #[default]
    Reflect,
    /// Zeros
    Constant,
    /// Repeat the edge sample
    Edge,
}

impl PadMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "reflect" => Some(Self::Reflect),
            "constant" | "zeros" => Some(Self::Constant),
            "edge" => Some(Self::Edge),
            _ => None,
        }
    }
}

/// Map an index outside `[0, n)` back into range by repeated mirroring.
fn reflect_index(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n as isize - 1);
    let m = i.rem_euclid(period);
    if m >= n as isize {
        (period - m) as usize
    } else {
        m as usize
    }
}

/// Extend `samples` by `pad` on both sides according to `mode`.
pub fn pad_signal(samples: &[f32], pad: usize, mode: PadMode) -> Vec<f64> {
    let n = samples.len();
    if n == 0 {
        return vec![0.0; 2 * pad];
    }
    let mut padded = Vec::with_capacity(n + 2 * pad);

    let sample_at = |i: isize| -> f64 {
        if i >= 0 && (i as usize) < n {
            return samples[i as usize] as f64;
        }
        match mode {
            PadMode::Constant => 0.0,
            PadMode::Edge => {
                let clamped = i.clamp(0, n as isize - 1) as usize;
                samples[clamped] as f64
            }
            PadMode::Reflect => samples[reflect_index(i, n)] as f64,
        }
    };

    for i in -(pad as isize)..(n + pad) as isize {
        padded.push(sample_at(i));
    }
    padded
}

/// Slices a signal into overlapping fixed-length frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Framer {
    frame_length: usize,
    hop_length: usize,
    padding: Option<PadMode>,
}

impl Framer {
    /// `padding: None` frames the raw signal starting at sample 0.
    pub fn new(frame_length: usize, hop_length: usize, padding: Option<PadMode>) -> Result<Self> {
        if frame_length == 0 {
            return Err(FeatureError::config("frame length must be positive"));
        }
        if hop_length == 0 {
            return Err(FeatureError::config("hop length must be positive"));
        }
        if hop_length > frame_length {
            return Err(FeatureError::config(format!(
                "hop length {} exceeds frame length {}",
                hop_length, frame_length
            )));
        }
        Ok(Self {
            frame_length,
            hop_length,
            padding,
        })
    }

    pub fn frame_length(&self) -> usize {
        self.frame_length
    }

    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    pub fn padding(&self) -> Option<PadMode> {
        self.padding
    }

    /// Samples added on each side before framing
    pub fn pad_amount(&self) -> usize {
        if self.padding.is_some() {
            self.frame_length / 2
        } else {
            0
        }
    }

    /// Number of frames produced for `n_samples` input samples
    pub fn frame_count(&self, n_samples: usize) -> usize {
        let padded = n_samples + 2 * self.pad_amount();
        if padded < self.frame_length {
            1
        } else {
            1 + (padded - self.frame_length) / self.hop_length
        }
    }

    pub fn frame(&self, samples: &[f32]) -> Result<FramedSignal> {
        if samples.is_empty() {
            return Err(FeatureError::empty("cannot frame an empty sample buffer"));
        }

        let pad = self.pad_amount();
        let mut signal = match self.padding {
            Some(mode) => pad_signal(samples, pad, mode),
            None => samples.iter().map(|&s| s as f64).collect(),
        };

        // A signal shorter than one frame becomes a single zero-padded frame.
        if signal.len() < self.frame_length {
            signal.resize(self.frame_length, 0.0);
        }

        let n_frames = self.frame_count(samples.len());
        Ok(FramedSignal {
            signal,
            frame_length: self.frame_length,
            hop_length: self.hop_length,
            n_frames,
        })
    }
}

/// A padded signal together with its frame geometry.
///
/// Frames are views into the padded signal; iterating is free of side effects
/// and can be restarted any number of times.
#[derive(Debug, Clone)]
pub struct FramedSignal {
    signal: Vec<f64>,
    frame_length: usize,
    hop_length: usize,
    n_frames: usize,
}

impl FramedSignal {
    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    pub fn frame_length(&self) -> usize {
        self.frame_length
    }

    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    pub fn frame(&self, index: usize) -> &[f64] {
        let start = index * self.hop_length;
        &self.signal[start..start + self.frame_length]
    }

    pub fn iter(&self) -> Frames<'_> {
        Frames {
            framed: self,
            next: 0,
        }
    }
}

impl<'a> IntoIterator for &'a FramedSignal {
    type Item = &'a [f64];
    type IntoIter = Frames<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Frames<'a> {
    framed: &'a FramedSignal,
    next: usize,
}

impl<'a> Iterator for Frames<'a> {
    type Item = &'a [f64];

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.framed.n_frames {
            return None;
        }
        let frame = self.framed.frame(self.next);
        self.next += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.framed.n_frames - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Frames<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect_padding_excludes_edge() {
        let padded = pad_signal(&[1.0, 2.0, 3.0, 4.0], 2, PadMode::Reflect);
        assert_eq!(padded, vec![3.0, 2.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0]);
    }

    #[test]
    fn test_reflect_padding_longer_than_signal() {
        // numpy.pad([1, 2, 3], 4, mode="reflect")
        let padded = pad_signal(&[1.0, 2.0, 3.0], 4, PadMode::Reflect);
        assert_eq!(padded, vec![1.0, 2.0, 3.0, 2.0, 1.0, 2.0, 3.0, 2.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_constant_and_edge_padding() {
        let constant = pad_signal(&[1.0, 2.0], 2, PadMode::Constant);
        assert_eq!(constant, vec![0.0, 0.0, 1.0, 2.0, 0.0, 0.0]);

        let edge = pad_signal(&[1.0, 2.0], 2, PadMode::Edge);
        assert_eq!(edge, vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_pad_mode_from_name() {
        assert_eq!(PadMode::from_name("Reflect"), Some(PadMode::Reflect));
        assert_eq!(PadMode::from_name("zeros"), Some(PadMode::Constant));
        assert_eq!(PadMode::from_name("edge"), Some(PadMode::Edge));
        assert_eq!(PadMode::from_name("wrap"), None);
    }

    #[test]
    fn test_frame_count_centered() {
        let framer = Framer::new(2048, 512, Some(PadMode::Reflect)).unwrap();
        // 1 second at 16 kHz
        assert_eq!(framer.frame_count(16000), 32);
        assert_eq!(framer.frame_count(22050), 44);
    }

    #[test]
    fn test_frame_count_uncentered() {
        let framer = Framer::new(2048, 512, None).unwrap();
        assert_eq!(framer.frame_count(16000), 28);
        assert_eq!(framer.frame_count(100), 1);
    }

    #[test]
    fn test_frames_are_hop_aligned_views() {
        let samples: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let framer = Framer::new(4, 2, None).unwrap();
        let framed = framer.frame(&samples).unwrap();

        assert_eq!(framed.n_frames(), 4);
        let frames: Vec<&[f64]> = framed.iter().collect();
        assert_eq!(frames[0], &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(frames[3], &[6.0, 7.0, 8.0, 9.0]);

        // restartable
        assert_eq!(framed.iter().count(), 4);
        assert_eq!(framed.iter().len(), 4);
    }

    #[test]
    fn test_short_signal_zero_padded_to_one_frame() {
        let framer = Framer::new(8, 2, None).unwrap();
        let framed = framer.frame(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(framed.n_frames(), 1);
        assert_eq!(framed.frame(0), &[1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_invalid_framer() {
        assert!(matches!(Framer::new(0, 1, None), Err(FeatureError::InvalidConfiguration(_))));
        assert!(matches!(Framer::new(4, 0, None), Err(FeatureError::InvalidConfiguration(_))));
        assert!(matches!(Framer::new(4, 5, None), Err(FeatureError::InvalidConfiguration(_))));

        let framer = Framer::new(4, 2, None).unwrap();
        assert!(matches!(framer.frame(&[]), Err(FeatureError::EmptyInput(_))));
    }
}
