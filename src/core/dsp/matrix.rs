//! Fixed-shape feature matrices
//!
//! Data is stored frame-major: the `n_features` values of frame 0, then frame
//! 1, and so on. Per-frame work (FFT, filterbank projection, DCT) then reads
//! and writes contiguous slices. The accessors expose the librosa view where
//! the first index is the feature (bin, band or coefficient) and the second
//! is the frame.

use serde::Serialize;

use crate::error::{FeatureError, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureMatrix<T> {
    n_features: usize,
    n_frames: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> FeatureMatrix<T> {
    /// Matrix filled with `T::default()`
    pub fn zeros(n_features: usize, n_frames: usize) -> Self {
        Self {
            n_features,
            n_frames,
            data: vec![T::default(); n_features * n_frames],
        }
    }

    /// Wrap frame-major data, checking its length against the shape
    pub fn from_frame_major(n_features: usize, n_frames: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != n_features * n_frames {
            return Err(FeatureError::DimensionMismatch {
                context: "frame-major matrix data",
                expected: n_features * n_frames,
                actual: data.len(),
            });
        }
        Ok(Self { n_features, n_frames, data })
    }

    /// Build from one vector per frame; every frame must hold `n_features` values
    pub fn from_frames(n_features: usize, frames: &[Vec<T>]) -> Result<Self> {
        let mut data = Vec::with_capacity(n_features * frames.len());
        for frame in frames {
            if frame.len() != n_features {
                return Err(FeatureError::DimensionMismatch {
                    context: "matrix frame length",
                    expected: n_features,
                    actual: frame.len(),
                });
            }
            data.extend_from_slice(frame);
        }
        Ok(Self { n_features, n_frames: frames.len(), data })
    }

    /// Build from the librosa layout `rows[feature][frame]`
    pub fn from_rows(rows: &[Vec<T>]) -> Result<Self> {
        let n_features = rows.len();
        let n_frames = rows.first().map_or(0, Vec::len);

        let mut matrix = Self::zeros(n_features, n_frames);
        for (f, row) in rows.iter().enumerate() {
            if row.len() != n_frames {
                return Err(FeatureError::DimensionMismatch {
                    context: "matrix row length",
                    expected: n_frames,
                    actual: row.len(),
                });
            }
            for (t, &value) in row.iter().enumerate() {
                matrix.data[t * n_features + f] = value;
            }
        }
        Ok(matrix)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    /// `(n_features, n_frames)`, matching librosa's array shape
    pub fn shape(&self) -> (usize, usize) {
        (self.n_features, self.n_frames)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, feature: usize, frame: usize) -> T {
        self.data[frame * self.n_features + feature]
    }

    pub fn frame(&self, frame: usize) -> &[T] {
        let start = frame * self.n_features;
        &self.data[start..start + self.n_features]
    }

    pub fn frames(&self) -> std::slice::ChunksExact<'_, T> {
        self.data.chunks_exact(self.n_features.max(1))
    }

    /// One feature across all frames (strided copy)
    pub fn feature_row(&self, feature: usize) -> Vec<T> {
        self.frames().map(|frame| frame[feature]).collect()
    }

    /// Copy out as `[feature][frame]`
    pub fn to_nested(&self) -> Vec<Vec<T>> {
        (0..self.n_features).map(|f| self.feature_row(f)).collect()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn map<U: Copy + Default>(&self, f: impl Fn(T) -> U) -> FeatureMatrix<U> {
        FeatureMatrix {
            n_features: self.n_features,
            n_frames: self.n_frames,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_and_accessors() {
        // frames: [1,2,3], [4,5,6]
        let m = FeatureMatrix::from_frames(3, &[vec![1, 2, 3], vec![4, 5, 6]]).unwrap();
        assert_eq!(m.shape(), (3, 2));
        assert_eq!(m.get(0, 1), 4);
        assert_eq!(m.get(2, 0), 3);
        assert_eq!(m.frame(1), &[4, 5, 6]);
        assert_eq!(m.feature_row(1), vec![2, 5]);
        assert_eq!(m.to_nested(), vec![vec![1, 4], vec![2, 5], vec![3, 6]]);
    }

    #[test]
    fn test_from_rows_inverts_to_nested() {
        let rows = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let m = FeatureMatrix::from_rows(&rows).unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.frame(2), &[3.0, 6.0]);
        assert_eq!(m.to_nested(), rows);
    }

    #[test]
    fn test_shape_validation() {
        let err = FeatureMatrix::from_frames(2, &[vec![1, 2], vec![3]]).unwrap_err();
        assert!(matches!(err, FeatureError::DimensionMismatch { expected: 2, actual: 1, .. }));

        let err = FeatureMatrix::from_rows(&[vec![1, 2], vec![3]]).unwrap_err();
        assert!(matches!(err, FeatureError::DimensionMismatch { .. }));

        assert!(FeatureMatrix::from_frame_major(2, 2, vec![0; 3]).is_err());
    }

    #[test]
    fn test_zero_frames() {
        let m: FeatureMatrix<f64> = FeatureMatrix::zeros(40, 0);
        assert!(m.is_empty());
        assert_eq!(m.frames().count(), 0);
        assert_eq!(m.to_nested().len(), 40);
    }
}
