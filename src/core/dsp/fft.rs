//! FFT engine
//!
//! Plans are built once per length. rustfft handles every length with a
//! mixed-radix algorithm, so inputs are never zero-padded to a power of two;
//! this keeps bin spacing at exactly `sample_rate / len`.

use std::sync::Arc;

use num_complex::Complex64;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::{Fft, FftPlanner};

use crate::error::{FeatureError, Result};

/// Planned forward/inverse transforms for a single length.
///
/// The engine keeps no per-call state: every method takes `&self` and
/// allocates (or borrows) its own scratch, so one engine can be shared by
/// any number of threads.
pub struct FftEngine {
    len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    real_forward: Arc<dyn RealToComplex<f64>>,
    real_inverse: Arc<dyn ComplexToReal<f64>>,
}

impl FftEngine {
    pub fn new(len: usize) -> Result<Self> {
        if len == 0 {
            return Err(FeatureError::config("FFT length must be positive"));
        }

        let mut planner = FftPlanner::<f64>::new();
        let mut real_planner = RealFftPlanner::<f64>::new();

        Ok(Self {
            len,
            forward: planner.plan_fft_forward(len),
            inverse: planner.plan_fft_inverse(len),
            real_forward: real_planner.plan_fft_forward(len),
            real_inverse: real_planner.plan_fft_inverse(len),
        })
    }

    /// Transform length
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of non-redundant bins of a real-input spectrum
    pub fn spectrum_len(&self) -> usize {
        self.len / 2 + 1
    }

    /// Unnormalised forward DFT of a complex sequence
    pub fn transform(&self, input: &[Complex64]) -> Result<Vec<Complex64>> {
        self.check_len("complex FFT input", input.len())?;

        let mut buffer = input.to_vec();
        let mut scratch = vec![Complex64::default(); self.forward.get_inplace_scratch_len()];
        self.forward.process_with_scratch(&mut buffer, &mut scratch);
        Ok(buffer)
    }

    /// Full-length forward DFT of a real sequence.
    ///
    /// The upper half is filled in from conjugate symmetry.
    pub fn transform_real(&self, input: &[f64]) -> Result<Vec<Complex64>> {
        self.check_len("real FFT input", input.len())?;

        let mut buffer = input.to_vec();
        let mut half = self.real_forward.make_output_vec();
        let mut scratch = self.real_forward.make_scratch_vec();
        self.forward_real_into(&mut buffer, &mut half, &mut scratch)?;

        let mut full = Vec::with_capacity(self.len);
        full.extend_from_slice(&half);
        for k in half.len()..self.len {
            full.push(half[self.len - k].conj());
        }
        Ok(full)
    }

    /// Inverse DFT scaled by `1 / len`, so `inverse(transform(x)) == x`
    pub fn inverse_transform(&self, input: &[Complex64]) -> Result<Vec<Complex64>> {
        self.check_len("complex IFFT input", input.len())?;

        let mut buffer = input.to_vec();
        let mut scratch = vec![Complex64::default(); self.inverse.get_inplace_scratch_len()];
        self.inverse.process_with_scratch(&mut buffer, &mut scratch);

        let scale = 1.0 / self.len as f64;
        for c in buffer.iter_mut() {
            *c *= scale;
        }
        Ok(buffer)
    }

    /// Half-spectrum forward transform into caller buffers.
    ///
    /// `input` is used as scratch space and holds garbage afterwards.
    pub fn forward_real_into(
        &self,
        input: &mut [f64],
        output: &mut [Complex64],
        scratch: &mut [Complex64],
    ) -> Result<()> {
        self.check_len("real FFT input", input.len())?;
        if output.len() != self.spectrum_len() {
            return Err(FeatureError::DimensionMismatch {
                context: "real FFT output",
                expected: self.spectrum_len(),
                actual: output.len(),
            });
        }
        self.real_forward.process_with_scratch(input, output, scratch)?;
        Ok(())
    }

    /// Half-spectrum inverse transform into a caller buffer, scaled by `1 / len`.
    ///
    /// The imaginary parts of the DC bin (and the Nyquist bin for even lengths)
    /// are dropped, which is what a real-valued output implies.
    pub fn inverse_real_into(
        &self,
        spectrum: &mut [Complex64],
        output: &mut [f64],
        scratch: &mut [Complex64],
    ) -> Result<()> {
        if spectrum.len() != self.spectrum_len() {
            return Err(FeatureError::DimensionMismatch {
                context: "real IFFT input",
                expected: self.spectrum_len(),
                actual: spectrum.len(),
            });
        }
        self.check_len("real IFFT output", output.len())?;

        spectrum[0].im = 0.0;
        if self.len % 2 == 0 {
            let last = spectrum.len() - 1;
            spectrum[last].im = 0.0;
        }
        self.real_inverse.process_with_scratch(spectrum, output, scratch)?;

        let scale = 1.0 / self.len as f64;
        for sample in output.iter_mut() {
            *sample *= scale;
        }
        Ok(())
    }

    pub fn forward_scratch(&self) -> Vec<Complex64> {
        self.real_forward.make_scratch_vec()
    }

    pub fn inverse_scratch(&self) -> Vec<Complex64> {
        self.real_inverse.make_scratch_vec()
    }

    fn check_len(&self, context: &'static str, actual: usize) -> Result<()> {
        if actual != self.len {
            return Err(FeatureError::DimensionMismatch {
                context,
                expected: self.len,
                actual,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for FftEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftEngine").field("len", &self.len).finish()
    }
}
