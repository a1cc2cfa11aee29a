//! # Fast Fourier Transform (FFT) Module
//!
//! This module provides the fixed-size, in-place, iterative radix-2
//! decimation-in-time FFT used to turn one recorded block into a spectrum.
//!
//! ## Features
//! - Bit-reversal permutation driven by a running target index
//! - Butterfly stages with one twiddle factor per group
//! - DC offset removal for raw codec samples
//! - Magnitude extraction for the lower half of the spectrum
//!
//! The transform works on split real/imaginary slices so a block can be
//! filled straight from the acquirer without an intermediate complex buffer.

use std::f64::consts::PI;

use crate::error::{Result, TunerError};

/// One analysis block: real samples plus a parallel imaginary part.
///
/// Created per recording cycle, transformed in place, then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    re: Vec<f32>,
    im: Vec<f32>,
}

impl SampleBuffer {
    /// Builds a buffer from real samples with a zeroed imaginary part.
    ///
    /// # Errors
    /// * [`TunerError::InvalidLength`] if the length is zero or not a power of two
    pub fn from_real(samples: &[f32]) -> Result<Self> {
        check_length(samples.len(), samples.len())?;
        Ok(Self {
            re: samples.to_vec(),
            im: vec![0.0; samples.len()],
        })
    }

    pub fn len(&self) -> usize {
        self.re.len()
    }

    pub fn is_empty(&self) -> bool {
        self.re.is_empty()
    }

    pub fn re(&self) -> &[f32] {
        &self.re
    }

    pub fn im(&self) -> &[f32] {
        &self.im
    }

    /// Centers the real part around zero.
    pub fn remove_dc_offset(&mut self) {
        remove_dc_offset(&mut self.re);
    }

    /// Runs the forward transform in place.
    pub fn transform(&mut self) -> Result<()> {
        fft_in_place(&mut self.re, &mut self.im)
    }

    /// Magnitudes `sqrt(re² + im²)` of bins `0..N/2`.
    pub fn magnitudes(&self) -> Vec<f32> {
        spectrum_to_magnitudes(&self.re, &self.im)
    }
}

/// Validates a transform length.
///
/// The block must be non-empty, a power of two, and both halves must agree.
pub fn check_length(re_len: usize, im_len: usize) -> Result<()> {
    if re_len != im_len {
        return Err(TunerError::InvalidLength(format!(
            "real part has {} samples but imaginary part has {}",
            re_len, im_len
        )));
    }
    if !re_len.is_power_of_two() {
        return Err(TunerError::InvalidLength(format!(
            "{} is not a non-zero power of two",
            re_len
        )));
    }
    Ok(())
}

/// Reorders the block into bit-reversed index order.
///
/// The reversed index is never computed directly. A running `target` is
/// advanced after each position by clearing set bits from the top of a
/// shrinking mask until a clear bit is found, then setting that bit. Applying
/// the permutation twice restores the original order.
pub fn bit_reverse_permute(re: &mut [f32], im: &mut [f32]) -> Result<()> {
    check_length(re.len(), im.len())?;
    let n = re.len();

    let mut target = 0usize;
    for position in 0..n {
        if target > position {
            re.swap(target, position);
            im.swap(target, position);
        }

        let mut mask = n;
        loop {
            mask >>= 1;
            if target & mask == 0 {
                break;
            }
            target &= !mask;
        }
        target |= mask;
    }
    Ok(())
}

/// Runs the butterfly stages over a block that is already bit-reversed.
///
/// For every `step` (1, 2, 4, ... < N) and every `group` below it, the
/// twiddle `(cos θ, sin θ)` with `θ = -π·group/step` is computed once and
/// applied to each pair `group, group + 2·step, ...`:
/// `match' = pair - w·match`, `pair' = pair + w·match`.
pub fn butterflies(re: &mut [f32], im: &mut [f32]) -> Result<()> {
    check_length(re.len(), im.len())?;
    let n = re.len();

    let mut step = 1usize;
    while step < n {
        let jump = step << 1;
        for group in 0..step {
            // Angles in f64 so large blocks keep accurate twiddles.
            let angle = -PI * group as f64 / step as f64;
            let (sin, cos) = angle.sin_cos();
            let (twiddle_re, twiddle_im) = (cos as f32, sin as f32);

            for pair in (group..n).step_by(jump) {
                let matched = pair + step;
                let product_re = twiddle_re * re[matched] - twiddle_im * im[matched];
                let product_im = twiddle_im * re[matched] + twiddle_re * im[matched];
                re[matched] = re[pair] - product_re;
                im[matched] = im[pair] - product_im;
                re[pair] += product_re;
                im[pair] += product_im;
            }
        }
        step = jump;
    }
    Ok(())
}

/// Performs the forward FFT in place: permutation followed by butterflies.
///
/// # Errors
/// * [`TunerError::InvalidLength`] before touching the data if the length is
///   not a non-zero power of two or the halves differ
pub fn fft_in_place(re: &mut [f32], im: &mut [f32]) -> Result<()> {
    check_length(re.len(), im.len())?;
    bit_reverse_permute(re, im)?;
    butterflies(re, im)
}

/// Removes the DC offset from a signal by making its average value zero.
///
/// Raw codec samples sit on a constant offset that would otherwise put a
/// large component at 0 Hz.
pub fn remove_dc_offset(signal: &mut [f32]) {
    let len = signal.len();
    if len == 0 { return; }
    let avg = signal.iter().sum::<f32>() / len as f32;
    if avg.abs() > 1e-6 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Calculates magnitudes for the lower half of a transformed block.
///
/// Only bins below the Nyquist frequency carry independent information for
/// real input, so the upper half is skipped.
pub fn spectrum_to_magnitudes(re: &[f32], im: &[f32]) -> Vec<f32> {
    re.iter()
        .zip(im)
        .take(re.len() / 2)
        .map(|(r, i)| (r * r + i * i).sqrt())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustfft::{FftPlanner, num_complex::Complex};

    const TOLERANCE: f64 = 1e-3;

    /// O(N²) reference transform in f64.
    fn reference_dft(input: &[f32]) -> Vec<(f64, f64)> {
        let n = input.len();
        (0..n)
            .map(|k| {
                input.iter().enumerate().fold((0.0, 0.0), |(acc_re, acc_im), (t, &x)| {
                    let angle = -2.0 * PI * (k * t) as f64 / n as f64;
                    (acc_re + x as f64 * angle.cos(), acc_im + x as f64 * angle.sin())
                })
            })
            .collect()
    }

    fn assert_matches_reference(input: &[f32]) {
        let mut buffer = SampleBuffer::from_real(input).unwrap();
        buffer.transform().unwrap();
        let expected = reference_dft(input);

        for (k, (want_re, want_im)) in expected.iter().enumerate() {
            let got_re = buffer.re()[k] as f64;
            let got_im = buffer.im()[k] as f64;
            assert!(
                (got_re - want_re).abs() < TOLERANCE && (got_im - want_im).abs() < TOLERANCE,
                "bin {} of N={}: got ({}, {}), expected ({}, {})",
                k, input.len(), got_re, got_im, want_re, want_im
            );
        }
    }

    #[test]
    fn permutation_matches_known_order_for_eight() {
        let mut re: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let mut im = vec![0.0; 8];
        bit_reverse_permute(&mut re, &mut im).unwrap();
        assert_eq!(re, vec![0.0, 4.0, 2.0, 6.0, 1.0, 5.0, 3.0, 7.0]);
    }

    #[test]
    fn permutation_is_an_involution() {
        for n in [8usize, 16, 256] {
            let original_re: Vec<f32> = (0..n).map(|i| i as f32 * 0.5 - 3.0).collect();
            let original_im: Vec<f32> = (0..n).map(|i| (n - i) as f32).collect();
            let mut re = original_re.clone();
            let mut im = original_im.clone();

            bit_reverse_permute(&mut re, &mut im).unwrap();
            assert_ne!(re, original_re, "N={} should actually reorder", n);
            bit_reverse_permute(&mut re, &mut im).unwrap();

            assert_eq!(re, original_re);
            assert_eq!(im, original_im);
        }
    }

    #[test]
    fn impulse_matches_reference() {
        for n in [16usize, 64] {
            let mut input = vec![0.0; n];
            input[0] = 1.0;
            assert_matches_reference(&input);

            let mut shifted = vec![0.0; n];
            shifted[3] = 1.0;
            assert_matches_reference(&shifted);
        }
    }

    #[test]
    fn constant_matches_reference() {
        for n in [16usize, 64] {
            assert_matches_reference(&vec![0.75; n]);
        }
    }

    #[test]
    fn sinusoid_matches_reference() {
        for n in [16usize, 64] {
            let input: Vec<f32> = (0..n)
                .map(|t| (2.0 * PI * 3.3 * t as f64 / n as f64).sin() as f32)
                .collect();
            assert_matches_reference(&input);
        }
    }

    #[test]
    fn agrees_with_rustfft_on_larger_block() {
        let n = 1024;
        let input: Vec<f32> = (0..n)
            .map(|t| {
                let t = t as f32;
                (t * 0.07).sin() + 0.3 * (t * 0.91).cos() + 0.05
            })
            .collect();

        let mut buffer = SampleBuffer::from_real(&input).unwrap();
        buffer.transform().unwrap();

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n);
        let mut reference: Vec<Complex<f32>> =
            input.iter().map(|&re| Complex { re, im: 0.0 }).collect();
        fft.process(&mut reference);

        for (k, c) in reference.iter().enumerate() {
            assert!((buffer.re()[k] - c.re).abs() < 1e-2, "re mismatch at bin {}", k);
            assert!((buffer.im()[k] - c.im).abs() < 1e-2, "im mismatch at bin {}", k);
        }
    }

    #[test]
    fn single_sample_is_identity() {
        let mut re = vec![2.5];
        let mut im = vec![0.0];
        fft_in_place(&mut re, &mut im).unwrap();
        assert_eq!(re, vec![2.5]);
        assert_eq!(im, vec![0.0]);
    }

    #[test]
    fn rejects_bad_lengths_before_work() {
        assert!(matches!(SampleBuffer::from_real(&[]), Err(TunerError::InvalidLength(_))));
        assert!(matches!(
            SampleBuffer::from_real(&[1.0; 12]),
            Err(TunerError::InvalidLength(_))
        ));

        let mut re = vec![1.0, 2.0, 3.0, 4.0];
        let mut im = vec![0.0; 2];
        assert!(fft_in_place(&mut re, &mut im).is_err());
        assert_eq!(re, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn dc_offset_is_removed() {
        let mut signal = vec![5.0, 7.0, 5.0, 7.0];
        remove_dc_offset(&mut signal);
        assert_eq!(signal, vec![-1.0, 1.0, -1.0, 1.0]);
    }

    #[test]
    fn magnitudes_cover_lower_half() {
        let mut buffer = SampleBuffer::from_real(&[1.0; 8]).unwrap();
        buffer.transform().unwrap();
        let mags = buffer.magnitudes();
        assert_eq!(mags.len(), 4);
        assert!((mags[0] - 8.0).abs() < 1e-5);
        assert!(mags[1..].iter().all(|m| m.abs() < 1e-5));
    }
}
