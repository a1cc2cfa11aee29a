//! # Pitch Detection Module
//!
//! Converts a transformed block into a single fundamental-frequency estimate
//! by picking the strongest bin inside a search band.
//!
//! ## Features
//! - Band-limited dominant-bin search (rejects DC, aliasing and hiss)
//! - True magnitude by default, legacy real-part comparison on request
//! - Explicit "no pitch" result below an amplitude floor
//! - Optional parabolic interpolation for sub-bin accuracy

use serde::{Deserialize, Serialize};

use crate::config::TunerConfig;
use crate::error::{Result, TunerError};
use crate::fft::SampleBuffer;

/// Frequency range searched for the fundamental, exclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub lo_hz: f32,
    pub hi_hz: f32,
}

impl FrequencyBand {
    /// Plausible guitar fundamentals in standard tuning, with headroom.
    pub const GUITAR: FrequencyBand = FrequencyBand { lo_hz: 50.0, hi_hz: 380.0 };

    pub fn new(lo_hz: f32, hi_hz: f32) -> Result<Self> {
        let band = Self { lo_hz, hi_hz };
        band.check()?;
        Ok(band)
    }

    fn check(&self) -> Result<()> {
        let ordered = self.lo_hz.is_finite()
            && self.hi_hz.is_finite()
            && self.lo_hz >= 0.0
            && self.lo_hz < self.hi_hz;
        if ordered {
            Ok(())
        } else {
            Err(TunerError::InvalidBand { lo_hz: self.lo_hz, hi_hz: self.hi_hz })
        }
    }

    /// Checks ordering and that the band stays at or below Nyquist.
    pub fn validate_for(&self, sample_rate: u32) -> Result<()> {
        self.check()?;
        if self.hi_hz > sample_rate as f32 / 2.0 {
            return Err(TunerError::InvalidBand { lo_hz: self.lo_hz, hi_hz: self.hi_hz });
        }
        Ok(())
    }

    /// True when `freq` lies strictly between the bounds.
    pub fn contains(&self, freq: f32) -> bool {
        freq > self.lo_hz && freq < self.hi_hz
    }
}

impl Default for FrequencyBand {
    fn default() -> Self {
        Self::GUITAR
    }
}

/// How a bin's strength is measured during the peak search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MagnitudeMode {
    /// `sqrt(re² + im²)`.
    #[default]
    Norm,
    /// Legacy behavior: compares the signed real component only. Phase
    /// rotates energy into the imaginary part, so a strong partial can lose
    /// to a weaker bin that happens to be in phase.
    RealPart,
}

/// A transient (index, magnitude) pair produced while scanning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumBin {
    pub index: usize,
    pub magnitude: f32,
}

/// In-band magnitudes of one block, for visualization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandSpectrum {
    /// Frequency of the first entry in `magnitudes`.
    pub lo_hz: f32,
    /// Spacing between entries.
    pub bin_hz: f32,
    pub magnitudes: Vec<f32>,
}

/// Band-limited dominant-bin pitch extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchExtractor {
    sample_rate: u32,
    band: FrequencyBand,
    mode: MagnitudeMode,
    min_amplitude: f32,
    refine: bool,
}

impl PitchExtractor {
    /// Default amplitude floor, in normalized units (full scale = 1.0).
    pub const DEFAULT_MIN_AMPLITUDE: f32 = 1e-4;

    /// # Errors
    /// * [`TunerError::InvalidConfig`] for a zero sample rate
    /// * [`TunerError::InvalidBand`] for an unordered band or one above Nyquist
    pub fn new(sample_rate: u32, band: FrequencyBand) -> Result<Self> {
        if sample_rate == 0 {
            return Err(TunerError::InvalidConfig("sample rate must be non-zero".into()));
        }
        band.validate_for(sample_rate)?;
        Ok(Self {
            sample_rate,
            band,
            mode: MagnitudeMode::default(),
            min_amplitude: Self::DEFAULT_MIN_AMPLITUDE,
            refine: false,
        })
    }

    pub fn from_config(config: &TunerConfig) -> Result<Self> {
        Ok(Self::new(config.sample_rate, config.band)?
            .with_mode(config.magnitude_mode)
            .with_min_amplitude(config.min_amplitude)
            .with_refinement(config.refine_peak))
    }

    pub fn with_mode(mut self, mode: MagnitudeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_min_amplitude(mut self, min_amplitude: f32) -> Self {
        self.min_amplitude = min_amplitude.max(0.0);
        self
    }

    pub fn with_refinement(mut self, refine: bool) -> Self {
        self.refine = refine;
        self
    }

    /// Frequency of bin `index` in an `n`-point transform.
    pub fn bin_frequency(&self, index: usize, n: usize) -> f32 {
        index as f32 * self.sample_rate as f32 / n as f32
    }

    /// Finds the strongest in-band bin above the amplitude floor.
    ///
    /// Ties keep the lower bin. Returns `None` when nothing in the band rises
    /// above the floor, including an all-zero block.
    pub fn find_peak(&self, buffer: &SampleBuffer) -> Option<SpectrumBin> {
        let n = buffer.len();
        let (re, im) = (buffer.re(), buffer.im());
        let floor = self.min_amplitude * n as f32 / 2.0;

        let mut best: Option<SpectrumBin> = None;
        for index in 0..n / 2 {
            if !self.band.contains(self.bin_frequency(index, n)) {
                continue;
            }
            let magnitude = match self.mode {
                MagnitudeMode::Norm => (re[index] * re[index] + im[index] * im[index]).sqrt(),
                MagnitudeMode::RealPart => re[index],
            };
            let stronger = best.map_or(true, |b| magnitude > b.magnitude);
            if magnitude > floor && stronger {
                best = Some(SpectrumBin { index, magnitude });
            }
        }
        best
    }

    /// Estimates the fundamental frequency of a transformed block.
    ///
    /// # Returns
    /// * `Some(frequency)` - centre of the winning bin, or the interpolated
    ///   peak when refinement is enabled
    /// * `None` - no pitch detected
    pub fn extract(&self, buffer: &SampleBuffer) -> Option<f32> {
        let peak = self.find_peak(buffer)?;
        let n = buffer.len();
        let coarse = self.bin_frequency(peak.index, n);
        if !self.refine {
            return Some(coarse);
        }

        let magnitudes = buffer.magnitudes();
        let bin_hz = self.bin_frequency(1, n);
        Some(refine_peak(&magnitudes, peak.index, bin_hz).unwrap_or(coarse))
    }

    /// Copies the in-band magnitudes out of a transformed block.
    pub fn band_spectrum(&self, buffer: &SampleBuffer) -> BandSpectrum {
        let n = buffer.len();
        let magnitudes = buffer.magnitudes();
        let in_band: Vec<(usize, f32)> = magnitudes
            .into_iter()
            .enumerate()
            .filter(|&(index, _)| self.band.contains(self.bin_frequency(index, n)))
            .collect();

        BandSpectrum {
            lo_hz: in_band
                .first()
                .map_or(self.band.lo_hz, |&(index, _)| self.bin_frequency(index, n)),
            bin_hz: self.bin_frequency(1, n),
            magnitudes: in_band.into_iter().map(|(_, m)| m).collect(),
        }
    }
}

/// Refines a peak bin using log-magnitude parabolic interpolation.
///
/// # Returns
/// * `Some(freq)` - interpolated frequency
/// * `None` - peak on an edge, a neighbour is silent, or the fit is flat
pub fn refine_peak(magnitudes: &[f32], peak_bin: usize, bin_hz: f32) -> Option<f32> {
    if peak_bin == 0 || peak_bin + 1 >= magnitudes.len() {
        return None;
    }

    let y1 = magnitudes[peak_bin - 1].ln();
    let y2 = magnitudes[peak_bin].ln();
    let y3 = magnitudes[peak_bin + 1].ln();
    if !y1.is_finite() || !y2.is_finite() || !y3.is_finite() {
        return None;
    }

    let denominator = 2.0 * y2 - y1 - y3;
    if denominator.abs() < 1e-6 {
        return None;
    }

    let peak_shift = (y3 - y1) / (2.0 * denominator);
    let final_freq = (peak_bin as f32 + peak_shift) * bin_hz;
    (final_freq.is_finite() && final_freq > 0.0).then_some(final_freq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn transformed_tone(freq: f32, sample_rate: u32, n: usize, amplitude: f32) -> SampleBuffer {
        let samples: Vec<f32> = (0..n)
            .map(|t| amplitude * (2.0 * PI * freq * t as f32 / sample_rate as f32).sin())
            .collect();
        let mut buffer = SampleBuffer::from_real(&samples).unwrap();
        buffer.transform().unwrap();
        buffer
    }

    #[test]
    fn finds_bin_nearest_to_tone() {
        let extractor = PitchExtractor::new(8000, FrequencyBand::GUITAR).unwrap();
        let buffer = transformed_tone(110.0, 8000, 4096, 0.5);
        let freq = extractor.extract(&buffer).unwrap();
        let bin_hz = 8000.0 / 4096.0;
        assert!((freq - 110.0).abs() <= bin_hz, "got {} Hz", freq);
    }

    #[test]
    fn ignores_energy_outside_band() {
        let extractor = PitchExtractor::new(8000, FrequencyBand::GUITAR).unwrap();
        let n = 4096;
        let samples: Vec<f32> = (0..n)
            .map(|t| {
                let t = t as f32 / 8000.0;
                // Strong 1 kHz whine plus a quieter string at 196 Hz.
                0.9 * (2.0 * PI * 1000.0 * t).sin() + 0.2 * (2.0 * PI * 196.0 * t).sin()
            })
            .collect();
        let mut buffer = SampleBuffer::from_real(&samples).unwrap();
        buffer.transform().unwrap();

        let freq = extractor.extract(&buffer).unwrap();
        assert!((freq - 196.0).abs() <= 8000.0 / n as f32);
    }

    #[test]
    fn silent_block_has_no_pitch() {
        let extractor = PitchExtractor::new(8000, FrequencyBand::GUITAR).unwrap();
        let mut buffer = SampleBuffer::from_real(&vec![0.0; 1024]).unwrap();
        buffer.transform().unwrap();
        assert_eq!(extractor.extract(&buffer), None);
    }

    #[test]
    fn quiet_tone_below_floor_has_no_pitch() {
        let extractor = PitchExtractor::new(8000, FrequencyBand::GUITAR)
            .unwrap()
            .with_min_amplitude(0.01);
        let buffer = transformed_tone(146.83, 8000, 2048, 0.001);
        assert_eq!(extractor.extract(&buffer), None);
    }

    #[test]
    fn band_is_exclusive_at_both_ends() {
        let band = FrequencyBand::new(50.0, 380.0).unwrap();
        assert!(!band.contains(50.0));
        assert!(!band.contains(380.0));
        assert!(band.contains(50.1));
        assert!(band.contains(379.9));
    }

    #[test]
    fn rejects_invalid_bands() {
        assert!(FrequencyBand::new(380.0, 50.0).is_err());
        assert!(FrequencyBand::new(f32::NAN, 50.0).is_err());
        assert!(FrequencyBand::new(-1.0, 50.0).is_err());
        assert!(PitchExtractor::new(400, FrequencyBand::GUITAR).is_err());
        assert!(PitchExtractor::new(0, FrequencyBand::GUITAR).is_err());
    }

    #[test]
    fn real_part_mode_still_finds_cosine_peak() {
        // A cosine on an exact bin puts all its energy into the real part.
        let n = 1024;
        let sample_rate = 8192;
        let bin = 20; // 160 Hz
        let samples: Vec<f32> = (0..n)
            .map(|t| (2.0 * PI * bin as f32 * t as f32 / n as f32).cos())
            .collect();
        let mut buffer = SampleBuffer::from_real(&samples).unwrap();
        buffer.transform().unwrap();

        let extractor = PitchExtractor::new(sample_rate, FrequencyBand::GUITAR)
            .unwrap()
            .with_mode(MagnitudeMode::RealPart);
        assert_eq!(extractor.extract(&buffer), Some(160.0));
    }

    #[test]
    fn refinement_lands_closer_than_bin_centre() {
        let n = 2048;
        let buffer = transformed_tone(111.3, 8000, n, 0.5);
        let coarse = PitchExtractor::new(8000, FrequencyBand::GUITAR).unwrap();
        let fine = coarse.clone().with_refinement(true);

        let coarse_err = (coarse.extract(&buffer).unwrap() - 111.3).abs();
        let fine_err = (fine.extract(&buffer).unwrap() - 111.3).abs();
        assert!(fine_err <= coarse_err, "fine {} vs coarse {}", fine_err, coarse_err);
    }

    #[test]
    fn band_spectrum_only_holds_in_band_bins() {
        let extractor = PitchExtractor::new(8000, FrequencyBand::GUITAR).unwrap();
        let buffer = transformed_tone(200.0, 8000, 1024, 0.5);
        let spectrum = extractor.band_spectrum(&buffer);

        let bin_hz = 8000.0 / 1024.0;
        assert_eq!(spectrum.bin_hz, bin_hz);
        assert!(spectrum.lo_hz > 50.0 && spectrum.lo_hz < 50.0 + bin_hz + 0.001);
        let last = spectrum.lo_hz + (spectrum.magnitudes.len() - 1) as f32 * bin_hz;
        assert!(last < 380.0);
    }

    #[test]
    fn band_between_two_bins_has_no_pitch() {
        // Bins are 7.8125 Hz apart, so (51, 52) holds none of them.
        let band = FrequencyBand::new(51.0, 52.0).unwrap();
        let extractor = PitchExtractor::new(8000, band).unwrap();
        let buffer = transformed_tone(51.5, 8000, 1024, 0.9);

        assert_eq!(extractor.extract(&buffer), None);
        let spectrum = extractor.band_spectrum(&buffer);
        assert!(spectrum.magnitudes.is_empty());
        assert_eq!(spectrum.lo_hz, band.lo_hz);
    }
}
