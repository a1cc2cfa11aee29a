//! # Analysis Pipeline
//!
//! One recorded block in, one tuning outcome out:
//! DC removal -> FFT -> band-limited peak pick -> tuning evaluation.

use tracing::debug;

use crate::config::TunerConfig;
use crate::error::{Result, TunerError};
use crate::fft::SampleBuffer;
use crate::pitch::{BandSpectrum, PitchExtractor};
use crate::strings::GuitarString;
use crate::tuning::{self, TuningResult};

/// Result of analysing one block against a string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnalysisOutcome {
    /// A pitch was found and compared with the string's target.
    Tuned(TuningResult),
    /// Nothing in the search band rose above the amplitude floor.
    NoPitch {
        string: GuitarString,
        expected_frequency: f32,
    },
}

impl AnalysisOutcome {
    pub fn string(&self) -> GuitarString {
        match self {
            AnalysisOutcome::Tuned(result) => result.string,
            AnalysisOutcome::NoPitch { string, .. } => *string,
        }
    }

    /// `None` when no pitch was detected; never a stand-in zero.
    pub fn measured_frequency(&self) -> Option<f32> {
        match self {
            AnalysisOutcome::Tuned(result) => Some(result.measured_frequency),
            AnalysisOutcome::NoPitch { .. } => None,
        }
    }

    pub fn tuning_result(&self) -> Option<&TuningResult> {
        match self {
            AnalysisOutcome::Tuned(result) => Some(result),
            AnalysisOutcome::NoPitch { .. } => None,
        }
    }
}

/// Outcome plus the in-band spectrum it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub outcome: AnalysisOutcome,
    pub spectrum: BandSpectrum,
}

/// Runs the spectral pipeline over fixed-length blocks.
#[derive(Debug, Clone)]
pub struct Analyzer {
    extractor: PitchExtractor,
    buffer_len: usize,
    remove_dc: bool,
}

impl Analyzer {
    /// # Errors
    /// Any precondition violation reported by [`TunerConfig::validate`].
    pub fn from_config(config: &TunerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            extractor: PitchExtractor::from_config(config)?,
            buffer_len: config.buffer_len,
            remove_dc: config.remove_dc,
        })
    }

    /// Analyses one block recorded while `string` was selected.
    ///
    /// # Errors
    /// * [`TunerError::InvalidLength`] if the block is not exactly the
    ///   configured length
    pub fn analyze(&self, samples: &[f32], string: GuitarString) -> Result<Analysis> {
        if samples.len() != self.buffer_len {
            return Err(TunerError::InvalidLength(format!(
                "expected a block of {} samples, got {}",
                self.buffer_len,
                samples.len()
            )));
        }

        let mut buffer = SampleBuffer::from_real(samples)?;
        if self.remove_dc {
            buffer.remove_dc_offset();
        }
        buffer.transform()?;

        let expected_frequency = string.expected_frequency();
        let outcome = match self.extractor.extract(&buffer) {
            Some(measured) => {
                AnalysisOutcome::Tuned(tuning::evaluate(string, measured, expected_frequency))
            }
            None => AnalysisOutcome::NoPitch { string, expected_frequency },
        };
        debug!(?outcome, "block analysed");

        Ok(Analysis {
            outcome,
            spectrum: self.extractor.band_spectrum(&buffer),
        })
    }
}
