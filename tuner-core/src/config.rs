//! Configuration parameters for acquisition and analysis

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::acquisition::InputChannel;
use crate::error::{Result, TunerError};
use crate::pitch::{FrequencyBand, MagnitudeMode, PitchExtractor};

/// Tuner configuration.
///
/// Sample rate and block length are shared by the acquirer and the pitch
/// extractor so bin frequencies always match what was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// Sample rate in Hz (default: 8000)
    pub sample_rate: u32,

    /// Samples per analysis block; a power of two (default: 16384)
    pub buffer_len: usize,

    /// Exclusive search band for the fundamental (default: 50-380 Hz)
    pub band: FrequencyBand,

    /// Peak strength measure (default: true magnitude)
    pub magnitude_mode: MagnitudeMode,

    /// Normalized amplitude a peak must exceed to count as a pitch
    /// (default: 1e-4, full scale = 1.0)
    pub min_amplitude: f32,

    /// Interpolate between bins around the peak (default: false)
    pub refine_peak: bool,

    /// Subtract the block mean before transforming (default: true)
    pub remove_dc: bool,

    /// Which channel of each stereo frame is analysed (default: right)
    pub channel: InputChannel,

    /// Longest wait for one full block, in milliseconds (default: 5000)
    pub acquisition_timeout_ms: u64,

    /// Extra attempts after an acquisition timeout (default: 0)
    pub acquisition_retries: u32,

    /// Countdown steps shown before recording (default: 3)
    pub countdown_steps: u32,

    /// Pause per countdown step in milliseconds; 0 skips waiting (default: 500)
    pub countdown_interval_ms: u64,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 8000,
            buffer_len: 16384,
            band: FrequencyBand::GUITAR,
            magnitude_mode: MagnitudeMode::Norm,
            min_amplitude: PitchExtractor::DEFAULT_MIN_AMPLITUDE,
            refine_peak: false,
            remove_dc: true,
            channel: InputChannel::Right,
            acquisition_timeout_ms: 5000,
            acquisition_retries: 0,
            countdown_steps: 3,
            countdown_interval_ms: 500,
        }
    }
}

impl TunerConfig {
    /// Checks every precondition the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(TunerError::InvalidConfig("sample_rate must be non-zero".into()));
        }
        if !self.buffer_len.is_power_of_two() {
            return Err(TunerError::InvalidLength(format!(
                "buffer_len {} is not a non-zero power of two",
                self.buffer_len
            )));
        }
        self.band.validate_for(self.sample_rate)?;
        if !self.min_amplitude.is_finite() || self.min_amplitude < 0.0 {
            return Err(TunerError::InvalidConfig(format!(
                "min_amplitude must be a non-negative number, got {}",
                self.min_amplitude
            )));
        }
        if self.acquisition_timeout_ms == 0 {
            return Err(TunerError::InvalidConfig("acquisition_timeout_ms must be non-zero".into()));
        }
        Ok(())
    }

    /// Same config with a different sample rate, e.g. the rate a device
    /// actually opened at.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn acquisition_timeout(&self) -> Duration {
        Duration::from_millis(self.acquisition_timeout_ms)
    }

    pub fn countdown_interval(&self) -> Duration {
        Duration::from_millis(self.countdown_interval_ms)
    }

    /// Width of one frequency bin in Hz.
    pub fn bin_width_hz(&self) -> f32 {
        self.sample_rate as f32 / self.buffer_len as f32
    }

    /// Loads and validates a config from a JSON file.
    ///
    /// Missing fields take their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut data = String::new();
        file.read_to_string(&mut data)?;
        let config: TunerConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json_string = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json_string.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_device_and_validate() {
        let config = TunerConfig::default();
        assert_eq!(config.sample_rate, 8000);
        assert_eq!(config.buffer_len, 16384);
        assert_eq!(config.band, FrequencyBand::GUITAR);
        assert!((config.bin_width_hz() - 0.48828125).abs() < 1e-9);
        config.validate().unwrap();
    }

    #[test]
    fn rejects_out_of_range_values() {
        let bad_len = TunerConfig { buffer_len: 1000, ..TunerConfig::default() };
        assert!(matches!(bad_len.validate(), Err(TunerError::InvalidLength(_))));

        let above_nyquist = TunerConfig { sample_rate: 600, ..TunerConfig::default() };
        assert!(matches!(above_nyquist.validate(), Err(TunerError::InvalidBand { .. })));

        let negative_floor = TunerConfig { min_amplitude: -1.0, ..TunerConfig::default() };
        assert!(matches!(negative_floor.validate(), Err(TunerError::InvalidConfig(_))));
    }

    #[test]
    fn round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tuner.json");
        let config = TunerConfig {
            sample_rate: 44100,
            buffer_len: 8192,
            magnitude_mode: MagnitudeMode::RealPart,
            acquisition_retries: 2,
            ..TunerConfig::default()
        };

        config.save(&path).unwrap();
        assert_eq!(TunerConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "sample_rate": 48000, "magnitude_mode": "real_part" }"#)
            .unwrap();

        let config = TunerConfig::load(&path).unwrap();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.magnitude_mode, MagnitudeMode::RealPart);
        assert_eq!(config.buffer_len, 16384);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let result = TunerConfig::load("/definitely/not/here.json");
        assert!(matches!(result, Err(TunerError::ConfigFile(_))));
    }
}
