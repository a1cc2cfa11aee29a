//! # Sample Acquisition
//!
//! Pulls one fixed-length block of samples from a non-blocking source.
//! The source signals availability by returning a frame; the acquirer
//! spin-polls until the block is full or its deadline passes.

use std::f32::consts::PI;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::TunerConfig;
use crate::error::{Result, TunerError};
use crate::fft::check_length;

/// One left/right sample pair from the codec, full scale = 1.0.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StereoFrame {
    pub left: f32,
    pub right: f32,
}

impl StereoFrame {
    pub fn mono(sample: f32) -> Self {
        Self { left: sample, right: sample }
    }
}

/// Which part of a stereo frame is analysed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputChannel {
    Left,
    #[default]
    Right,
    /// Average of both channels.
    Mix,
}

impl InputChannel {
    pub fn pick(self, frame: StereoFrame) -> f32 {
        match self {
            InputChannel::Left => frame.left,
            InputChannel::Right => frame.right,
            InputChannel::Mix => 0.5 * (frame.left + frame.right),
        }
    }
}

/// A non-blocking audio sample source.
pub trait SampleSource {
    /// Returns the next frame, or `None` if nothing is available right now.
    fn try_read_samples(&mut self) -> Option<StereoFrame>;

    /// Discards anything buffered so a recording starts with fresh audio.
    fn clear(&mut self) {}

    /// Native sample rate, when the source knows it.
    fn sample_rate(&self) -> Option<u32> {
        None
    }
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn try_read_samples(&mut self) -> Option<StereoFrame> {
        (**self).try_read_samples()
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn sample_rate(&self) -> Option<u32> {
        (**self).sample_rate()
    }
}

/// Collects fixed-length blocks from a [`SampleSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct SampleAcquirer {
    len: usize,
    channel: InputChannel,
    timeout: Duration,
}

impl SampleAcquirer {
    /// # Errors
    /// * [`TunerError::InvalidLength`] if `len` is not a non-zero power of two
    pub fn new(len: usize, channel: InputChannel, timeout: Duration) -> Result<Self> {
        check_length(len, len)?;
        Ok(Self { len, channel, timeout })
    }

    pub fn from_config(config: &TunerConfig) -> Result<Self> {
        Self::new(config.buffer_len, config.channel, config.acquisition_timeout())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Polls `source` until a full block is collected.
    ///
    /// # Errors
    /// * [`TunerError::AcquisitionTimeout`] if the block is not complete
    ///   before the timeout; the partial block is discarded
    pub fn acquire<S: SampleSource + ?Sized>(&self, source: &mut S) -> Result<Vec<f32>> {
        let started = Instant::now();
        let deadline = started + self.timeout;
        let mut samples = Vec::with_capacity(self.len);

        while samples.len() < self.len {
            match source.try_read_samples() {
                Some(frame) => samples.push(self.channel.pick(frame)),
                None => {
                    if Instant::now() >= deadline {
                        warn!(
                            collected = samples.len(),
                            required = self.len,
                            "sample source stalled"
                        );
                        return Err(TunerError::AcquisitionTimeout {
                            collected: samples.len(),
                            required: self.len,
                        });
                    }
                    std::thread::yield_now();
                }
            }
        }

        debug!(
            samples = samples.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "block acquired"
        );
        Ok(samples)
    }
}

/// Replays a fixed list of frames once, then reports nothing available.
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    frames: Vec<StereoFrame>,
    position: usize,
}

impl VecSource {
    pub fn new(frames: Vec<StereoFrame>) -> Self {
        Self { frames, position: 0 }
    }

    /// Same sample on both channels.
    pub fn from_mono(samples: &[f32]) -> Self {
        Self::new(samples.iter().copied().map(StereoFrame::mono).collect())
    }

    pub fn remaining(&self) -> usize {
        self.frames.len() - self.position
    }
}

impl SampleSource for VecSource {
    fn try_read_samples(&mut self) -> Option<StereoFrame> {
        let frame = self.frames.get(self.position).copied()?;
        self.position += 1;
        Some(frame)
    }
}

/// Synthesizes a sinusoid on both channels, standing in for a plucked string.
#[derive(Debug, Clone)]
pub struct ToneSource {
    frequency: f32,
    sample_rate: u32,
    amplitude: f32,
    dc_offset: f32,
    phase: f32,
    limit: Option<usize>,
    produced: usize,
}

impl ToneSource {
    pub fn new(frequency: f32, sample_rate: u32) -> Self {
        Self {
            frequency,
            sample_rate,
            amplitude: 0.5,
            dc_offset: 0.0,
            phase: 0.0,
            limit: None,
            produced: 0,
        }
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn with_dc_offset(mut self, dc_offset: f32) -> Self {
        self.dc_offset = dc_offset;
        self
    }

    /// Stops producing after `frames` frames, simulating a stalled codec.
    pub fn with_limit(mut self, frames: usize) -> Self {
        self.limit = Some(frames);
        self
    }

}

impl SampleSource for ToneSource {
    fn try_read_samples(&mut self) -> Option<StereoFrame> {
        if self.limit.is_some_and(|limit| self.produced >= limit) {
            return None;
        }
        let sample = self.dc_offset + self.amplitude * self.phase.sin();
        let step = 2.0 * PI * self.frequency / self.sample_rate as f32;
        self.phase = (self.phase + step) % (2.0 * PI);
        self.produced += 1;
        Some(StereoFrame::mono(sample))
    }

    fn sample_rate(&self) -> Option<u32> {
        Some(self.sample_rate)
    }
}
