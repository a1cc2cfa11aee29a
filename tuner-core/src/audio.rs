//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform Audio Library)
//! and exposes it as a non-blocking [`SampleSource`].
//!
//! ## Features
//! - Automatic audio device selection
//! - Mono or multi-channel f32 input, folded into stereo frames
//! - Bounded hand-off from the audio callback (drops when full)
//! - Stale audio discarded before each recording

use std::collections::VecDeque;

use anyhow::{Result, anyhow};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use tracing::{error, info};

use crate::acquisition::{SampleSource, StereoFrame};

/// Callback chunks buffered between the audio thread and the acquirer.
const CHUNK_QUEUE_DEPTH: usize = 512;

/// Live input from the default audio device.
///
/// The stream stops when this value is dropped. It is not `Send` on every
/// platform, so open it on the thread that will poll it.
pub struct CpalSampleSource {
    _stream: cpal::Stream,
    receiver: Receiver<Vec<StereoFrame>>,
    pending: VecDeque<StereoFrame>,
    sample_rate: u32,
}

impl CpalSampleSource {
    /// Starts audio capture from the default input device.
    ///
    /// The stream runs at the supported rate closest to `target_rate`;
    /// callers must analyse at [`SampleSource::sample_rate`], not at the
    /// rate they asked for.
    ///
    /// # Returns
    /// * `Ok(source)` - capture is running
    /// * `Err(e)` - no device, no f32 format, or the stream failed to start
    pub fn open_default(target_rate: u32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host.default_input_device()
            .ok_or_else(|| anyhow!("No input device available"))?;

        let device_name = device.name()?;
        info!(device = %device_name, "using audio input device");

        let configs = device.supported_input_configs()?.collect::<Vec<_>>();
        let supported_config = find_supported_config(configs, target_rate)
            .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

        let rate = target_rate.clamp(
            supported_config.min_sample_rate().0,
            supported_config.max_sample_rate().0,
        );
        let config = supported_config.with_sample_rate(cpal::SampleRate(rate));
        let channels = config.channels() as usize;
        let sample_rate = config.sample_rate().0;
        let config: cpal::StreamConfig = config.into();

        info!(sample_rate, channels, "selected input format");

        let (sender, receiver) = crossbeam_channel::bounded(CHUNK_QUEUE_DEPTH);
        let err_fn = |err: cpal::StreamError| error!(%err, "audio stream error");

        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                forward_chunk(&sender, data, channels);
            },
            err_fn,
            None,
        )?;

        stream.play()?;

        Ok(Self {
            _stream: stream,
            receiver,
            pending: VecDeque::new(),
            sample_rate,
        })
    }
}

impl SampleSource for CpalSampleSource {
    fn try_read_samples(&mut self) -> Option<StereoFrame> {
        if self.pending.is_empty() {
            if let Ok(chunk) = self.receiver.try_recv() {
                self.pending.extend(chunk);
            }
        }
        self.pending.pop_front()
    }

    fn clear(&mut self) {
        self.pending.clear();
        while self.receiver.try_recv().is_ok() {}
    }

    fn sample_rate(&self) -> Option<u32> {
        Some(self.sample_rate)
    }
}

/// Folds one interleaved callback buffer into stereo frames and hands it
/// off, dropping it if the acquirer has fallen behind.
fn forward_chunk(sender: &Sender<Vec<StereoFrame>>, data: &[f32], channels: usize) {
    if channels == 0 {
        return;
    }
    let frames: Vec<StereoFrame> = data
        .chunks_exact(channels)
        .map(|frame| StereoFrame {
            left: frame[0],
            right: frame.get(1).copied().unwrap_or(frame[0]),
        })
        .collect();
    let _ = sender.try_send(frames);
}

/// Finds the best supported f32 input configuration for the target rate.
///
/// Prefers configurations with the fewest channels (at least one), then the
/// range closest to `target_rate`.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() >= 1 && c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min = c.min_sample_rate().0;
            let max = c.max_sample_rate().0;
            let distance = if target_rate < min {
                min - target_rate
            } else {
                target_rate.saturating_sub(max)
            };
            (c.channels(), distance)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_stereo_becomes_frames() {
        let (tx, rx) = crossbeam_channel::bounded(4);
        forward_chunk(&tx, &[0.1, 0.2, 0.3, 0.4, 0.5], 2);
        let frames = rx.try_recv().unwrap();
        assert_eq!(
            frames,
            vec![
                StereoFrame { left: 0.1, right: 0.2 },
                StereoFrame { left: 0.3, right: 0.4 },
            ]
        );
    }

    #[test]
    fn mono_is_duplicated_and_full_queue_drops() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        forward_chunk(&tx, &[0.7], 1);
        forward_chunk(&tx, &[0.9], 1);
        assert_eq!(rx.try_recv().unwrap(), vec![StereoFrame::mono(0.7)]);
        assert!(rx.try_recv().is_err());
    }
}
