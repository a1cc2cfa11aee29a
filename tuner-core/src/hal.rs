//! # Hardware Abstraction
//!
//! The engine talks to the outside world only through these traits: an
//! [`EventSource`] for button presses, a [`DisplaySink`] for feedback and a
//! [`crate::acquisition::SampleSource`] for audio. Channel-backed
//! implementations let other threads feed events in and read display updates
//! out without sharing the controller.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::error::{Result, TunerError};
use crate::pitch::BandSpectrum;
use crate::strings::GuitarString;
use crate::tuning::TuningResult;

/// A logical input event. Each physical press yields exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunerEvent {
    Next,
    Previous,
    RecordAndEvaluate,
}

/// Delivers input events one at a time.
pub trait EventSource {
    /// Waits up to `timeout` for the next event.
    ///
    /// # Returns
    /// * `Ok(Some(event))` - an event arrived
    /// * `Ok(None)` - nothing arrived in time
    /// * `Err(TunerError::EventSourceClosed)` - no more events will come
    fn wait_event(&mut self, timeout: Duration) -> Result<Option<TunerEvent>>;
}

/// Receives feedback for the player. Implementations must not block.
pub trait DisplaySink {
    fn show_tuning_result(&mut self, result: &TuningResult);

    fn show_string_selection(&mut self, current: GuitarString);

    fn show_status(&mut self, text: &str);

    /// Called when a recording yields no pitch.
    fn show_no_pitch(&mut self, _string: GuitarString) {
        self.show_status("No pitch detected");
    }

    fn show_spectrum(&mut self, _spectrum: &BandSpectrum) {}
}

/// Creates a multi-producer event queue feeding a single controller.
pub fn event_channel() -> (EventSender, ChannelEventSource) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (EventSender { tx }, ChannelEventSource { rx })
}

/// Cloneable handle used by input threads to post events.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<TunerEvent>,
}

impl EventSender {
    /// Queues an event. Returns `false` once the controller side is gone.
    pub fn send(&self, event: TunerEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Controller side of [`event_channel`]. Closed when every sender is dropped.
#[derive(Debug)]
pub struct ChannelEventSource {
    rx: Receiver<TunerEvent>,
}

impl EventSource for ChannelEventSource {
    fn wait_event(&mut self, timeout: Duration) -> Result<Option<TunerEvent>> {
        if timeout.is_zero() {
            return match self.rx.try_recv() {
                Ok(event) => Ok(Some(event)),
                Err(TryRecvError::Empty) => Ok(None),
                Err(TryRecvError::Disconnected) => Err(TunerError::EventSourceClosed),
            };
        }
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(TunerError::EventSourceClosed),
        }
    }
}

/// A display update travelling from the controller thread to a front-end.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayUpdate {
    Result(TuningResult),
    NoPitch(GuitarString),
    Selection(GuitarString),
    Status(String),
    Spectrum(BandSpectrum),
}

/// [`DisplaySink`] that forwards every update over a channel.
///
/// Sends never block; updates are dropped once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelDisplay {
    tx: Sender<DisplayUpdate>,
}

impl ChannelDisplay {
    pub fn new() -> (Self, Receiver<DisplayUpdate>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }

    fn forward(&self, update: DisplayUpdate) {
        let _ = self.tx.send(update);
    }
}

impl DisplaySink for ChannelDisplay {
    fn show_tuning_result(&mut self, result: &TuningResult) {
        self.forward(DisplayUpdate::Result(*result));
    }

    fn show_string_selection(&mut self, current: GuitarString) {
        self.forward(DisplayUpdate::Selection(current));
    }

    fn show_status(&mut self, text: &str) {
        self.forward(DisplayUpdate::Status(text.to_string()));
    }

    fn show_no_pitch(&mut self, string: GuitarString) {
        self.forward(DisplayUpdate::NoPitch(string));
    }

    fn show_spectrum(&mut self, spectrum: &BandSpectrum) {
        self.forward(DisplayUpdate::Spectrum(spectrum.clone()));
    }
}
