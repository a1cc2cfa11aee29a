// tuner-core/src/lib.rs

//! The core logic for the guitar string tuner.
//! This crate is responsible for sample acquisition, the FFT, pitch
//! extraction, tuning evaluation and the string-selection controller.
//! It is completely headless and contains no GUI code; the outside world is
//! reached only through the traits in [`hal`] and [`acquisition`].

pub mod acquisition;
pub mod analysis;
pub mod audio;
pub mod config;
pub mod controller;
pub mod error;
pub mod fft;
pub mod hal;
pub mod pitch;
pub mod strings;
pub mod tuning;

pub use acquisition::{
    InputChannel, SampleAcquirer, SampleSource, StereoFrame, ToneSource, VecSource,
};
pub use analysis::{Analysis, AnalysisOutcome, Analyzer};
pub use config::TunerConfig;
pub use controller::{Controller, TunerContext};
pub use error::{Result, TunerError};
pub use hal::{
    ChannelDisplay, ChannelEventSource, DisplaySink, DisplayUpdate, EventSender, EventSource,
    TunerEvent, event_channel,
};
pub use pitch::{BandSpectrum, FrequencyBand, MagnitudeMode, PitchExtractor};
pub use strings::{GuitarString, HeadstockSide, StringSelection};
pub use tuning::{Classification, Direction, TuningResult};
