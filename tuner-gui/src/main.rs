//! # String Tuner - Guitar Tuning GUI
//!
//! This module contains the main GUI application for the string tuner.
//! It lets the player pick a string, record a pluck and read the tuning
//! feedback.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application with dark theme
//! - **Tuner Thread**: Owns the controller and the audio source
//! - **Communication**: Events go out and display updates come back over
//!   crossbeam channels, so a recording never freezes the window
//! - **Updates**: 60 FPS polling of display updates via subscription

mod ui;
mod widgets;

use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossbeam_channel::Receiver;
use iced::keyboard::{self, key};
use iced::{Element, Subscription, Task, Theme};
use string_tuner_core::audio::CpalSampleSource;
use string_tuner_core::{
    BandSpectrum, ChannelDisplay, ChannelEventSource, Controller, DisplaySink, DisplayUpdate,
    EventSender, GuitarString, SampleSource, ToneSource, TunerConfig, TunerEvent, TuningResult,
    event_channel,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use ui::main_display::create_main_view;

/// Command line options.
#[derive(Parser, Debug)]
#[command(name = "string-tuner", about = "Guitar string tuner")]
struct Args {
    /// JSON config file; missing fields use defaults
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Simulate a string sounding at this frequency instead of using the microphone
    #[arg(long, value_name = "HZ")]
    simulate: Option<f32>,

    /// Write the default config to PATH and exit
    #[arg(long, value_name = "PATH")]
    write_default_config: Option<PathBuf>,
}

/// Where the tuner thread gets its samples from.
#[derive(Debug, Clone, Copy)]
enum InputKind {
    Microphone,
    Simulated(f32),
}

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if let Some(path) = &args.write_default_config {
        TunerConfig::default()
            .save(path)
            .with_context(|| format!("writing default config to {}", path.display()))?;
        info!(path = %path.display(), "default config written");
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => TunerConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => TunerConfig::default(),
    };
    config.validate()?;

    let input = match args.simulate {
        Some(hz) => InputKind::Simulated(hz),
        None => InputKind::Microphone,
    };

    info!(?input, "starting string tuner");
    iced::application("String Tuner", TunerApp::update, TunerApp::view)
        .subscription(TunerApp::subscription)
        .theme(TunerApp::theme)
        .run_with(move || (TunerApp::new(config, input), Task::none()))?;
    info!("application finished");
    Ok(())
}

/// Application message types for the Iced GUI framework.
#[derive(Debug, Clone)]
pub enum Message {
    Previous, // Select the previous string
    Next,     // Select the next string
    Record,   // Record and evaluate the selected string
    Tick,     // Timer tick for polling display updates
}

/// Everything the view needs, mirrored from the tuner thread.
#[derive(Debug, Clone)]
pub struct DisplayData {
    pub worker_active: bool,
    pub input_label: String,
    pub selected: GuitarString,
    pub status: String,
    pub last_result: Option<TuningResult>,
    /// The most recent recording found no pitch.
    pub no_pitch: bool,
    pub spectrum: BandSpectrum,
}

impl DisplayData {
    fn apply(&mut self, update: DisplayUpdate) {
        match update {
            DisplayUpdate::Selection(string) => {
                self.selected = string;
                // Feedback for another string no longer applies.
                self.last_result = None;
                self.no_pitch = false;
            }
            DisplayUpdate::Result(result) => {
                self.status = result.instruction().to_string();
                self.last_result = Some(result);
                self.no_pitch = false;
            }
            DisplayUpdate::NoPitch(_) => {
                self.status = "No pitch detected".to_string();
                self.last_result = None;
                self.no_pitch = true;
            }
            DisplayUpdate::Status(text) => self.status = text,
            DisplayUpdate::Spectrum(spectrum) => self.spectrum = spectrum,
        }
    }
}

/// Main application state.
struct TunerApp {
    events: EventSender,
    updates: Receiver<DisplayUpdate>,
    worker: Option<JoinHandle<()>>,
    display_data: DisplayData,
}

impl TunerApp {
    /// Spawns the tuner thread and wires both channels to it.
    fn new(config: TunerConfig, input: InputKind) -> Self {
        let (events, event_source) = event_channel();
        let (display, updates) = ChannelDisplay::new();
        let worker = spawn_tuner_thread(config, input, event_source, display);

        let input_label = match input {
            InputKind::Microphone => "Microphone".to_string(),
            InputKind::Simulated(hz) => format!("Simulated {:.2} Hz", hz),
        };

        Self {
            events,
            updates,
            worker: Some(worker),
            display_data: DisplayData {
                worker_active: true,
                input_label,
                selected: GuitarString::default(),
                status: "Starting...".to_string(),
                last_result: None,
                no_pitch: false,
                spectrum: BandSpectrum::default(),
            },
        }
    }

    fn update(&mut self, message: Message) {
        let event = match message {
            Message::Previous => TunerEvent::Previous,
            Message::Next => TunerEvent::Next,
            Message::Record => TunerEvent::RecordAndEvaluate,
            Message::Tick => {
                for update in self.updates.try_iter() {
                    self.display_data.apply(update);
                }
                if self.worker.as_ref().is_some_and(|w| w.is_finished()) {
                    if let Some(handle) = self.worker.take() {
                        if handle.join().is_err() {
                            error!("tuner thread panicked");
                        }
                    }
                    self.display_data.worker_active = false;
                }
                return;
            }
        };

        if !self.events.send(event) {
            warn!(?event, "tuner thread is gone, event dropped");
        }
    }

    fn view(&self) -> Element<'_, Message> {
        create_main_view(&self.display_data)
    }

    /// Polls display updates every 16ms and maps arrow keys and space to
    /// the three buttons.
    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            iced::time::every(Duration::from_millis(16)).map(|_| Message::Tick),
            keyboard::on_key_press(key_to_message),
        ])
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn key_to_message(key: keyboard::Key, _modifiers: keyboard::Modifiers) -> Option<Message> {
    match key.as_ref() {
        keyboard::Key::Named(key::Named::ArrowLeft) => Some(Message::Previous),
        keyboard::Key::Named(key::Named::ArrowRight) => Some(Message::Next),
        keyboard::Key::Named(key::Named::Space) => Some(Message::Record),
        _ => None,
    }
}

/// Starts the thread that owns the audio source and the controller.
///
/// The audio stream is opened on this thread because it cannot move
/// between threads on every platform. The thread ends when the GUI drops
/// its event sender.
fn spawn_tuner_thread(
    config: TunerConfig,
    input: InputKind,
    mut event_source: ChannelEventSource,
    display: ChannelDisplay,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut status = display.clone();

        let (source, config): (Box<dyn SampleSource>, TunerConfig) = match input {
            InputKind::Simulated(hz) => {
                (Box::new(ToneSource::new(hz, config.sample_rate)), config)
            }
            InputKind::Microphone => match CpalSampleSource::open_default(config.sample_rate) {
                Ok(source) => {
                    let rate = source.sample_rate().unwrap_or(config.sample_rate);
                    if rate != config.sample_rate {
                        info!(
                            requested = config.sample_rate,
                            actual = rate,
                            "analysing at device rate"
                        );
                    }
                    (Box::new(source), config.with_sample_rate(rate))
                }
                Err(e) => {
                    error!(%e, "failed to start audio capture");
                    status.show_status(&format!("Audio error: {}", e));
                    return;
                }
            },
        };

        let mut controller = match Controller::new(config, source, display) {
            Ok(controller) => controller,
            Err(e) => {
                error!(%e, "failed to start tuner");
                status.show_status(&format!("Tuner error: {}", e));
                return;
            }
        };
        status.show_status("Ready");

        if let Err(e) = controller.run(&mut event_source) {
            error!(%e, "tuner loop stopped");
            status.show_status(&format!("Tuner stopped: {}", e));
        }
        info!("tuner thread finished");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use string_tuner_core::tuning;

    fn blank() -> DisplayData {
        DisplayData {
            worker_active: true,
            input_label: String::new(),
            selected: GuitarString::default(),
            status: String::new(),
            last_result: None,
            no_pitch: false,
            spectrum: BandSpectrum::default(),
        }
    }

    #[test]
    fn result_then_selection_clears_feedback() {
        let mut data = blank();
        let result = tuning::evaluate(GuitarString::D, 120.0, 146.83);
        data.apply(DisplayUpdate::Result(result));
        assert_eq!(data.status, "Tune up");
        assert_eq!(data.last_result, Some(result));

        data.apply(DisplayUpdate::Selection(GuitarString::A));
        assert_eq!(data.selected, GuitarString::A);
        assert!(data.last_result.is_none());
    }

    #[test]
    fn no_pitch_replaces_previous_result() {
        let mut data = blank();
        data.apply(DisplayUpdate::Result(tuning::evaluate(GuitarString::D, 146.0, 146.83)));
        data.apply(DisplayUpdate::NoPitch(GuitarString::D));
        assert!(data.no_pitch);
        assert!(data.last_result.is_none());
        assert_eq!(data.status, "No pitch detected");
    }

    #[test]
    fn arrow_keys_and_space_map_to_buttons() {
        let none = keyboard::Modifiers::empty();
        assert!(matches!(
            key_to_message(keyboard::Key::Named(key::Named::ArrowLeft), none),
            Some(Message::Previous)
        ));
        assert!(matches!(
            key_to_message(keyboard::Key::Named(key::Named::Space), none),
            Some(Message::Record)
        ));
        assert!(key_to_message(keyboard::Key::Character("x".into()), none).is_none());
    }
}
