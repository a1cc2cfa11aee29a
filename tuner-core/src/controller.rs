//! # Controller
//!
//! Owns the tuner state and sequences everything else. Input events are
//! handled in two stages: [`Controller::handle_event`] only updates the
//! string selection or queues a recording request, and
//! [`Controller::process_pending`] later runs one queued request through
//! acquisition and analysis. [`Controller::run`] alternates the two from a
//! single thread, so event handling stays responsive and a stalled recording
//! ends in a timeout instead of a hang.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::acquisition::{SampleAcquirer, SampleSource};
use crate::analysis::{AnalysisOutcome, Analyzer};
use crate::config::TunerConfig;
use crate::error::{Result, TunerError};
use crate::hal::{DisplaySink, EventSource, TunerEvent};
use crate::strings::{GuitarString, StringSelection};

/// How long the idle loop waits for an event before checking again.
const IDLE_WAIT: Duration = Duration::from_millis(50);

/// Mutable tuner state, owned by one controller.
#[derive(Debug, Clone, Default)]
pub struct TunerContext {
    selection: StringSelection,
    last_outcome: Option<AnalysisOutcome>,
    /// Strings selected at the time each recording was requested.
    pending: VecDeque<GuitarString>,
}

impl TunerContext {
    pub fn selection(&self) -> &StringSelection {
        &self.selection
    }

    pub fn last_outcome(&self) -> Option<&AnalysisOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }
}

/// Event-driven tuner controller.
pub struct Controller<S: SampleSource, D: DisplaySink> {
    config: TunerConfig,
    acquirer: SampleAcquirer,
    analyzer: Analyzer,
    source: S,
    display: D,
    context: TunerContext,
}

impl<S: SampleSource, D: DisplaySink> Controller<S, D> {
    /// Validates the config and shows the initial string selection.
    ///
    /// # Errors
    /// * any [`TunerConfig::validate`] failure
    /// * [`TunerError::InvalidConfig`] if the source reports a sample rate
    ///   different from the configured one
    pub fn new(config: TunerConfig, source: S, mut display: D) -> Result<Self> {
        config.validate()?;
        if let Some(native) = source.sample_rate() {
            if native != config.sample_rate {
                return Err(TunerError::InvalidConfig(format!(
                    "source runs at {} Hz but the analysis expects {} Hz",
                    native, config.sample_rate
                )));
            }
        }

        let acquirer = SampleAcquirer::from_config(&config)?;
        let analyzer = Analyzer::from_config(&config)?;
        let context = TunerContext::default();
        display.show_string_selection(context.selection.current());

        info!(
            sample_rate = config.sample_rate,
            buffer_len = config.buffer_len,
            bin_hz = config.bin_width_hz(),
            "controller ready"
        );
        Ok(Self { config, acquirer, analyzer, source, display, context })
    }

    pub fn context(&self) -> &TunerContext {
        &self.context
    }

    pub fn config(&self) -> &TunerConfig {
        &self.config
    }

    /// First stage: reacts to an event without doing any recording work.
    pub fn handle_event(&mut self, event: TunerEvent) {
        match event {
            TunerEvent::Next => {
                let current = self.context.selection.select_next();
                info!(
                    string = %current,
                    expected_hz = current.expected_frequency(),
                    "selected next string"
                );
                self.display.show_string_selection(current);
            }
            TunerEvent::Previous => {
                let current = self.context.selection.select_previous();
                info!(
                    string = %current,
                    expected_hz = current.expected_frequency(),
                    "selected previous string"
                );
                self.display.show_string_selection(current);
            }
            TunerEvent::RecordAndEvaluate => {
                let current = self.context.selection.current();
                self.context.pending.push_back(current);
                info!(
                    string = %current,
                    queued = self.context.pending.len(),
                    "recording requested"
                );
                self.display.show_status("Recording queued");
            }
        }
    }

    /// Second stage: runs the oldest queued recording request, if any.
    ///
    /// # Returns
    /// * `None` - nothing was queued
    /// * `Some(Ok(outcome))` - the request completed, with or without a pitch
    /// * `Some(Err(e))` - the request failed (e.g. acquisition timed out)
    pub fn process_pending(&mut self) -> Option<Result<AnalysisOutcome>> {
        let string = self.context.pending.pop_front()?;
        let result = self.record_and_evaluate(string);
        if let Err(err) = &result {
            error!(%err, string = %string, "recording failed");
            self.display.show_status(&failure_status(err));
        }
        Some(result)
    }

    /// Records one block and evaluates it against `string`.
    pub fn record_and_evaluate(&mut self, string: GuitarString) -> Result<AnalysisOutcome> {
        self.countdown();
        let samples = self.acquire_with_retries()?;
        self.display.show_status("Done recording");
        self.display.show_status("Calculating");

        let analysis = self.analyzer.analyze(&samples, string)?;
        self.display.show_spectrum(&analysis.spectrum);
        match &analysis.outcome {
            AnalysisOutcome::Tuned(result) => {
                info!(
                    string = %string,
                    measured_hz = result.measured_frequency,
                    expected_hz = result.expected_frequency,
                    delta_hz = result.delta_hz,
                    classification = ?result.classification,
                    "string evaluated"
                );
                self.display.show_tuning_result(result);
            }
            AnalysisOutcome::NoPitch { .. } => {
                info!(string = %string, "no pitch detected");
                self.display.show_no_pitch(string);
            }
        }

        self.context.last_outcome = Some(analysis.outcome);
        Ok(analysis.outcome)
    }

    /// Main control loop. Returns once the event source is closed.
    pub fn run<E: EventSource + ?Sized>(&mut self, events: &mut E) -> Result<()> {
        loop {
            let wait = if self.context.pending.is_empty() { IDLE_WAIT } else { Duration::ZERO };
            match events.wait_event(wait) {
                Ok(Some(event)) => {
                    self.handle_event(event);
                    // Drain everything already delivered before recording.
                    continue;
                }
                Ok(None) => {}
                Err(TunerError::EventSourceClosed) => {
                    info!(dropped = self.context.pending.len(), "event source closed, stopping");
                    return Ok(());
                }
                Err(err) => return Err(err),
            }

            // process_pending reports failures to the display; keep serving events.
            self.process_pending();
        }
    }

    /// Shows the pre-recording countdown, pausing between steps.
    fn countdown(&mut self) {
        let interval = self.config.countdown_interval();
        if self.config.countdown_steps > 0 {
            self.display.show_status("Begin recording in...");
            pause(interval);
            for step in (1..=self.config.countdown_steps).rev() {
                self.display.show_status(&step.to_string());
                pause(interval);
            }
        }
        self.display.show_status("Recording");
    }

    /// Acquires a block, re-arming after timeouts as configured.
    fn acquire_with_retries(&mut self) -> Result<Vec<f32>> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            self.source.clear();
            match self.acquirer.acquire(&mut self.source) {
                Ok(samples) => return Ok(samples),
                Err(TunerError::AcquisitionTimeout { collected, required })
                    if attempt <= self.config.acquisition_retries =>
                {
                    warn!(attempt, collected, required, "re-arming acquisition after timeout");
                    self.display.show_status("Recording timed out, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Status line for a request that failed.
fn failure_status(err: &TunerError) -> String {
    match err {
        TunerError::AcquisitionTimeout { .. } => "Recording timed out".to_string(),
        other => format!("Recording failed: {}", other),
    }
}

fn pause(interval: Duration) {
    if !interval.is_zero() {
        std::thread::sleep(interval);
    }
}
