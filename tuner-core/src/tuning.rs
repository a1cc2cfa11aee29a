//! # Musical Tuning Module
//!
//! This module turns a measured frequency into tuning feedback for the
//! selected string: a severity classification, a direction to turn the peg,
//! and the clamped offset used to place a marker on the display scale.
//!
//! ## Features
//! - Hertz-delta classification (Good / SlightlyOff / Off / FarOff)
//! - Directional hint (tune up / tune down)
//! - Display offset clamp kept separate from classification
//! - Cent deviation and nearest equal-tempered note for readouts

use once_cell::sync::Lazy;

use crate::strings::GuitarString;

/// Below this many Hz the string is considered in tune.
pub const GOOD_LIMIT_HZ: f32 = 8.0;
/// Below this many Hz the string is slightly off.
pub const SLIGHTLY_OFF_LIMIT_HZ: f32 = 16.0;
/// Below this many Hz the string is off; at or above it, far off.
pub const OFF_LIMIT_HZ: f32 = 50.0;
/// Half-width of the display scale in Hz.
pub const DISPLAY_RANGE_HZ: f32 = 110.0;

/// Severity of a tuning error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Good,
    SlightlyOff,
    Off,
    FarOff,
}

/// Which way the peg should be turned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    TuneUp,
    TuneDown,
    None,
}

/// Feedback for one analysis cycle. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuningResult {
    pub string: GuitarString,
    pub measured_frequency: f32,
    pub expected_frequency: f32,
    /// `measured - expected`; positive means sharp.
    pub delta_hz: f32,
    pub classification: Classification,
    pub direction: Direction,
}

impl TuningResult {
    /// Signed offset for the display scale, clamped to ±[`DISPLAY_RANGE_HZ`].
    ///
    /// Applied after classification and never feeds back into it.
    pub fn display_offset(&self) -> f32 {
        clamp_display_offset(self.delta_hz)
    }

    pub fn cents_deviation(&self) -> f32 {
        calculate_cents_deviation(self.measured_frequency, self.expected_frequency)
    }

    /// Short instruction shown to the player.
    pub fn instruction(&self) -> &'static str {
        match self.direction {
            Direction::None => "Good!",
            Direction::TuneUp => "Tune up",
            Direction::TuneDown => "Tune down",
        }
    }
}

/// Classifies an absolute frequency error in Hz.
pub fn classify(abs_delta: f32) -> Classification {
    if abs_delta < GOOD_LIMIT_HZ {
        Classification::Good
    } else if abs_delta < SLIGHTLY_OFF_LIMIT_HZ {
        Classification::SlightlyOff
    } else if abs_delta < OFF_LIMIT_HZ {
        Classification::Off
    } else {
        Classification::FarOff
    }
}

/// Compares a measured frequency with the expected one for `string`.
pub fn evaluate(
    string: GuitarString,
    measured_frequency: f32,
    expected_frequency: f32,
) -> TuningResult {
    let delta_hz = measured_frequency - expected_frequency;
    let classification = classify(delta_hz.abs());
    let direction = match classification {
        Classification::Good => Direction::None,
        // A zero delta counts as sharp, but zero is always Good.
        _ if delta_hz < 0.0 => Direction::TuneUp,
        _ => Direction::TuneDown,
    };

    TuningResult {
        string,
        measured_frequency,
        expected_frequency,
        delta_hz,
        classification,
        direction,
    }
}

/// Bounds a signed offset to the visible scale.
pub fn clamp_display_offset(delta_hz: f32) -> f32 {
    if delta_hz.abs() > DISPLAY_RANGE_HZ {
        DISPLAY_RANGE_HZ.copysign(delta_hz)
    } else {
        delta_hz
    }
}

/// Represents a single musical note with its name and frequency.
#[derive(Debug, Clone)]
pub struct Note {
    /// Note name (e.g., "A4", "C#3")
    pub name: String,
    /// Frequency in Hz
    pub frequency: f32,
}

/// Equal-tempered notes from A0 to C8 with A4 = 440 Hz, computed once.
static NOTES: Lazy<Vec<Note>> = Lazy::new(|| {
    const NOTE_NAMES: [&str; 12] = [
        "A", "A#", "B", "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#",
    ];
    (0..88)
        .map(|i| {
            // Index 48 is A4; the octave number rolls over at C.
            let frequency = 440.0 * 2.0_f32.powf((i as f32 - 48.0) / 12.0);
            let octave = (i + 9) / 12;
            Note {
                name: format!("{}{}", NOTE_NAMES[i % 12], octave),
                frequency,
            }
        })
        .collect()
});

/// Finds the closest equal-tempered note to a frequency.
///
/// # Returns
/// * `(note_name, note_frequency)`
pub fn find_nearest_note(freq: f32) -> (String, f32) {
    let closest = NOTES
        .iter()
        .min_by(|a, b| {
            let diff_a = (a.frequency - freq).abs();
            let diff_b = (b.frequency - freq).abs();
            diff_a.total_cmp(&diff_b)
        })
        .unwrap_or(&NOTES[48]);

    (closest.name.clone(), closest.frequency)
}

/// Calculates the deviation from a target frequency in cents.
///
/// Positive values indicate sharpness, negative values flatness.
pub fn calculate_cents_deviation(freq: f32, target_freq: f32) -> f32 {
    1200.0 * (freq / target_freq).log2()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_for_delta(delta: f32) -> TuningResult {
        let expected = GuitarString::A.expected_frequency();
        evaluate(GuitarString::A, expected + delta, expected)
    }

    #[test]
    fn classification_boundaries() {
        assert_eq!(classify(7.9), Classification::Good);
        assert_eq!(classify(8.0), Classification::SlightlyOff);
        assert_eq!(classify(15.9), Classification::SlightlyOff);
        assert_eq!(classify(16.0), Classification::Off);
        assert_eq!(classify(49.9), Classification::Off);
        assert_eq!(classify(50.0), Classification::FarOff);
    }

    #[test]
    fn far_flat_string_says_tune_up() {
        let result = result_for_delta(-60.0);
        assert_eq!(result.classification, Classification::FarOff);
        assert_eq!(result.direction, Direction::TuneUp);
        assert_eq!(result.instruction(), "Tune up");
    }

    #[test]
    fn sharp_string_says_tune_down() {
        let result = evaluate(GuitarString::G, 210.0, 196.0);
        assert_eq!(result.classification, Classification::SlightlyOff);
        assert_eq!(result.direction, Direction::TuneDown);
        assert_eq!(result.delta_hz, 14.0);
    }

    #[test]
    fn in_tune_has_no_direction() {
        let result = evaluate(GuitarString::D, 146.83, 146.83);
        assert_eq!(result.classification, Classification::Good);
        assert_eq!(result.direction, Direction::None);
        assert_eq!(result.instruction(), "Good!");
    }

    #[test]
    fn display_clamp_does_not_touch_classification() {
        let result = evaluate(GuitarString::LowE, 300.0, 82.41);
        assert_eq!(result.display_offset(), 110.0);
        assert!(result.delta_hz > 110.0);
        assert_eq!(result.classification, Classification::FarOff);

        assert_eq!(clamp_display_offset(-250.0), -110.0);
        assert_eq!(clamp_display_offset(110.0), 110.0);
        assert_eq!(clamp_display_offset(-42.5), -42.5);
    }

    #[test]
    fn nearest_note_and_cents() {
        let (name, freq) = find_nearest_note(111.0);
        assert_eq!(name, "A2");
        assert!((freq - 110.0).abs() < 0.01);
        assert!(calculate_cents_deviation(440.0, 440.0).abs() < 1e-6);
        assert!((calculate_cents_deviation(880.0, 440.0) - 1200.0).abs() < 1e-3);
    }
}
