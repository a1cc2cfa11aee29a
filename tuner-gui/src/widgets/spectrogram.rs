//! # Spectrum Widget
//!
//! Shows the in-band magnitude spectrum of the last recording as a bar
//! chart, with a marker at the expected frequency of the selected string.
//!
//! ## Features
//! - Logarithmic magnitude scaling
//! - Expected-frequency marker

use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{Color, Element, Point, Rectangle, Renderer, Size, Theme, mouse};
use string_tuner_core::BandSpectrum;

/// Small epsilon value to prevent log(0) errors in magnitude calculations.
const EPSILON: f32 = 1e-12;

pub struct Spectrogram {
    spectrum: BandSpectrum,
    expected_hz: f32,
}

impl Spectrogram {
    pub fn new(spectrum: BandSpectrum, expected_hz: f32) -> Self {
        Self { spectrum, expected_hz }
    }

    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fill),
        )
        .into()
    }

    /// Width of one bin's bar; all bins always fit the chart.
    fn bar_width(&self, width: f32) -> f32 {
        width / self.spectrum.magnitudes.len().max(1) as f32
    }

    /// Horizontal position of `hz` on a chart `width` wide, measured on the
    /// same bar grid as the spectrum. None outside the shown bins.
    fn frequency_to_x(&self, hz: f32, width: f32) -> Option<f32> {
        let bins = self.spectrum.magnitudes.len() as f32;
        if self.spectrum.bin_hz <= 0.0 || bins == 0.0 {
            return None;
        }
        // Bin i is centred in bar i.
        let position = (hz - self.spectrum.lo_hz) / self.spectrum.bin_hz + 0.5;
        (0.0..=bins).contains(&position).then_some(position * self.bar_width(width))
    }
}

impl<Message> canvas::Program<Message> for Spectrogram {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let data = &self.spectrum.magnitudes;

        if !bounds.width.is_finite() || !bounds.height.is_finite() || data.is_empty() {
            return vec![frame.into_geometry()];
        }

        let max_magnitude = data.iter().fold(0.0f32, |max, &val| val.max(max));
        if max_magnitude > 0.0 {
            // Bars are scaled in decibels below the peak, floored at -60 dB.
            let bar_width = self.bar_width(bounds.width);
            for (i, &magnitude) in data.iter().enumerate() {
                let db = 20.0 * ((magnitude + EPSILON) / max_magnitude).log10();
                let height = ((db + 60.0) / 60.0).clamp(0.0, 1.0) * bounds.height;

                if height.is_finite() && height > 0.0 {
                    let bar = Path::rectangle(
                        Point::new(i as f32 * bar_width, bounds.height - height),
                        Size::new(bar_width, height),
                    );
                    frame.fill(&bar, Color::from_rgb8(0x34, 0x98, 0xDB));
                }
            }
        }

        if let Some(x) = self.frequency_to_x(self.expected_hz, bounds.width) {
            let marker = Path::line(Point::new(x, 0.0), Point::new(x, bounds.height));
            frame.stroke(
                &marker,
                Stroke::default()
                    .with_width(1.5)
                    .with_color(Color::from_rgb8(0xFF, 0xC3, 0x00)),
            );
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(expected_hz: f32) -> Spectrogram {
        Spectrogram::new(
            BandSpectrum { lo_hz: 50.0, bin_hz: 1.0, magnitudes: vec![0.0; 330] },
            expected_hz,
        )
    }

    #[test]
    fn expected_marker_sits_in_the_middle_of_its_bar() {
        let chart = chart(215.0);
        let x = chart.frequency_to_x(215.0, 660.0).unwrap();
        // 215 Hz is bin 165, whose 2 px bar spans 330..332.
        assert!((x - 331.0).abs() < 1e-3);
    }

    #[test]
    fn bars_and_marker_stay_inside_a_narrow_chart() {
        // More bins than pixels.
        let chart = Spectrogram::new(
            BandSpectrum { lo_hz: 50.0, bin_hz: 0.5, magnitudes: vec![1.0; 676] },
            379.0,
        );
        let width = 300.0;
        let bar_width = chart.bar_width(width);
        assert!((675.0 * bar_width + bar_width - width).abs() < 1e-3);

        let x = chart.frequency_to_x(379.0, width).unwrap();
        let bar = ((379.0 - 50.0) / 0.5) as f32;
        assert!(x >= bar * bar_width && x <= (bar + 1.0) * bar_width);
        assert!(x <= width);
    }

    #[test]
    fn marker_outside_band_or_empty_spectrum_is_hidden() {
        assert!(chart(20.0).frequency_to_x(20.0, 660.0).is_none());
        let empty = Spectrogram::new(BandSpectrum::default(), 110.0);
        assert!(empty.frequency_to_x(110.0, 660.0).is_none());
    }
}
