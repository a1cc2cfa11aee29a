//! # Tuning Scale Widget
//!
//! A horizontal scale from -110 Hz to +110 Hz around the expected
//! frequency of the selected string, with a colour-coded marker at the
//! measured offset.

use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{Color, Element, Point, Rectangle, Renderer, Size, Theme, mouse};
use string_tuner_core::tuning::{Classification, DISPLAY_RANGE_HZ, TuningResult};

/// One tick every 10 Hz across the full range.
const TICK_STEP_HZ: f32 = 10.0;

pub struct TuningScale {
    /// Clamped offset of the marker, None when there is nothing to show.
    offset: Option<f32>,
    classification: Classification,
}

impl TuningScale {
    pub fn new(result: Option<&TuningResult>) -> Self {
        Self {
            offset: result.map(TuningResult::display_offset),
            classification: result.map_or(Classification::Good, |r| r.classification),
        }
    }

    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fixed(60.0)),
        )
        .into()
    }
}

/// Green inside 16 Hz, yellow inside 50 Hz, red beyond.
pub fn classification_color(classification: Classification) -> Color {
    match classification {
        Classification::Good | Classification::SlightlyOff => Color::from_rgb8(0x34, 0xDB, 0x98),
        Classification::Off => Color::from_rgb8(0xFF, 0xC3, 0x00),
        Classification::FarOff => Color::from_rgb8(0xFF, 0x33, 0x33),
    }
}

fn offset_to_x(offset: f32, width: f32) -> f32 {
    (offset + DISPLAY_RANGE_HZ) / (2.0 * DISPLAY_RANGE_HZ) * width
}

impl<Message> canvas::Program<Message> for TuningScale {
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

        let background = Path::rectangle(Point::ORIGIN, bounds.size());
        frame.fill(&background, Color::from_rgb8(0x40, 0x40, 0x40));

        // Full-height ticks at both ends and the centre, short ones between.
        let ticks = (2.0 * DISPLAY_RANGE_HZ / TICK_STEP_HZ).round() as i32;
        for i in 0..=ticks {
            let hz = -DISPLAY_RANGE_HZ + i as f32 * TICK_STEP_HZ;
            let x = offset_to_x(hz, bounds.width);
            let (top, bottom, width) = if i == 0 || i == ticks || i * 2 == ticks {
                (0.0, bounds.height, 2.0)
            } else {
                (bounds.height / 3.0, bounds.height * 2.0 / 3.0, 1.0)
            };
            let tick = Path::line(Point::new(x, top), Point::new(x, bottom));
            frame.stroke(&tick, Stroke::default().with_width(width).with_color(Color::WHITE));
        }

        if let Some(offset) = self.offset {
            let x = offset_to_x(offset, bounds.width);
            let marker = Path::rectangle(Point::new(x - 3.0, 0.0), Size::new(6.0, bounds.height));
            frame.fill(&marker, classification_color(self.classification));
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use string_tuner_core::{GuitarString, tuning};

    #[test]
    fn marker_spans_the_scale() {
        assert_eq!(offset_to_x(-DISPLAY_RANGE_HZ, 220.0), 0.0);
        assert_eq!(offset_to_x(0.0, 220.0), 110.0);
        assert_eq!(offset_to_x(DISPLAY_RANGE_HZ, 220.0), 220.0);
    }

    #[test]
    fn far_off_results_are_clamped_to_the_edge() {
        let result = tuning::evaluate(GuitarString::HighE, 100.0, 329.63);
        let scale = TuningScale::new(Some(&result));
        assert_eq!(scale.offset, Some(-DISPLAY_RANGE_HZ));
        assert_eq!(scale.classification, Classification::FarOff);
    }
}
