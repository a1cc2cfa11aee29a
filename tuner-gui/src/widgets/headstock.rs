//! # Headstock Widget
//!
//! Draws a 3+3 guitar headstock with the bass strings on the left and the
//! treble strings on the right. The selected string's tuning peg is
//! highlighted and pointed at by an arrow.

use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{Color, Element, Pixels, Point, Rectangle, Renderer, Size, Theme, alignment, mouse};
use string_tuner_core::{GuitarString, HeadstockSide};

const PEG_RADIUS: f32 = 9.0;
const ARROW_LENGTH: f32 = 18.0;

#[derive(Debug, Clone, Copy)]
pub struct Headstock {
    selected: GuitarString,
}

impl Headstock {
    pub fn new(selected: GuitarString) -> Self {
        Self { selected }
    }

    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fill),
        )
        .into()
    }
}

/// Peg row from the top of the headstock: D and G first, low and high E last.
fn peg_row(string: GuitarString) -> usize {
    string.index() % 3
}

impl<Message> canvas::Program<Message> for Headstock {
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

        let center_x = bounds.width / 2.0;
        let body_width = bounds.width * 0.35;
        let body_left = center_x - body_width / 2.0;
        let body_right = center_x + body_width / 2.0;

        let body = Path::rectangle(
            Point::new(body_left, 10.0),
            Size::new(body_width, (bounds.height - 20.0).max(0.0)),
        );
        frame.fill(&body, Color::from_rgb8(0x6B, 0x45, 0x2A));

        for string in GuitarString::ALL {
            let y = bounds.height * (0.25 + 0.25 * peg_row(string) as f32);
            let selected = string == self.selected;

            // Pegs sit on the body edge; labels and the arrow sit outside it.
            let (peg_x, outward) = match string.headstock_side() {
                HeadstockSide::Left => (body_left, -1.0),
                HeadstockSide::Right => (body_right, 1.0),
            };

            let peg = Path::circle(Point::new(peg_x, y), PEG_RADIUS);
            let peg_color = if selected {
                Color::from_rgb8(0xFF, 0xC3, 0x00)
            } else {
                Color::from_rgb8(0xC0, 0xC0, 0xC0)
            };
            frame.fill(&peg, peg_color);
            frame.stroke(&peg, Stroke::default().with_width(1.0).with_color(Color::BLACK));

            let label_x = peg_x + outward * (PEG_RADIUS + 12.0);
            frame.fill_text(canvas::Text {
                content: string.note_name().to_string(),
                position: Point::new(label_x, y),
                color: if selected { peg_color } else { Color::WHITE },
                size: Pixels(16.0),
                horizontal_alignment: alignment::Horizontal::Center,
                vertical_alignment: alignment::Vertical::Center,
                ..canvas::Text::default()
            });

            if selected {
                let tip_x = label_x + outward * 14.0;
                let base_x = tip_x + outward * ARROW_LENGTH;
                let arrow = Path::new(|b| {
                    b.move_to(Point::new(tip_x, y));
                    b.line_to(Point::new(base_x, y - 8.0));
                    b.line_to(Point::new(base_x, y + 8.0));
                    b.close();
                });
                frame.fill(&arrow, peg_color);
            }
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_side_has_one_peg_per_row() {
        for side in [HeadstockSide::Left, HeadstockSide::Right] {
            let mut rows: Vec<_> = GuitarString::ALL
                .iter()
                .filter(|s| s.headstock_side() == side)
                .map(|s| peg_row(*s))
                .collect();
            rows.sort();
            assert_eq!(rows, vec![0, 1, 2]);
        }
    }

    #[test]
    fn thickest_strings_sit_furthest_from_the_nut() {
        assert_eq!(peg_row(GuitarString::D), 0);
        assert_eq!(peg_row(GuitarString::LowE), 2);
        assert_eq!(peg_row(GuitarString::HighE), 2);
    }
}
