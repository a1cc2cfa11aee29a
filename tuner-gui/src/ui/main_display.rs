//! # Main Display Module
//!
//! This module contains the main display components and layout logic
//! for the string tuner.

use iced::widget::{Space, button, column, container, horizontal_space, row, text};
use iced::{Alignment, Element, Length};
use string_tuner_core::tuning;

use crate::widgets::{headstock, spectrogram, tuning_scale};
use crate::{DisplayData, Message};

/// Creates the complete main application view
pub fn create_main_view(data: &DisplayData) -> Element<'static, Message> {
    if !data.worker_active {
        let stopped = column![text("Tuner stopped").size(40), text(data.status.clone()).size(16)];
        return container(stopped)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into();
    }

    let title = row![
        text("String Tuner").size(28),
        horizontal_space(),
        text(data.input_label.clone()).size(14),
    ]
    .align_y(Alignment::Center);

    let main_content = column![
        title,
        Space::with_height(20),
        row![
            create_headstock_panel(data),
            Space::with_width(10),
            column![create_scale_panel(data), create_spectrum_panel(data)]
                .width(Length::Fill)
                .spacing(10),
        ]
        .align_y(Alignment::Start),
        Space::with_height(10),
        create_controls(data),
    ]
    .spacing(10)
    .padding(20);

    container(main_content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

/// Headstock with the selected string marked.
fn create_headstock_panel(data: &DisplayData) -> Element<'static, Message> {
    let expected = format!(
        "{} string, {:.2} Hz",
        data.selected,
        data.selected.expected_frequency()
    );

    container(
        column![
            text("String").size(18),
            Space::with_height(10),
            headstock::Headstock::new(data.selected).view(),
            text(expected).size(14),
        ]
        .spacing(5)
        .padding(15),
    )
    .width(Length::Fixed(260.0))
    .height(Length::Fixed(460.0))
    .into()
}

/// Instruction, measured frequency and the tuning scale.
fn create_scale_panel(data: &DisplayData) -> Element<'static, Message> {
    let (instruction, details) = match (&data.last_result, data.no_pitch) {
        (_, true) => (
            "No pitch detected".to_string(),
            format!("Pluck the {} string and record again", data.selected),
        ),
        (Some(result), false) => {
            let (nearest, _) = tuning::find_nearest_note(result.measured_frequency);
            (
                result.instruction().to_string(),
                format!(
                    "{:.2} Hz ({}), {:+.2} Hz / {:+.0} cents",
                    result.measured_frequency,
                    nearest,
                    result.delta_hz,
                    result.cents_deviation()
                ),
            )
        }
        (None, false) => ("--".to_string(), "Press Record and pluck the string".to_string()),
    };

    let scale = tuning_scale::TuningScale::new(data.last_result.as_ref()).view();
    let mut headline = text(instruction).size(28);
    if let Some(result) = &data.last_result {
        headline = headline.color(tuning_scale::classification_color(result.classification));
    }

    container(
        column![
            text("Tuning").size(18),
            Space::with_height(10),
            headline,
            text(details).size(14),
            Space::with_height(10),
            scale,
            row![text("-110 Hz").size(12), horizontal_space(), text("+110 Hz").size(12)],
        ]
        .spacing(5)
        .padding(15),
    )
    .width(Length::Fill)
    .height(Length::Fixed(220.0))
    .into()
}

/// Creates the spectrum panel widget.
fn create_spectrum_panel(data: &DisplayData) -> Element<'static, Message> {
    let chart = spectrogram::Spectrogram::new(
        data.spectrum.clone(),
        data.selected.expected_frequency(),
    );

    container(
        column![
            text("Spectrum").size(18),
            Space::with_height(10),
            container(chart.view()).width(Length::Fill).height(Length::Fill),
        ]
        .spacing(5)
        .padding(15),
    )
    .width(Length::Fill)
    .height(Length::Fixed(230.0))
    .into()
}

/// Previous / Record / Next buttons and the status line.
fn create_controls(data: &DisplayData) -> Element<'static, Message> {
    let buttons = row![
        button(text("◀ Previous").size(16))
            .padding([8, 16])
            .on_press(Message::Previous),
        button(text("Record").size(16))
            .padding([8, 24])
            .on_press(Message::Record),
        button(text("Next ▶").size(16))
            .padding([8, 16])
            .on_press(Message::Next),
    ]
    .spacing(10);

    row![
        buttons,
        Space::with_width(20),
        text(data.status.clone()).size(18),
    ]
    .align_y(Alignment::Center)
    .into()
}
