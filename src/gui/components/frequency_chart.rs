use iced::widget::canvas::{self, Frame, Path, Stroke, Text};
use iced::widget::canvas as canvas_widget;
use iced::{Element, Length, Pixels, Point, Rectangle, Renderer, Size, Theme, mouse};
use std::sync::Arc;

use crate::effects::FrequencySample;
use crate::gui::messages::Message;
use crate::utils::{RangeOptions, map_value, range};

const HEIGHT: f32 = 180.0;
const LABEL_HEIGHT: f32 = 16.0;
const TICK_STEP_HZ: f32 = 1000.0;

/// Bar heights for `samples`, scaled between the quietest and loudest bin.
///
/// A flat spectrum has no range to scale over and draws nothing.
pub fn bar_heights(samples: &[FrequencySample], height: f32) -> Vec<f32> {
    let (min, max) = samples
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), s| {
            (min.min(s.volume), max.max(s.volume))
        });

    if max <= min {
        return vec![0.0; samples.len()];
    }

    samples
        .iter()
        .map(|s| map_value(s.volume, (min, max), (0.0, height)))
        .collect()
}

/// `(x, label)` for every whole kHz below Nyquist.
pub fn ticks(sample_rate: f32, width: f32) -> Vec<(f32, String)> {
    let nyquist = sample_rate / 2.0;

    range(RangeOptions::to(nyquist).step(TICK_STEP_HZ))
        .into_iter()
        .map(|frequency| {
            let x = map_value(frequency, (0.0, nyquist), (0.0, width));
            (x, format!("{}k", (frequency / 1000.0).round()))
        })
        .collect()
}

struct Chart {
    samples: Arc<Vec<FrequencySample>>,
    sample_rate: f32,
}

impl<Message> canvas::Program<Message> for Chart {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let palette = theme.extended_palette();

        let plot_height = frame.height() - LABEL_HEIGHT;
        let heights = bar_heights(&self.samples, plot_height);

        if !heights.is_empty() {
            let bar_width = frame.width() / heights.len() as f32;
            for (i, height) in heights.iter().enumerate() {
                frame.fill_rectangle(
                    Point::new(i as f32 * bar_width, plot_height - height),
                    Size::new(bar_width.max(1.0), *height),
                    palette.primary.base.color,
                );
            }
        }

        frame.stroke(
            &Path::line(
                Point::new(0.0, plot_height),
                Point::new(frame.width(), plot_height),
            ),
            Stroke::default()
                .with_color(palette.background.strong.color)
                .with_width(1.0),
        );

        for (x, label) in ticks(self.sample_rate, frame.width()) {
            frame.fill_text(Text {
                content: label,
                position: Point::new(x, plot_height + 2.0),
                color: palette.background.base.text,
                size: Pixels(10.0),
                ..Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}

pub fn frequency_chart<'a>(
    samples: Arc<Vec<FrequencySample>>,
    sample_rate: f32,
) -> Element<'a, Message> {
    canvas_widget(Chart {
        samples,
        sample_rate,
    })
    .width(Length::Fill)
    .height(Length::Fixed(HEIGHT))
    .into()
}
