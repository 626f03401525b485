use iced::widget::canvas::{self, Frame, Path, Stroke};
use iced::widget::{canvas as canvas_widget, mouse_area};
use iced::{Color, Element, Length, Point, Rectangle, Renderer, Theme, mouse};

use crate::gui::messages::Message;
use crate::utils::map_value;

/// Value units per pixel of vertical drag, as a fraction of the range.
const DRAG_SENSITIVITY: f32 = 0.01;
const SIZE: f32 = 96.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncoderRange {
    pub min: f32,
    pub max: f32,
    /// Full turns between `min` and `max`.
    pub rotations: f32,
}

impl EncoderRange {
    /// New value after dragging by `dy` pixels. Dragging up increases it.
    pub fn drag(&self, value: f32, dy: f32) -> f32 {
        let delta = -dy * (self.max - self.min) * DRAG_SENSITIVITY;
        (value + delta).clamp(self.min, self.max)
    }

    /// Knob angle in degrees, counter-clockwise as the value grows.
    pub fn rotation(&self, value: f32) -> f32 {
        map_value(
            value,
            (self.min, self.max),
            (0.0, -360.0 * self.rotations),
        )
    }
}

struct Knob {
    rotation: f32,
}

impl<Message> canvas::Program<Message> for Knob {
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

        let center = frame.center();
        let radius = frame.width().min(frame.height()) / 2.0 - 4.0;

        frame.fill(&Path::circle(center, radius), palette.background.weak.color);
        frame.stroke(
            &Path::circle(center, radius),
            Stroke::default()
                .with_color(palette.primary.base.color)
                .with_width(2.0),
        );

        // Zero degrees points straight up, screen y grows downwards
        let angle = self.rotation.to_radians();
        let notch = Point::new(
            center.x + angle.sin() * radius * 0.8,
            center.y - angle.cos() * radius * 0.8,
        );
        frame.stroke(
            &Path::line(center, notch),
            Stroke::default()
                .with_color(Color::WHITE)
                .with_width(3.0),
        );

        vec![frame.into_geometry()]
    }
}

/// A draggable knob for the effect at `idx`.
pub fn rotary_encoder<'a>(idx: usize, range: EncoderRange, value: f32) -> Element<'a, Message> {
    let knob = canvas_widget(Knob {
        rotation: range.rotation(value),
    })
    .width(Length::Fixed(SIZE))
    .height(Length::Fixed(SIZE));

    mouse_area(knob)
        .on_press(Message::EncoderPressed(idx))
        .on_release(Message::EncoderReleased)
        .on_exit(Message::EncoderReleased)
        .on_move(move |point| Message::EncoderMoved(idx, point))
        .interaction(mouse::Interaction::ResizingVertically)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAIN: EncoderRange = EncoderRange {
        min: 1.0,
        max: 50.0,
        rotations: 2.0,
    };
    const VOLUME: EncoderRange = EncoderRange {
        min: 0.0,
        max: 1.0,
        rotations: 1.0,
    };

    #[test]
    fn test_drag_up_increases_value() {
        // 10px up on a 0..1 range is a tenth of the range
        assert!((VOLUME.drag(0.5, -10.0) - 0.6).abs() < 1e-6);
        assert!((VOLUME.drag(0.5, 10.0) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_drag_clamps_to_range() {
        assert_eq!(GAIN.drag(49.0, -1000.0), 50.0);
        assert_eq!(GAIN.drag(2.0, 1000.0), 1.0);
    }

    #[test]
    fn test_rotation_spans_configured_turns() {
        assert_eq!(GAIN.rotation(1.0), 0.0);
        assert_eq!(GAIN.rotation(50.0), -720.0);
        assert_eq!(VOLUME.rotation(0.5), -180.0);
    }
}
