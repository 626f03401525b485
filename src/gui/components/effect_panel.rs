use iced::widget::{column, container, text};
use iced::{Alignment, Element, Length};

use crate::effects::Effect;
use crate::gui::components::frequency_chart::frequency_chart;
use crate::gui::components::rotary_encoder::{EncoderRange, rotary_encoder};
use crate::gui::messages::Message;
use crate::utils::map_value;

pub const GAIN_RANGE: EncoderRange = EncoderRange {
    min: 1.0,
    max: 50.0,
    rotations: 2.0,
};

pub const VOLUME_RANGE: EncoderRange = EncoderRange {
    min: 0.0,
    max: 1.0,
    rotations: 1.0,
};

pub fn gain_stat(gain: f32) -> String {
    let percent = map_value(gain, (GAIN_RANGE.min, GAIN_RANGE.max), (0.0, 100.0));
    format!("{}%", percent.round())
}

pub fn volume_stat(volume: f32) -> String {
    format!("{}%", (volume * 100.0).round())
}

/// The control for the effect at `idx` of the chain.
pub fn effect_panel<'a>(idx: usize, effect: &Effect) -> Element<'a, Message> {
    let title = text(effect.kind().to_string()).size(18);

    let body: Element<'a, Message> = match effect {
        Effect::Gain(gain) => column![
            rotary_encoder(idx, GAIN_RANGE, gain.gain()),
            text(gain_stat(gain.gain())).size(14),
        ]
        .spacing(8)
        .align_x(Alignment::Center)
        .into(),
        Effect::Volume(volume) => column![
            rotary_encoder(idx, VOLUME_RANGE, volume.volume()),
            text(volume_stat(volume.volume())).size(14),
        ]
        .spacing(8)
        .align_x(Alignment::Center)
        .into(),
        Effect::FrequencyVisualiser(visualiser) => {
            frequency_chart(visualiser.frequencies(), visualiser.sample_rate())
        }
    };

    let width = match effect {
        Effect::FrequencyVisualiser(_) => Length::Fill,
        Effect::Gain(_) | Effect::Volume(_) => Length::Fixed(160.0),
    };

    container(column![title, body].spacing(10).align_x(Alignment::Center))
        .padding(10)
        .width(width)
        .style(|theme: &iced::Theme| {
            container::Style::default()
                .background(theme.extended_palette().background.weak.color)
                .border(iced::Border::default().rounded(5))
        })
        .into()
}

/// Applies a vertical drag to the encoder of `effect`.
///
/// Returns `false` for effects without an encoder.
pub fn drag_effect(effect: &Effect, dy: f32) -> bool {
    match effect {
        Effect::Gain(gain) => {
            gain.set_gain(GAIN_RANGE.drag(gain.gain(), dy));
            true
        }
        Effect::Volume(volume) => {
            volume.set_volume(VOLUME_RANGE.drag(volume.volume(), dy));
            true
        }
        Effect::FrequencyVisualiser(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{GainEffect, VolumeEffect};
    use crate::graph::Graph;

    #[test]
    fn test_stats_are_whole_percentages() {
        assert_eq!(gain_stat(1.0), "0%");
        assert_eq!(gain_stat(50.0), "100%");
        assert_eq!(gain_stat(25.5), "50%");
        assert_eq!(volume_stat(0.333), "33%");
        assert_eq!(volume_stat(1.0), "100%");
    }

    #[test]
    fn test_drag_writes_effect_parameter() {
        let (graph, _renderer) = Graph::new(48_000, 128);
        let gain = Effect::from(GainEffect::new(&graph, "1"));
        let volume = Effect::from(VolumeEffect::new(&graph, "2"));

        assert!(drag_effect(&gain, -10.0));
        assert!(drag_effect(&volume, 20.0));

        let Effect::Gain(gain) = gain else {
            unreachable!()
        };
        let Effect::Volume(volume) = volume else {
            unreachable!()
        };
        assert!((gain.gain() - 5.9).abs() < 1e-5);
        assert!((volume.volume() - 0.8).abs() < 1e-6);
    }
}
