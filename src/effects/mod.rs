pub mod gain;
pub mod visualiser;
pub mod volume;

pub use gain::GainEffect;
pub use visualiser::{FrequencySample, FrequencyVisualiserEffect};
pub use volume::VolumeEffect;

use std::fmt::Display;

use crate::graph::NodeId;

/// One stage of the amplifier chain. The set of variants is closed.
pub enum Effect {
    Gain(GainEffect),
    Volume(VolumeEffect),
    FrequencyVisualiser(FrequencyVisualiserEffect),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Gain,
    Volume,
    FrequencyVisualiser,
}

impl Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EffectKind::Gain => write!(f, "Gain"),
            EffectKind::Volume => write!(f, "Volume"),
            EffectKind::FrequencyVisualiser => write!(f, "Frequency Visualiser"),
        }
    }
}

/// Per-variant dispatch over an [`Effect`].
pub trait EffectVisitor {
    type Output;

    fn visit_gain(&mut self, effect: &GainEffect) -> Self::Output;
    fn visit_volume(&mut self, effect: &VolumeEffect) -> Self::Output;
    fn visit_frequency_visualiser(&mut self, effect: &FrequencyVisualiserEffect) -> Self::Output;
}

impl Effect {
    pub fn id(&self) -> &str {
        match self {
            Effect::Gain(effect) => effect.id(),
            Effect::Volume(effect) => effect.id(),
            Effect::FrequencyVisualiser(effect) => effect.id(),
        }
    }

    /// The processing unit this effect owns.
    pub fn node(&self) -> NodeId {
        match self {
            Effect::Gain(effect) => effect.node().id(),
            Effect::Volume(effect) => effect.node().id(),
            Effect::FrequencyVisualiser(effect) => effect.node().id(),
        }
    }

    pub const fn kind(&self) -> EffectKind {
        match self {
            Effect::Gain(_) => EffectKind::Gain,
            Effect::Volume(_) => EffectKind::Volume,
            Effect::FrequencyVisualiser(_) => EffectKind::FrequencyVisualiser,
        }
    }

    pub fn accept<V: EffectVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Effect::Gain(effect) => visitor.visit_gain(effect),
            Effect::Volume(effect) => visitor.visit_volume(effect),
            Effect::FrequencyVisualiser(effect) => visitor.visit_frequency_visualiser(effect),
        }
    }
}

impl From<GainEffect> for Effect {
    fn from(effect: GainEffect) -> Self {
        Effect::Gain(effect)
    }
}

impl From<VolumeEffect> for Effect {
    fn from(effect: VolumeEffect) -> Self {
        Effect::Volume(effect)
    }
}

impl From<FrequencyVisualiserEffect> for Effect {
    fn from(effect: FrequencyVisualiserEffect) -> Self {
        Effect::FrequencyVisualiser(effect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AudioGraph, Graph};

    #[derive(Debug, PartialEq, Eq)]
    enum Sentinel {
        Gain(String),
        Volume(String),
        FrequencyVisualiser(String),
    }

    struct SentinelVisitor;

    impl EffectVisitor for SentinelVisitor {
        type Output = Sentinel;

        fn visit_gain(&mut self, effect: &GainEffect) -> Sentinel {
            Sentinel::Gain(effect.id().to_string())
        }

        fn visit_volume(&mut self, effect: &VolumeEffect) -> Sentinel {
            Sentinel::Volume(effect.id().to_string())
        }

        fn visit_frequency_visualiser(&mut self, effect: &FrequencyVisualiserEffect) -> Sentinel {
            Sentinel::FrequencyVisualiser(effect.id().to_string())
        }
    }

    #[test]
    fn test_accept_dispatches_to_matching_variant() -> anyhow::Result<()> {
        let (graph, _renderer) = Graph::new(48_000, 128);
        let effects: Vec<Effect> = vec![
            FrequencyVisualiserEffect::new(&graph, "0")?.into(),
            GainEffect::new(&graph, "1").into(),
            VolumeEffect::new(&graph, "2").into(),
        ];

        let results: Vec<Sentinel> = effects
            .iter()
            .map(|effect| effect.accept(&mut SentinelVisitor))
            .collect();

        assert_eq!(
            results,
            vec![
                Sentinel::FrequencyVisualiser("0".to_string()),
                Sentinel::Gain("1".to_string()),
                Sentinel::Volume("2".to_string()),
            ]
        );

        Ok(())
    }

    #[test]
    fn test_each_effect_owns_a_distinct_node() -> anyhow::Result<()> {
        let (graph, _renderer) = Graph::new(48_000, 128);
        let gain = Effect::from(GainEffect::new(&graph, "a"));
        let volume = Effect::from(VolumeEffect::new(&graph, "b"));

        assert_ne!(gain.node(), volume.node());
        assert_ne!(gain.node(), graph.destination());
        assert_eq!(gain.kind(), EffectKind::Gain);
        assert_eq!(volume.kind(), EffectKind::Volume);
        assert_eq!(volume.kind().to_string(), "Volume");

        Ok(())
    }
}
