use crate::graph::{AudioGraph, GainNode};

/// Output level at the end of the chain.
///
/// Same unit as [`super::GainEffect`], but views give it a 0..1 range.
pub struct VolumeEffect {
    id: String,
    node: GainNode,
}

impl VolumeEffect {
    pub fn new(graph: &dyn AudioGraph, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node: graph.create_gain(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn node(&self) -> &GainNode {
        &self.node
    }

    pub fn volume(&self) -> f32 {
        self.node.gain().value()
    }

    pub fn set_volume(&self, value: f32) {
        self.node.gain().set_value(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    #[test]
    fn test_set_volume_updates_live_parameter() {
        let (graph, _renderer) = Graph::new(48_000, 128);
        let effect = VolumeEffect::new(&graph, "2");

        effect.set_volume(0.33);
        assert_eq!(effect.node().gain().value(), 0.33);
        assert_eq!(effect.volume(), 0.33);
    }
}
