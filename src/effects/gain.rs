use crate::graph::{AudioGraph, GainNode};

/// Boosts the microphone signal before the rest of the chain.
pub struct GainEffect {
    id: String,
    node: GainNode,
}

impl GainEffect {
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

    pub fn gain(&self) -> f32 {
        self.node.gain().value()
    }

    pub fn set_gain(&self, value: f32) {
        self.node.gain().set_value(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    #[test]
    fn test_set_gain_updates_live_parameter() {
        let (graph, _renderer) = Graph::new(48_000, 128);
        let effect = GainEffect::new(&graph, "1");
        assert_eq!(effect.gain(), 1.0);

        effect.set_gain(42.5);
        assert_eq!(effect.node().gain().value(), 42.5);
        assert_eq!(effect.gain(), 42.5);
    }
}
