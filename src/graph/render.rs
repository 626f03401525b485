use anyhow::{Result, bail, ensure};
use crossbeam::channel::{Receiver, Sender, unbounded};
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::analyser::AnalyserTap;
use super::{AnalyserNode, AudioGraph, AudioParam, GainNode, NodeId};

pub enum GraphMessage {
    SetPlan(Box<RenderPlan>),
}

enum NodeKind {
    Source,
    Gain(Arc<AudioParam>),
    Analyser(AnalyserNode),
    Destination,
}

struct Topology {
    nodes: BTreeMap<NodeId, NodeKind>,
    /// Outgoing edges, keyed by the upstream node.
    edges: BTreeMap<NodeId, BTreeSet<NodeId>>,
    next_id: u32,
}

impl Topology {
    fn insert(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, kind);
        id
    }

    fn reaches(&self, from: NodeId, target: NodeId) -> bool {
        let mut stack = vec![from];
        let mut seen = BTreeSet::new();

        while let Some(node) = stack.pop() {
            if node == target {
                return true;
            }
            if !seen.insert(node) {
                continue;
            }
            if let Some(next) = self.edges.get(&node) {
                stack.extend(next.iter().copied());
            }
        }

        false
    }

    /// Kahn's algorithm over every node but the destination.
    fn processing_order(&self, destination: NodeId) -> Vec<NodeId> {
        let mut in_degree: BTreeMap<NodeId, usize> = self
            .nodes
            .keys()
            .filter(|&&id| id != destination)
            .map(|&id| (id, 0))
            .collect();

        for targets in self.edges.values() {
            for target in targets {
                if let Some(degree) = in_degree.get_mut(target) {
                    *degree += 1;
                }
            }
        }

        let mut ready: Vec<NodeId> = in_degree
            .iter()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(&id, _)| id)
            .rev()
            .collect();
        let mut order = Vec::with_capacity(in_degree.len());

        while let Some(node) = ready.pop() {
            order.push(node);
            for target in self.edges.get(&node).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(target) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(*target);
                    }
                }
            }
        }

        order
    }

    fn compile(&self, destination: NodeId, block_size: usize) -> RenderPlan {
        let order = self.processing_order(destination);
        let slots: BTreeMap<NodeId, usize> =
            order.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let inputs_of = |node: NodeId| -> Vec<usize> {
            self.edges
                .iter()
                .filter(|(_, targets)| targets.contains(&node))
                .filter_map(|(from, _)| slots.get(from).copied())
                .collect()
        };

        let steps = order
            .iter()
            .filter_map(|&id| {
                let processor = match self.nodes.get(&id)? {
                    NodeKind::Source => Processor::Source,
                    NodeKind::Gain(param) => Processor::Gain(Arc::clone(param)),
                    NodeKind::Analyser(node) => Processor::Analyser(node.tap()),
                    NodeKind::Destination => return None,
                };
                Some(Step {
                    processor,
                    inputs: inputs_of(id),
                })
            })
            .collect::<Vec<_>>();

        RenderPlan {
            buffers: vec![vec![0.0; block_size]; steps.len()],
            steps,
            output_inputs: inputs_of(destination),
            block_size,
        }
    }
}

/// Control-thread half of the graph.
///
/// Every topology change compiles a fresh [`RenderPlan`] and hands it to the
/// paired [`Renderer`].
pub struct Graph {
    topology: Mutex<Topology>,
    destination: NodeId,
    sample_rate: f32,
    block_size: usize,
    tx_plans: Sender<GraphMessage>,
}

impl Graph {
    pub fn new(sample_rate: usize, block_size: usize) -> (Self, Renderer) {
        let (tx_plans, rx_plans) = unbounded();

        let mut topology = Topology {
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            next_id: 0,
        };
        let destination = topology.insert(NodeKind::Destination);

        (
            Self {
                topology: Mutex::new(topology),
                destination,
                sample_rate: sample_rate as f32,
                block_size: block_size.max(1),
                tx_plans,
            },
            Renderer {
                plan: None,
                rx_plans,
            },
        )
    }

    fn topology(&self) -> MutexGuard<'_, Topology> {
        self.topology.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, topology: &Topology) {
        let plan = topology.compile(self.destination, self.block_size);
        if self
            .tx_plans
            .send(GraphMessage::SetPlan(Box::new(plan)))
            .is_err()
        {
            warn!("Renderer is gone, dropping render plan");
        }
    }

    fn insert(&self, kind: NodeKind) -> NodeId {
        self.topology().insert(kind)
    }
}

impl AudioGraph for Graph {
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn destination(&self) -> NodeId {
        self.destination
    }

    fn create_source(&self) -> NodeId {
        self.insert(NodeKind::Source)
    }

    fn create_gain(&self) -> GainNode {
        let mut topology = self.topology();
        let id = NodeId(topology.next_id);
        let node = GainNode::new(id);
        topology.insert(NodeKind::Gain(node.param()));
        node
    }

    fn create_analyser(&self) -> AnalyserNode {
        let mut topology = self.topology();
        let id = NodeId(topology.next_id);
        let node = AnalyserNode::new(id);
        topology.insert(NodeKind::Analyser(node.clone()));
        node
    }

    fn connect(&self, from: NodeId, to: NodeId) -> Result<()> {
        let mut topology = self.topology();

        ensure!(topology.nodes.contains_key(&from), "unknown node {from}");
        let Some(target) = topology.nodes.get(&to) else {
            bail!("unknown node {to}");
        };
        ensure!(
            from != self.destination,
            "the destination has no outputs"
        );
        if matches!(target, NodeKind::Source) {
            bail!("{to} is a source and takes no inputs");
        }
        ensure!(
            !topology.reaches(to, from),
            "connecting {from} -> {to} would form a cycle"
        );

        topology.edges.entry(from).or_default().insert(to);
        debug!("Connected {from} -> {to}");
        self.publish(&topology);

        Ok(())
    }

    fn disconnect(&self, from: NodeId) {
        let mut topology = self.topology();

        if topology.edges.remove(&from).is_some() {
            debug!("Disconnected {from}");
            self.publish(&topology);
        }
    }

    fn remove(&self, node: NodeId) {
        if node == self.destination {
            warn!("Refusing to remove the destination node");
            return;
        }

        let mut topology = self.topology();
        if topology.nodes.remove(&node).is_none() {
            return;
        }

        topology.edges.remove(&node);
        for targets in topology.edges.values_mut() {
            targets.remove(&node);
        }
        topology.edges.retain(|_, targets| !targets.is_empty());

        debug!("Removed {node}");
        self.publish(&topology);
    }

    fn replace(&self, old: NodeId, new: NodeId) -> Result<()> {
        let mut topology = self.topology();

        ensure!(topology.nodes.contains_key(&old), "unknown node {old}");
        ensure!(topology.nodes.contains_key(&new), "unknown node {new}");
        ensure!(
            old != self.destination && new != self.destination,
            "the destination cannot be replaced"
        );
        ensure!(old != new, "{old} cannot replace itself");

        let targets = topology.edges.get(&old).cloned().unwrap_or_default();
        for &target in &targets {
            ensure!(
                target != new && !topology.reaches(target, new),
                "moving {old} -> {target} onto {new} would form a cycle"
            );
        }

        topology.nodes.remove(&old);
        topology.edges.remove(&old);
        for edges in topology.edges.values_mut() {
            edges.remove(&old);
        }
        topology.edges.retain(|_, edges| !edges.is_empty());
        if !targets.is_empty() {
            topology.edges.entry(new).or_default().extend(targets);
        }

        debug!("Replaced {old} with {new}");
        self.publish(&topology);

        Ok(())
    }

    fn outputs(&self, node: NodeId) -> Vec<NodeId> {
        self.topology()
            .edges
            .get(&node)
            .map(|targets| targets.iter().copied().collect())
            .unwrap_or_default()
    }

    fn nodes(&self) -> Vec<NodeId> {
        self.topology().nodes.keys().copied().collect()
    }
}

enum Processor {
    Source,
    Gain(Arc<AudioParam>),
    Analyser(AnalyserTap),
}

struct Step {
    processor: Processor,
    /// Indices of earlier steps whose output is summed into this one.
    inputs: Vec<usize>,
}

/// A compiled snapshot of the topology, ready for the audio thread.
///
/// Steps are in topological order and each owns the buffer at its index, so
/// every input of a step has already been rendered when the step runs.
pub struct RenderPlan {
    steps: Vec<Step>,
    buffers: Vec<Vec<f32>>,
    output_inputs: Vec<usize>,
    block_size: usize,
}

impl RenderPlan {
    fn process(&mut self, input: &[f32], output: &mut [f32]) {
        for (input, output) in input
            .chunks(self.block_size)
            .zip(output.chunks_mut(self.block_size))
        {
            self.process_chunk(input, output);
        }
    }

    fn process_chunk(&mut self, input: &[f32], output: &mut [f32]) {
        let len = input.len();

        for (idx, step) in self.steps.iter_mut().enumerate() {
            let (rendered, rest) = self.buffers.split_at_mut(idx);
            let buffer = &mut rest[0][..len];

            if let Processor::Source = step.processor {
                buffer.copy_from_slice(input);
                continue;
            }

            buffer.fill(0.0);
            for &from in &step.inputs {
                for (acc, &s) in buffer.iter_mut().zip(&rendered[from][..len]) {
                    *acc += s;
                }
            }

            match &mut step.processor {
                Processor::Gain(param) => {
                    let gain = param.value();
                    for s in buffer.iter_mut() {
                        *s *= gain;
                    }
                }
                Processor::Analyser(tap) => tap.process(buffer),
                Processor::Source => {}
            }
        }

        output.fill(0.0);
        for &from in &self.output_inputs {
            for (out, &s) in output.iter_mut().zip(&self.buffers[from][..len]) {
                *out += s;
            }
        }
    }
}

/// Audio-thread half of the graph.
pub struct Renderer {
    plan: Option<Box<RenderPlan>>,
    rx_plans: Receiver<GraphMessage>,
}

impl Renderer {
    pub fn render(&mut self, input: &[f32], output: &mut [f32]) -> Result<()> {
        self.handle_messages();

        ensure!(
            input.len() == output.len(),
            "input has {} frames but output has {}",
            input.len(),
            output.len()
        );

        match self.plan.as_mut() {
            Some(plan) => plan.process(input, output),
            None => output.fill(0.0),
        }

        Ok(())
    }

    pub fn handle_messages(&mut self) {
        while let Ok(message) = self.rx_plans.try_recv() {
            match message {
                GraphMessage::SetPlan(plan) => self.plan = Some(plan),
            }
        }
    }
}
