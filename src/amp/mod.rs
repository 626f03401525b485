pub mod devices;

use anyhow::{Context, Result};
use log::{debug, info};
use std::sync::Arc;

use crate::effects::visualiser::DEFAULT_REFRESH_RATE_HZ;
use crate::effects::{Effect, FrequencyVisualiserEffect, GainEffect, VolumeEffect};
use crate::graph::{AudioGraph, NodeId};

pub use devices::{DeviceAccess, InputDevice, InputStream};

/// The microphone source together with the capture feeding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub node: NodeId,
    pub stream: InputStream,
}

/// Owns the input source and the fixed effect chain wired behind it.
///
/// The chain is linear: source -> effects[0] -> ... -> effects[n-1] ->
/// destination. Its order never changes after construction.
pub struct Amplifier {
    graph: Arc<dyn AudioGraph>,
    source: Source,
    effects: Vec<Effect>,
    input_device: Option<InputDevice>,
}

impl Amplifier {
    pub fn new(graph: Arc<dyn AudioGraph>, devices: &dyn DeviceAccess) -> Result<Self> {
        Self::with_refresh_rate(graph, devices, DEFAULT_REFRESH_RATE_HZ)
    }

    /// The default chain, with the visualiser resampling at `refresh_rate_hz`.
    ///
    /// The input is acquired first, so a refused device leaves nothing behind
    /// in the graph.
    pub fn with_refresh_rate(
        graph: Arc<dyn AudioGraph>,
        devices: &dyn DeviceAccess,
        refresh_rate_hz: u32,
    ) -> Result<Self> {
        let source = acquire_source(graph.as_ref(), devices, None)?;

        let effects = match default_chain(graph.as_ref(), refresh_rate_hz) {
            Ok(effects) => effects,
            Err(e) => {
                graph.remove(source.node);
                devices.close_input(&source.stream);
                return Err(e);
            }
        };

        Self::assemble(graph, devices, source, effects)
    }

    /// Wires `effects` behind a fresh default input. On failure the effects'
    /// nodes are removed from the graph.
    pub fn with_effects(
        graph: Arc<dyn AudioGraph>,
        devices: &dyn DeviceAccess,
        effects: Vec<Effect>,
    ) -> Result<Self> {
        let source = match acquire_source(graph.as_ref(), devices, None) {
            Ok(source) => source,
            Err(e) => {
                for effect in &effects {
                    graph.remove(effect.node());
                }
                return Err(e);
            }
        };

        Self::assemble(graph, devices, source, effects)
    }

    fn assemble(
        graph: Arc<dyn AudioGraph>,
        devices: &dyn DeviceAccess,
        source: Source,
        effects: Vec<Effect>,
    ) -> Result<Self> {
        let mut amplifier = Self {
            graph,
            source,
            effects,
            input_device: None,
        };

        // Dropping the half-built amplifier removes every node
        if let Err(e) = amplifier.wire_chain() {
            amplifier.release_source(devices);
            return Err(e);
        }

        info!(
            "Amplifier ready with {} effect(s) on {}",
            amplifier.effects.len(),
            amplifier.source.stream.device_id
        );

        Ok(amplifier)
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub const fn input_device(&self) -> Option<&InputDevice> {
        self.input_device.as_ref()
    }

    pub const fn source(&self) -> &Source {
        &self.source
    }

    pub fn graph(&self) -> &Arc<dyn AudioGraph> {
        &self.graph
    }

    /// Switches capture to `device`, or to the host default for `None`.
    ///
    /// The new source is fully acquired before the current one is touched. On
    /// failure the current source keeps playing and the recorded device is
    /// left unchanged.
    pub fn set_input_device(
        &mut self,
        devices: &dyn DeviceAccess,
        device: Option<InputDevice>,
    ) -> Result<()> {
        let source = acquire_source(self.graph.as_ref(), devices, device.as_ref())?;

        if let Err(e) = self.graph.replace(self.source.node, source.node) {
            self.graph.remove(source.node);
            if source.stream != self.source.stream {
                devices.close_input(&source.stream);
            }
            return Err(e).context("failed to swap input source");
        }

        let previous = std::mem::replace(&mut self.source, source);
        if previous.stream != self.source.stream {
            devices.close_input(&previous.stream);
        }

        match &device {
            Some(device) => info!("Input device set to {device} ({})", device.id),
            None => info!("Input device set to default ({})", self.source.stream.device_id),
        }
        self.input_device = device;

        Ok(())
    }

    /// Stops capturing and tears down the chain.
    pub fn close(mut self, devices: &dyn DeviceAccess) {
        self.release_source(devices);
    }

    fn wire_chain(&self) -> Result<()> {
        let mut from = self.source.node;
        for effect in &self.effects {
            self.graph
                .connect(from, effect.node())
                .with_context(|| format!("failed to connect effect {}", effect.id()))?;
            from = effect.node();
        }

        self.graph
            .connect(from, self.graph.destination())
            .context("failed to connect chain to the output")?;

        debug!("Chain wired from {}", self.source.node);
        Ok(())
    }

    fn release_source(&mut self, devices: &dyn DeviceAccess) {
        self.graph.disconnect(self.source.node);
        devices.close_input(&self.source.stream);
    }
}

impl Drop for Amplifier {
    fn drop(&mut self) {
        self.graph.remove(self.source.node);
        for effect in &self.effects {
            self.graph.remove(effect.node());
        }
        debug!("Amplifier chain removed from the graph");
    }
}

fn default_chain(graph: &dyn AudioGraph, refresh_rate_hz: u32) -> Result<Vec<Effect>> {
    Ok(vec![
        FrequencyVisualiserEffect::with_refresh_rate(graph, "0", refresh_rate_hz)?.into(),
        GainEffect::new(graph, "1").into(),
        VolumeEffect::new(graph, "2").into(),
    ])
}

fn acquire_source(
    graph: &dyn AudioGraph,
    devices: &dyn DeviceAccess,
    device: Option<&InputDevice>,
) -> Result<Source> {
    let stream = devices
        .open_input(device)
        .context("failed to acquire microphone input")?;

    Ok(Source {
        node: graph.create_source(),
        stream,
    })
}
