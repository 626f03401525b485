use anyhow::{Context, Result};
use jack::Client;
use log::{debug, error};

use crate::audio::ports::Ports;
use crate::graph::Renderer;

pub struct NotificationHandler;

pub struct ProcessHandler {
    ports: Ports,
    renderer: Renderer,
    buffer: Vec<f32>,
}

impl jack::NotificationHandler for NotificationHandler {
    fn sample_rate(&mut self, _: &Client, sample_rate: jack::Frames) -> jack::Control {
        debug!(">> JACK sample_rate changed to {sample_rate}");

        jack::Control::Continue
    }
}

impl ProcessHandler {
    pub fn new(client: &Client, renderer: Renderer) -> Result<Self> {
        let ports = Ports::new(client).context("failed to create audio ports")?;
        let buffer_size = client.buffer_size() as usize;

        Ok(Self {
            ports,
            renderer,
            buffer: vec![0.0; buffer_size],
        })
    }
}

impl jack::ProcessHandler for ProcessHandler {
    fn process(&mut self, _client: &jack::Client, ps: &jack::ProcessScope) -> jack::Control {
        let input = self.ports.get_input(ps);

        // Only differs between a server resize and the buffer_size callback
        if self.buffer.len() != input.len() {
            self.buffer.resize(input.len(), 0.0);
        }

        if let Err(e) = self.renderer.render(input, &mut self.buffer) {
            error!("Audio processing error: {e}");
            self.ports.silence_output(ps);
            return jack::Control::Continue;
        }

        self.ports.write_output(ps, &self.buffer);
        jack::Control::Continue
    }

    fn buffer_size(&mut self, _client: &jack::Client, frames: jack::Frames) -> jack::Control {
        debug!(">> JACK buffer_size changed to {frames} frames");

        // The renderer works in its own block size, so only our scratch buffer follows
        self.buffer.resize(frames as usize, 0.0);

        jack::Control::Continue
    }
}
