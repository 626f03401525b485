use anyhow::{Context, Result};
use jack::{AudioIn, AudioOut, Client, Port, ProcessScope};

pub const CLIENT_NAME: &str = "micamp";
pub const IN_PORT: &str = "in_port";
pub const OUT_PORT_LEFT: &str = "out_port_left";
pub const OUT_PORT_RIGHT: &str = "out_port_right";

/// Full JACK name of one of our own ports, e.g. `micamp:in_port`.
pub fn full_name(port: &str) -> String {
    format!("{CLIENT_NAME}:{port}")
}

pub struct Ports {
    input: Port<AudioIn>,
    output_left: Port<AudioOut>,
    output_right: Port<AudioOut>,
}

impl Ports {
    pub fn new(client: &Client) -> Result<Self> {
        Ok(Self {
            input: client
                .register_port(IN_PORT, AudioIn::default())
                .context("failed to register in port")?,
            output_left: client
                .register_port(OUT_PORT_LEFT, AudioOut::default())
                .context("failed to register out port left")?,
            output_right: client
                .register_port(OUT_PORT_RIGHT, AudioOut::default())
                .context("failed to register out port right")?,
        })
    }

    pub fn get_input<'a>(&'a self, ps: &'a ProcessScope) -> &'a [f32] {
        self.input.as_slice(ps)
    }

    /// Mono in, the same signal on both playback channels.
    pub fn write_output(&mut self, ps: &ProcessScope, samples: &[f32]) {
        let output_size = ps.n_frames() as usize;
        let frame_count = samples.len().min(output_size);
        let out_left = self.output_left.as_mut_slice(ps);
        let out_right = self.output_right.as_mut_slice(ps);

        out_left[..frame_count].copy_from_slice(&samples[..frame_count]);
        out_right[..frame_count].copy_from_slice(&samples[..frame_count]);

        out_left[frame_count..output_size].fill(0.0);
        out_right[frame_count..output_size].fill(0.0);
    }

    pub fn silence_output(&mut self, ps: &ProcessScope) {
        let output_size = ps.n_frames() as usize;
        self.output_left.as_mut_slice(ps)[..output_size].fill(0.0);
        self.output_right.as_mut_slice(ps)[..output_size].fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_prefixes_client() {
        assert_eq!(full_name(IN_PORT), "micamp:in_port");
        assert_eq!(full_name(OUT_PORT_RIGHT), "micamp:out_port_right");
    }
}
