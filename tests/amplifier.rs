use anyhow::{Result, bail};
use micamp::amp::{Amplifier, DeviceAccess, InputDevice, InputStream};
use micamp::effects::Effect;
use micamp::graph::{AudioGraph, Graph};
use std::sync::Arc;

const SAMPLE_RATE: usize = 48_000;
const BUFFER_SIZE: usize = 256;

struct OneMicrophone;

impl DeviceAccess for OneMicrophone {
    fn input_devices(&self) -> Result<Vec<InputDevice>> {
        Ok(vec![InputDevice {
            id: "system:capture_1".to_string(),
            label: "Microphone".to_string(),
        }])
    }

    fn open_input(&self, device: Option<&InputDevice>) -> Result<InputStream> {
        match device.map(|d| d.id.as_str()) {
            None | Some("system:capture_1") => Ok(InputStream {
                device_id: "system:capture_1".to_string(),
            }),
            Some(other) => bail!("no such device {other}"),
        }
    }

    fn close_input(&self, _stream: &InputStream) {}
}

fn set_levels(amplifier: &Amplifier, gain: f32, volume: f32) {
    for effect in amplifier.effects() {
        match effect {
            Effect::Gain(effect) => effect.set_gain(gain),
            Effect::Volume(effect) => effect.set_volume(volume),
            Effect::FrequencyVisualiser(_) => {}
        }
    }
}

#[test]
fn amplifier_applies_gain_and_volume() -> Result<()> {
    let (graph, mut renderer) = Graph::new(SAMPLE_RATE, BUFFER_SIZE);
    let amplifier = Amplifier::new(Arc::new(graph), &OneMicrophone)?;
    set_levels(&amplifier, 4.0, 0.25);

    let input = vec![0.5f32; BUFFER_SIZE];
    let mut output = vec![0.0f32; BUFFER_SIZE];
    renderer.render(&input, &mut output)?;

    assert!(
        output.iter().all(|&s| (s - 0.5).abs() < 1e-6),
        "expected input * gain * volume"
    );

    Ok(())
}

#[test]
fn amplifier_output_goes_silent_once_dropped() -> Result<()> {
    let (graph, mut renderer) = Graph::new(SAMPLE_RATE, BUFFER_SIZE);
    let graph: Arc<dyn AudioGraph> = Arc::new(graph);
    let amplifier = Amplifier::new(Arc::clone(&graph), &OneMicrophone)?;

    let input = vec![0.5f32; BUFFER_SIZE];
    let mut output = vec![0.0f32; BUFFER_SIZE];
    renderer.render(&input, &mut output)?;
    assert!(output.iter().any(|&s| s != 0.0));

    amplifier.close(&OneMicrophone);
    renderer.render(&input, &mut output)?;

    assert!(output.iter().all(|&s| s == 0.0), "expected silence");

    Ok(())
}

#[test]
fn amplifier_keeps_playing_after_failed_switch() -> Result<()> {
    let (graph, mut renderer) = Graph::new(SAMPLE_RATE, BUFFER_SIZE);
    let mut amplifier = Amplifier::new(Arc::new(graph), &OneMicrophone)?;

    let missing = InputDevice {
        id: "usb:capture_1".to_string(),
        label: String::new(),
    };
    assert!(amplifier.set_input_device(&OneMicrophone, Some(missing)).is_err());

    let input = vec![0.5f32; BUFFER_SIZE];
    let mut output = vec![0.0f32; BUFFER_SIZE];
    renderer.render(&input, &mut output)?;

    assert!(output.iter().all(|&s| (s - 0.5).abs() < 1e-6));

    Ok(())
}

#[test]
fn amplifier_switch_does_not_double_the_signal() -> Result<()> {
    let (graph, mut renderer) = Graph::new(SAMPLE_RATE, BUFFER_SIZE);
    let mut amplifier = Amplifier::new(Arc::new(graph), &OneMicrophone)?;

    let input = vec![0.5f32; BUFFER_SIZE];
    let mut output = vec![0.0f32; BUFFER_SIZE];
    renderer.render(&input, &mut output)?;

    let microphone = OneMicrophone.input_devices()?.remove(0);
    amplifier.set_input_device(&OneMicrophone, Some(microphone))?;

    // The first block after the switch already sees a single source
    renderer.render(&input, &mut output)?;
    assert!(output.iter().all(|&s| (s - 0.5).abs() < 1e-6));

    Ok(())
}
