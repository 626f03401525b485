use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use micamp::amp::{Amplifier, DeviceAccess, InputDevice};
use micamp::audio::Manager;
use micamp::effects::{
    Effect, EffectVisitor, FrequencySample, FrequencyVisualiserEffect, GainEffect, VolumeEffect,
};
use micamp::settings::Settings;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

#[derive(Parser, Debug)]
#[command(name = "micamp-cli")]
#[command(version)]
#[command(about = "Plays a microphone through gain and volume, without a window.")]
struct Args {
    #[arg(long, help = "List capture devices and exit")]
    list_devices: bool,
    #[arg(long, env = "MICAMP_INPUT", help = "Capture port to use instead of the default")]
    input: Option<String>,
    #[arg(long, default_value_t = 1.0, help = "Gain applied to the microphone")]
    gain: f32,
    #[arg(long, default_value_t = 1.0, help = "Output volume, 0 to 1")]
    volume: f32,
}

/// One log line per effect.
struct Describe;

impl EffectVisitor for Describe {
    type Output = String;

    fn visit_gain(&mut self, effect: &GainEffect) -> String {
        format!("[{}] gain {:.2}", effect.id(), effect.gain())
    }

    fn visit_volume(&mut self, effect: &VolumeEffect) -> String {
        format!("[{}] volume {:.2}", effect.id(), effect.volume())
    }

    fn visit_frequency_visualiser(&mut self, effect: &FrequencyVisualiserEffect) -> String {
        format!(
            "[{}] frequency visualiser, {} bins",
            effect.id(),
            effect.node().frequency_bin_count()
        )
    }
}

fn dominant(samples: &[FrequencySample]) -> Option<FrequencySample> {
    samples
        .iter()
        .copied()
        .max_by(|a, b| a.volume.total_cmp(&b.volume))
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    info!("micamp v{}", env!("CARGO_PKG_VERSION"));
    info!("Args: {args:?}");

    let settings = Settings::load().context("failed to load settings")?;
    settings.apply_to_environment();

    let manager = Manager::new(&settings).context("failed to create Manager")?;

    if args.list_devices {
        for device in manager.input_devices()? {
            println!("{}\t{device}", device.id);
        }
        return Ok(());
    }

    let mut amplifier =
        Amplifier::with_refresh_rate(manager.graph(), &manager, settings.ui.refresh_rate_hz)
            .context("failed to create amplifier")?;

    if let Some(input) = args.input {
        let device = manager
            .input_devices()?
            .into_iter()
            .find(|d| d.id == input)
            .unwrap_or_else(|| InputDevice {
                id: input,
                label: String::new(),
            });
        amplifier
            .set_input_device(&manager, Some(device))
            .context("failed to select input")?;
    }

    for effect in amplifier.effects() {
        match effect {
            Effect::Gain(gain) => gain.set_gain(args.gain),
            Effect::Volume(volume) => volume.set_volume(args.volume.clamp(0.0, 1.0)),
            Effect::FrequencyVisualiser(_) => {}
        }
        info!("{}", effect.accept(&mut Describe));
    }

    let running = Arc::new(AtomicBool::new(true));
    let shutdown_flag = Arc::clone(&running);

    ctrlc::set_handler(move || {
        info!("Ctrl+C received, shutting down...");
        shutdown_flag.store(false, Ordering::SeqCst);
    })
    .context("error setting Ctrl+C handler")?;

    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_secs(1));

        for effect in amplifier.effects() {
            if let Effect::FrequencyVisualiser(visualiser) = effect
                && let Some(peak) = dominant(&visualiser.frequencies())
            {
                info!("Dominant frequency: {:.0} Hz ({:.1} dB)", peak.frequency, peak.volume);
            }
        }
    }

    amplifier.close(&manager);

    Ok(())
}
