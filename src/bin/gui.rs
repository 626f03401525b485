use anyhow::{Context, Result};
use log::info;
use micamp::gui::start;
use micamp::settings::Settings;

pub fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    info!("micamp GUI v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load().context("failed to load settings")?;
    info!("{settings}");
    settings.apply_to_environment();

    for key in ["PIPEWIRE_LATENCY", "JACK_PROMISCUOUS_SERVER"] {
        if let Ok(val) = std::env::var(key) {
            info!("{key} = {val}");
        }
    }

    start(settings).map_err(|e| anyhow::anyhow!("GUI error: {e}"))?;

    Ok(())
}
