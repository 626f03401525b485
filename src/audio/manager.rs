use anyhow::{Context, Result, anyhow, bail};
use jack::{AsyncClient, Client, ClientOptions, ClientStatus, PortFlags};
use log::{debug, error, info, warn};
use std::sync::Arc;

use crate::amp::devices::{DeviceAccess, InputDevice, InputStream};
use crate::audio::jack::{NotificationHandler, ProcessHandler};
use crate::audio::ports::{CLIENT_NAME, IN_PORT, OUT_PORT_LEFT, OUT_PORT_RIGHT, full_name};
use crate::graph::{AudioGraph, Graph};
use crate::permission::{PermissionQuery, PermissionState};
use crate::settings::{AudioSettings, Settings};

/// Owns the running JACK client and the control half of the audio graph.
pub struct Manager {
    active_client: AsyncClient<NotificationHandler, ProcessHandler>,
    graph: Arc<Graph>,
    current_settings: Settings,
}

impl Manager {
    pub fn new(settings: &Settings) -> Result<Self> {
        let (client, _) = Client::new(CLIENT_NAME, ClientOptions::NO_START_SERVER)
            .context("failed to create JACK client")?;

        let sample_rate = client.sample_rate() as usize;
        let buffer_size = client.buffer_size() as usize;
        info!("JACK running at {sample_rate} Hz, {buffer_size} frames");

        let (graph, renderer) = Graph::new(sample_rate, buffer_size);
        let jack_handler =
            ProcessHandler::new(&client, renderer).context("failed to create process handler")?;

        let active_client = client
            .activate_async(NotificationHandler, jack_handler)
            .context("failed to activate async client")?;

        let manager = Self {
            active_client,
            graph: Arc::new(graph),
            current_settings: settings.clone(),
        };

        manager.connect_outputs(&settings.audio);

        Ok(manager)
    }

    /// Connect playback ports based on settings. Capture is connected by
    /// [`DeviceAccess::open_input`].
    fn connect_outputs(&self, settings: &AudioSettings) {
        let client = self.active_client.as_client();

        for (ours, theirs) in [
            (OUT_PORT_LEFT, &settings.output_left_port),
            (OUT_PORT_RIGHT, &settings.output_right_port),
        ] {
            let ours = full_name(ours);
            if let Err(e) = client.connect_ports_by_name(&ours, theirs) {
                warn!("Failed to connect output port '{theirs}': {e}");
            } else {
                info!("Connected output: {ours} -> {theirs}");
            }
        }
    }

    pub fn graph(&self) -> Arc<dyn AudioGraph> {
        Arc::clone(&self.graph) as Arc<dyn AudioGraph>
    }

    pub fn settings(&self) -> &Settings {
        &self.current_settings
    }

    pub fn sample_rate(&self) -> usize {
        self.active_client.as_client().sample_rate() as usize
    }

    pub fn buffer_size(&self) -> usize {
        self.active_client.as_client().buffer_size() as usize
    }

    /// Physical capture ports, excluding our own.
    fn capture_ports(&self) -> Vec<String> {
        self.active_client
            .as_client()
            .ports(
                None,
                Some("audio"),
                PortFlags::IS_OUTPUT | PortFlags::IS_PHYSICAL,
            )
            .into_iter()
            .filter(|p| !p.starts_with(&format!("{CLIENT_NAME}:")))
            .collect()
    }

    /// The configured input port when it exists, else the first capture port.
    fn default_input(&self) -> Result<String> {
        let configured = &self.current_settings.audio.input_port;
        let client = self.active_client.as_client();

        if client.port_by_name(configured).is_some() {
            return Ok(configured.clone());
        }

        debug!("Configured input '{configured}' not found, using first capture port");
        self.capture_ports()
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no audio capture ports available"))
    }

    fn is_connected(&self, port: &str) -> bool {
        self.active_client
            .as_client()
            .port_by_name(&full_name(IN_PORT))
            .and_then(|ours| ours.is_connected_to(port).ok())
            .unwrap_or(false)
    }
}

impl DeviceAccess for Manager {
    fn input_devices(&self) -> Result<Vec<InputDevice>> {
        let client = self.active_client.as_client();

        Ok(self
            .capture_ports()
            .into_iter()
            .map(|id| {
                let label = client
                    .port_by_name(&id)
                    .and_then(|port| port.aliases().ok())
                    .and_then(|aliases| aliases.into_iter().next())
                    .unwrap_or_default();
                InputDevice { id, label }
            })
            .collect())
    }

    fn open_input(&self, device: Option<&InputDevice>) -> Result<InputStream> {
        let device_id = match device {
            Some(device) => device.id.clone(),
            None => self.default_input()?,
        };

        let client = self.active_client.as_client();
        if client.port_by_name(&device_id).is_none() {
            bail!("input port '{device_id}' does not exist");
        }

        let ours = full_name(IN_PORT);
        if self.is_connected(&device_id) {
            debug!("{device_id} already feeds {ours}");
        } else {
            client
                .connect_ports_by_name(&device_id, &ours)
                .with_context(|| format!("failed to connect input port '{device_id}'"))?;
            info!("Connected input: {device_id} -> {ours}");
        }

        Ok(InputStream { device_id })
    }

    fn close_input(&self, stream: &InputStream) {
        let ours = full_name(IN_PORT);
        if let Err(e) = self
            .active_client
            .as_client()
            .disconnect_ports_by_name(&stream.device_id, &ours)
        {
            error!("Failed to disconnect {}: {e}", stream.device_id);
        } else {
            info!("Disconnected input: {} -> {ours}", stream.device_id);
        }
    }
}

/// Asks the JACK server whether a client may join.
///
/// JACK has no prompt step, so this only ever answers granted or denied.
pub struct JackPermission;

impl PermissionQuery for JackPermission {
    fn query(&self) -> Result<PermissionState> {
        match Client::new(&format!("{CLIENT_NAME}-probe"), ClientOptions::NO_START_SERVER) {
            Ok(_) => Ok(PermissionState::Granted),
            Err(jack::Error::ClientError(status)) if status.contains(ClientStatus::SERVER_FAILED) => {
                Err(anyhow!("no JACK server reachable ({status:?})"))
            }
            Err(jack::Error::ClientError(status)) => {
                debug!("JACK refused probe client: {status:?}");
                Ok(PermissionState::Denied)
            }
            Err(e) => Err(e).context("failed to probe JACK server"),
        }
    }
}
