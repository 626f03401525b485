use anyhow::{Context, Result};
use iced::widget::{column, container, row};
use iced::{Element, Length, Subscription, Task, Theme, time, time::Duration};
use log::{error, info, warn};

use crate::amp::{Amplifier, DeviceAccess, InputDevice};
use crate::audio::{JackPermission, Manager};
use crate::effects::Effect;
use crate::gui::components::effect_panel::{drag_effect, effect_panel};
use crate::gui::components::input_select::input_select;
use crate::gui::components::setup_dialog::SetupDialog;
use crate::gui::messages::Message;
use crate::permission::MicrophonePermissionService;
use crate::settings::Settings;

/// The running audio host and the amplifier playing through it.
///
/// Field order matters: the amplifier leaves the graph before the JACK
/// client shuts down.
struct Session {
    amplifier: Amplifier,
    manager: Manager,
}

impl Session {
    fn open(settings: &Settings) -> Result<Self> {
        let manager = Manager::new(settings).context("failed to open the audio host")?;
        let amplifier =
            Amplifier::with_refresh_rate(manager.graph(), &manager, settings.ui.refresh_rate_hz)
                .context("failed to create the amplifier")?;

        Ok(Self { amplifier, manager })
    }
}

#[derive(Debug, Clone, Copy)]
struct EncoderDrag {
    idx: usize,
    last_y: Option<f32>,
}

pub struct MicAmpApp {
    settings: Settings,
    permission: MicrophonePermissionService,
    setup_dialog: SetupDialog,
    session: Option<Session>,
    devices: Vec<InputDevice>,
    drag: Option<EncoderDrag>,
}

impl MicAmpApp {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            permission: MicrophonePermissionService::new(Box::new(JackPermission)),
            setup_dialog: SetupDialog::new(),
            session: None,
            devices: Vec::new(),
            drag: None,
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let ready = self.session.is_some();

        if let Some(dialog) = self.setup_dialog.view(self.permission.state(), ready) {
            return dialog;
        }

        let Some(session) = &self.session else {
            return container(column![]).into();
        };
        let amplifier = &session.amplifier;

        let mut charts = column![].spacing(10);
        let mut controls = row![].spacing(10);
        for (idx, effect) in amplifier.effects().iter().enumerate() {
            match effect {
                Effect::FrequencyVisualiser(_) => charts = charts.push(effect_panel(idx, effect)),
                Effect::Gain(_) | Effect::Volume(_) => {
                    controls = controls.push(effect_panel(idx, effect));
                }
            }
        }

        let main_content = column![
            input_select(&self.devices, amplifier.input_device()),
            charts,
            controls,
        ]
        .spacing(20)
        .padding(20);

        container(main_content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    pub fn theme(&self) -> Theme {
        Theme::TokyoNight
    }

    pub fn subscription(&self) -> Subscription<Message> {
        if self.session.is_none() {
            return Subscription::none();
        }

        let interval = Duration::from_secs_f64(1.0 / f64::from(self.settings.ui.refresh_rate_hz.max(1)));
        time::every(interval).map(|_| Message::FrameTick)
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ContinueClicked => self.handle_continue(),
            Message::InputDeviceSelected(choice) => {
                if let Some(session) = &mut self.session
                    && let Err(e) = session
                        .amplifier
                        .set_input_device(&session.manager, choice.into())
                {
                    error!("Failed to switch input device: {e:#}");
                }
            }
            Message::RefreshDevices => self.refresh_devices(),
            Message::EncoderPressed(idx) => {
                self.drag = Some(EncoderDrag { idx, last_y: None });
            }
            Message::EncoderMoved(idx, point) => self.handle_drag(idx, point.y),
            Message::EncoderReleased => self.drag = None,
            // Redraw only, the visualiser publishes on its own
            Message::FrameTick => {}
        }

        Task::none()
    }

    fn handle_continue(&mut self) {
        self.setup_dialog.continue_clicked();

        if self.session.is_none() {
            match Session::open(&self.settings) {
                Ok(session) => {
                    info!("Amplifier started");
                    self.session = Some(session);
                    self.refresh_devices();
                }
                Err(e) => {
                    error!("Failed to start amplifier: {e:#}");
                    self.setup_dialog.set_error(format!("{e:#}"));
                }
            }
        }

        self.permission.refresh();
    }

    fn refresh_devices(&mut self) {
        let Some(session) = &self.session else {
            return;
        };

        match session.manager.input_devices() {
            Ok(devices) => self.devices = devices,
            Err(e) => warn!("Failed to list input devices: {e:#}"),
        }
    }

    fn handle_drag(&mut self, idx: usize, y: f32) {
        let Some(drag) = self.drag.as_mut().filter(|drag| drag.idx == idx) else {
            return;
        };

        if let Some(last_y) = drag.last_y
            && let Some(session) = &self.session
            && let Some(effect) = session.amplifier.effects().get(idx)
        {
            drag_effect(effect, y - last_y);
        }
        drag.last_y = Some(y);
    }
}
