pub mod app;
pub mod components;
pub mod messages;

pub use app::MicAmpApp;
pub use messages::Message;

use crate::settings::Settings;

pub fn start(settings: Settings) -> iced::Result {
    iced::application(
        move || MicAmpApp::new(settings.clone()),
        MicAmpApp::update,
        MicAmpApp::view,
    )
    .title("micamp")
    .subscription(MicAmpApp::subscription)
    .theme(MicAmpApp::theme)
    .window_size((800.0, 600.0))
    .run()
}
