use iced::widget::{button, column, container, rule, text};
use iced::{Color, Element, Length};

use crate::gui::messages::Message;
use crate::permission::PermissionState;

const RED: Color = Color::from_rgb(1.0, 0.4, 0.4);

/// First screen: explains what micamp needs and opens the audio host.
#[derive(Debug, Default)]
pub struct SetupDialog {
    continue_clicked: bool,
    error: Option<String>,
}

impl SetupDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn continue_clicked(&mut self) {
        self.continue_clicked = true;
        self.error = None;
    }

    pub fn set_error(&mut self, error: String) {
        self.error = Some(error);
    }

    /// Stays up until the user continued, the amplifier exists and access is
    /// not known to be refused.
    pub fn is_visible(&self, permission: Option<PermissionState>, ready: bool) -> bool {
        !self.continue_clicked
            || !ready
            || permission.is_some_and(|state| state != PermissionState::Granted)
    }

    pub fn view(
        &self,
        permission: Option<PermissionState>,
        ready: bool,
    ) -> Option<Element<'static, Message>> {
        if !self.is_visible(permission, ready) {
            return None;
        }

        let title = text("Microphone Amplifier")
            .size(24)
            .style(|theme: &iced::Theme| iced::widget::text::Style {
                color: Some(theme.palette().text),
            });

        let mut content = column![
            title,
            rule::horizontal(1),
            text(prompt(permission)).size(16),
        ]
        .spacing(15);

        if permission == Some(PermissionState::Denied) {
            content = content.push(
                text("Access to the audio server was refused. Check that your user may connect to JACK, then try again.")
                    .size(14)
                    .style(|_: &iced::Theme| iced::widget::text::Style { color: Some(RED) }),
            );
        }

        if let Some(error) = &self.error {
            content = content.push(text(error.clone()).size(14).style(
                |_: &iced::Theme| iced::widget::text::Style { color: Some(RED) },
            ));
        }

        content = content.push(
            button("Continue")
                .on_press(Message::ContinueClicked)
                .style(iced::widget::button::success),
        );

        let dialog = container(content.padding(20).max_width(480.0)).style(|theme: &iced::Theme| {
            container::Style::default()
                .background(theme.palette().background)
                .border(iced::Border::default().rounded(10).width(2))
        });

        Some(
            container(dialog)
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into(),
        )
    }
}

fn prompt(permission: Option<PermissionState>) -> &'static str {
    match permission {
        None => {
            "micamp plays your microphone through your speakers. Press Continue to connect to the audio server."
        }
        Some(_) => {
            "micamp needs access to your microphone. Press Continue to allow it and start the amplifier."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_until_continue() {
        let dialog = SetupDialog::new();
        assert!(dialog.is_visible(Some(PermissionState::Granted), true));
    }

    #[test]
    fn test_hidden_once_running_with_access() {
        let mut dialog = SetupDialog::new();
        dialog.continue_clicked();

        assert!(!dialog.is_visible(Some(PermissionState::Granted), true));
        assert!(!dialog.is_visible(None, true));
    }

    #[test]
    fn test_stays_while_refused_or_not_ready() {
        let mut dialog = SetupDialog::new();
        dialog.continue_clicked();

        assert!(dialog.is_visible(Some(PermissionState::Denied), true));
        assert!(dialog.is_visible(Some(PermissionState::Prompt), true));
        assert!(dialog.is_visible(Some(PermissionState::Granted), false));
    }

    #[test]
    fn test_prompt_differs_when_indeterminate() {
        assert_ne!(prompt(None), prompt(Some(PermissionState::Prompt)));
    }
}
