use iced::widget::{button, pick_list, row, text};
use iced::{Alignment, Element, Length};

use crate::amp::InputDevice;
use crate::gui::messages::{DeviceChoice, Message};

/// "Default" followed by every device the host reports.
pub fn choices(devices: &[InputDevice]) -> Vec<DeviceChoice> {
    std::iter::once(DeviceChoice::Default)
        .chain(devices.iter().cloned().map(DeviceChoice::Device))
        .collect()
}

pub fn input_select<'a>(
    devices: &[InputDevice],
    selected: Option<&InputDevice>,
) -> Element<'a, Message> {
    let selected = selected.map_or(DeviceChoice::Default, |d| DeviceChoice::Device(d.clone()));

    row![
        text("Input:").width(Length::Fixed(60.0)),
        pick_list(choices(devices), Some(selected), Message::InputDeviceSelected)
            .width(Length::Fill),
        button("Refresh").on_press(Message::RefreshDevices),
    ]
    .spacing(10)
    .align_y(Alignment::Center)
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_comes_first() {
        let devices = vec![InputDevice {
            id: "system:capture_1".to_string(),
            label: "Built-in".to_string(),
        }];

        let choices = choices(&devices);

        assert_eq!(choices.len(), 2);
        assert_eq!(choices[0], DeviceChoice::Default);
        assert_eq!(choices[1], DeviceChoice::Device(devices[0].clone()));
    }
}
