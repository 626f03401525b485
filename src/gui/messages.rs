use iced::Point;
use std::fmt::Display;

use crate::amp::InputDevice;

/// An entry of the input selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceChoice {
    Default,
    Device(InputDevice),
}

impl Display for DeviceChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceChoice::Default => write!(f, "Default"),
            DeviceChoice::Device(device) => write!(f, "{device}"),
        }
    }
}

impl From<DeviceChoice> for Option<InputDevice> {
    fn from(choice: DeviceChoice) -> Self {
        match choice {
            DeviceChoice::Default => None,
            DeviceChoice::Device(device) => Some(device),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    // Setup
    ContinueClicked,

    // Input selection
    InputDeviceSelected(DeviceChoice),
    RefreshDevices,

    // Rotary encoders, keyed by effect index
    EncoderPressed(usize),
    EncoderMoved(usize, Point),
    EncoderReleased,

    FrameTick,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_choice_labels() {
        let named = DeviceChoice::Device(InputDevice {
            id: "system:capture_1".to_string(),
            label: "Built-in Mic".to_string(),
        });
        let unnamed = DeviceChoice::Device(InputDevice {
            id: "system:capture_2".to_string(),
            label: String::new(),
        });

        assert_eq!(DeviceChoice::Default.to_string(), "Default");
        assert_eq!(named.to_string(), "Built-in Mic");
        assert_eq!(unnamed.to_string(), "(No name)");
        assert_eq!(Option::<InputDevice>::from(DeviceChoice::Default), None);
    }
}
