use anyhow::Result;
use std::fmt::Display;

/// Describes one audio input the host can capture from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDevice {
    /// Host-specific identifier, stable for the session.
    pub id: String,
    /// Human readable name. May be empty.
    pub label: String,
}

impl Display for InputDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.label.is_empty() {
            write!(f, "(No name)")
        } else {
            write!(f, "{}", self.label)
        }
    }
}

/// A live capture bound to one physical input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputStream {
    pub device_id: String,
}

/// Device negotiation offered by the host.
pub trait DeviceAccess {
    fn input_devices(&self) -> Result<Vec<InputDevice>>;

    /// Starts capturing from `device`, or from the host default when `None`.
    fn open_input(&self, device: Option<&InputDevice>) -> Result<InputStream>;

    fn close_input(&self, stream: &InputStream);
}
