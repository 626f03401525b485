//! JACK host: the realtime side of the graph plus device negotiation.

pub mod jack;
pub mod manager;
pub mod ports;

pub use manager::{JackPermission, Manager};
