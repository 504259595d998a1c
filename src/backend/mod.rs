//! Platform seam for gamepad access.
//!
//! The controller session only talks to a [`GamepadBackend`]. The production
//! implementation is [`gilrs::GilrsBackend`]; tests drive the session with a
//! scripted in-memory backend.
//!
//! Axis values follow the SDL convention so that snapshots look the same
//! regardless of the backend:
//!
//! - sticks report `-32768..=32767`, Y grows downward
//! - triggers report `0..=32767`

pub mod gilrs;

use std::fmt;

use crate::mapping::{Guid, MappingDatabase};

pub use self::gilrs::GilrsBackend;

/// Identifier of an attached device, stable until it is unplugged
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub usize);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hot-plug and input notifications drained from the backend queue
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceEvent {
    Added(InstanceId),
    Removed(InstanceId),
    /// Any other queued event (button, axis, ...)
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PadButton {
    South,
    East,
    West,
    North,
    Back,
    Guide,
    Start,
    LeftStick,
    RightStick,
    LeftShoulder,
    RightShoulder,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PadAxis {
    LeftX,
    LeftY,
    RightX,
    RightY,
    TriggerLeft,
    TriggerRight,
}

/// What a backend reports about a device it just opened
#[derive(Clone, Debug)]
pub struct OpenedDevice {
    pub name: String,
    pub guid: Guid,
    /// Mapping string; `None` or empty when the device has no usable layout
    pub mapping: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Failed to start input backend: {0}")]
    StartError(String),

    #[error("Input backend is not running")]
    NotRunning,

    #[error("Failed to enumerate devices: {0}")]
    EnumerationError(String),

    #[error("Failed to open device {0}: {1}")]
    OpenError(InstanceId, String),
}

/// Access to the platform's event queue and gamepad devices.
///
/// All calls are synchronous and must not block waiting for input.
pub trait GamepadBackend {
    /// Brings the event/gamepad subsystem up, registering `mappings` if given
    fn start(&mut self, mappings: Option<&MappingDatabase>) -> Result<(), BackendError>;

    /// Tears the subsystem down and releases every open device
    fn stop(&mut self);

    /// Discards all queued events, returning how many were dropped
    fn flush_events(&mut self) -> usize;

    /// Attached devices in platform enumeration order
    fn devices(&self) -> Result<Vec<InstanceId>, BackendError>;

    /// Whether the device exposes a gamepad-style layout
    fn is_gamepad(&self, id: InstanceId) -> bool;

    fn open(&mut self, id: InstanceId) -> Result<OpenedDevice, BackendError>;

    fn close(&mut self, id: InstanceId);

    fn is_connected(&self, id: InstanceId) -> bool;

    /// Pops the oldest queued event, `None` once the queue is empty
    fn poll_event(&mut self) -> Option<DeviceEvent>;

    fn button(&self, id: InstanceId, button: PadButton) -> bool;

    fn axis(&self, id: InstanceId, axis: PadAxis) -> i16;
}
