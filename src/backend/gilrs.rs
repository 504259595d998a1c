//! [`GamepadBackend`] on top of gilrs.
//!
//! gilrs keeps every attached pad open internally from the moment it is
//! detected; "opening" a device only marks it as claimed by the session.

use std::collections::HashSet;

use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs, GilrsBuilder, MappingSource};
use tracing::{debug, info, warn};

use super::{BackendError, DeviceEvent, GamepadBackend, InstanceId, OpenedDevice, PadAxis, PadButton};
use crate::mapping::{Guid, MappingDatabase};

/// Device state is refreshed as events are drained through
/// [`GamepadBackend::poll_event`].
#[derive(Default)]
pub struct GilrsBackend {
    gilrs: Option<Gilrs>,
    mappings: Option<MappingDatabase>,
    opened: HashSet<InstanceId>,
}

impl GilrsBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn resolve(&self, id: InstanceId) -> Option<GamepadId> {
        self.gilrs
            .as_ref()?
            .gamepads()
            .map(|(gamepad_id, _)| gamepad_id)
            .find(|gamepad_id| usize::from(*gamepad_id) == id.0)
    }

    fn claimed_gamepad(&self, id: InstanceId) -> Option<Gamepad<'_>> {
        if !self.opened.contains(&id) {
            return None;
        }
        let gamepad_id = self.resolve(id)?;
        self.gilrs.as_ref()?.connected_gamepad(gamepad_id)
    }

}

/// Mapping string reported for a device, `None` when gilrs has no layout
/// for it
fn mapping_string(
    source: MappingSource,
    guid: &Guid,
    name: &str,
    db: Option<&MappingDatabase>,
) -> Option<String> {
    match source {
        MappingSource::SdlMappings => Some(
            db.and_then(|db| db.lookup(guid))
                .map(str::to_owned)
                .unwrap_or_else(|| format!("{},{},builtin", guid, name)),
        ),
        MappingSource::Driver => Some(format!("{},{},driver", guid, name)),
        _ => None,
    }
}

impl GamepadBackend for GilrsBackend {
    fn start(&mut self, mappings: Option<&MappingDatabase>) -> Result<(), BackendError> {
        if self.gilrs.is_some() {
            debug!("gilrs already running");
            return Ok(());
        }

        let mut builder = GilrsBuilder::new().set_update_state(true);
        if let Some(db) = mappings {
            builder = builder.add_mappings(&db.as_text());
        }

        match builder.build() {
            Ok(gilrs) => {
                info!("Successfully initialized gilrs");
                self.gilrs = Some(gilrs);
                self.mappings = mappings.cloned();
                Ok(())
            }
            Err(gilrs::Error::NotImplemented(_)) => Err(BackendError::StartError(
                "gamepad input is not supported on this platform".to_string(),
            )),
            Err(e) => Err(BackendError::StartError(e.to_string())),
        }
    }

    fn stop(&mut self) {
        self.opened.clear();
        self.mappings = None;
        if self.gilrs.take().is_some() {
            debug!("gilrs context dropped");
        }
    }

    fn flush_events(&mut self) -> usize {
        let Some(gilrs) = self.gilrs.as_mut() else {
            return 0;
        };
        let mut flushed = 0;
        while gilrs.next_event().is_some() {
            flushed += 1;
        }
        flushed
    }

    fn devices(&self) -> Result<Vec<InstanceId>, BackendError> {
        let gilrs = self.gilrs.as_ref().ok_or(BackendError::NotRunning)?;
        Ok(gilrs
            .gamepads()
            .map(|(gamepad_id, _)| InstanceId(usize::from(gamepad_id)))
            .collect())
    }

    // gilrs only surfaces devices it already classifies as gamepads
    fn is_gamepad(&self, id: InstanceId) -> bool {
        self.resolve(id).is_some()
    }

    fn open(&mut self, id: InstanceId) -> Result<OpenedDevice, BackendError> {
        let gilrs = self.gilrs.as_ref().ok_or(BackendError::NotRunning)?;
        let gamepad_id = self
            .resolve(id)
            .ok_or_else(|| BackendError::OpenError(id, "device is not attached".to_string()))?;
        let gamepad = gilrs
            .connected_gamepad(gamepad_id)
            .ok_or_else(|| BackendError::OpenError(id, "device is not connected".to_string()))?;

        let guid = Guid(gamepad.uuid());
        let db = self.mappings.as_ref();
        if let Some(db_name) = db.and_then(|db| db.name_of(&guid)) {
            debug!("Mapping database lists {} as {:?}", guid, db_name);
        }
        let opened = OpenedDevice {
            name: gamepad.name().to_string(),
            guid,
            mapping: mapping_string(gamepad.mapping_source(), &guid, gamepad.name(), db),
        };

        self.opened.insert(id);
        Ok(opened)
    }

    fn close(&mut self, id: InstanceId) {
        if !self.opened.remove(&id) {
            warn!("Closing device {} that was not open", id);
        }
    }

    fn is_connected(&self, id: InstanceId) -> bool {
        self.claimed_gamepad(id)
            .map(|gamepad| gamepad.is_connected())
            .unwrap_or(false)
    }

    fn poll_event(&mut self) -> Option<DeviceEvent> {
        let Event { id, event, .. } = self.gilrs.as_mut()?.next_event()?;
        let instance = InstanceId(usize::from(id));

        Some(match event {
            EventType::Connected => DeviceEvent::Added(instance),
            EventType::Disconnected => DeviceEvent::Removed(instance),
            _ => DeviceEvent::Other,
        })
    }

    fn button(&self, id: InstanceId, button: PadButton) -> bool {
        self.claimed_gamepad(id)
            .map(|gamepad| gamepad.is_pressed(map_button(button)))
            .unwrap_or(false)
    }

    fn axis(&self, id: InstanceId, axis: PadAxis) -> i16 {
        let Some(gamepad) = self.claimed_gamepad(id) else {
            return 0;
        };

        match axis {
            PadAxis::LeftX => stick_to_raw(gamepad.value(Axis::LeftStickX)),
            PadAxis::LeftY => stick_y_to_raw(gamepad.value(Axis::LeftStickY)),
            PadAxis::RightX => stick_to_raw(gamepad.value(Axis::RightStickX)),
            PadAxis::RightY => stick_y_to_raw(gamepad.value(Axis::RightStickY)),
            PadAxis::TriggerLeft => trigger_to_raw(trigger_value(&gamepad, Button::LeftTrigger2)),
            PadAxis::TriggerRight => {
                trigger_to_raw(trigger_value(&gamepad, Button::RightTrigger2))
            }
        }
    }
}

fn trigger_value(gamepad: &Gamepad<'_>, button: Button) -> f32 {
    gamepad
        .button_data(button)
        .map(|data| data.value())
        .unwrap_or(0.0)
}

// gilrs names the shoulders LeftTrigger/RightTrigger and the analog triggers *2
fn map_button(button: PadButton) -> Button {
    match button {
        PadButton::South => Button::South,
        PadButton::East => Button::East,
        PadButton::West => Button::West,
        PadButton::North => Button::North,
        PadButton::Back => Button::Select,
        PadButton::Guide => Button::Mode,
        PadButton::Start => Button::Start,
        PadButton::LeftStick => Button::LeftThumb,
        PadButton::RightStick => Button::RightThumb,
        PadButton::LeftShoulder => Button::LeftTrigger,
        PadButton::RightShoulder => Button::RightTrigger,
        PadButton::DPadUp => Button::DPadUp,
        PadButton::DPadDown => Button::DPadDown,
        PadButton::DPadLeft => Button::DPadLeft,
        PadButton::DPadRight => Button::DPadRight,
    }
}

/// Converts a gilrs stick value (-1.0..=1.0) to the raw SDL range
fn stick_to_raw(value: f32) -> i16 {
    (value * 32768.0).round().clamp(-32768.0, 32767.0) as i16
}

/// Converts a gilrs stick Y value (up is positive) to SDL's downward Y
fn stick_y_to_raw(value: f32) -> i16 {
    stick_to_raw(-value)
}

/// Converts a gilrs trigger value (0.0..=1.0) to the raw SDL range
fn trigger_to_raw(value: f32) -> i16 {
    (value * 32767.0).round().clamp(0.0, 32767.0) as i16
}
