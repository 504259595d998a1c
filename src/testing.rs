//! Scripted in-memory backend for session and pump tests.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::backend::{
    BackendError, DeviceEvent, GamepadBackend, InstanceId, OpenedDevice, PadAxis, PadButton,
};
use crate::mapping::{Guid, MappingDatabase};

#[derive(Clone, Debug)]
pub struct FakeDevice {
    pub id: InstanceId,
    pub name: String,
    pub gamepad: bool,
    pub mapping: Option<String>,
    pub connected: bool,
    pub fail_open: bool,
    pub buttons: HashSet<PadButton>,
    pub axes: HashMap<PadAxis, i16>,
}

impl FakeDevice {
    pub fn mapped(id: usize) -> Self {
        Self {
            id: InstanceId(id),
            name: format!("Pad {id}"),
            gamepad: true,
            mapping: Some(format!("{},Pad {id},a:b0,b:b1,", Self::guid_for(id))),
            connected: true,
            fail_open: false,
            buttons: HashSet::new(),
            axes: HashMap::new(),
        }
    }

    pub fn unmapped(id: usize) -> Self {
        Self {
            mapping: None,
            ..Self::mapped(id)
        }
    }

    pub fn with_empty_mapping(id: usize) -> Self {
        Self {
            mapping: Some(String::new()),
            ..Self::mapped(id)
        }
    }

    pub fn joystick(id: usize) -> Self {
        Self {
            gamepad: false,
            ..Self::mapped(id)
        }
    }

    pub fn broken(id: usize) -> Self {
        Self {
            fail_open: true,
            ..Self::mapped(id)
        }
    }

    pub fn pressing(mut self, button: PadButton) -> Self {
        self.buttons.insert(button);
        self
    }

    pub fn tilting(mut self, axis: PadAxis, value: i16) -> Self {
        self.axes.insert(axis, value);
        self
    }

    pub fn guid_for(id: usize) -> Guid {
        let mut bytes = [0u8; 16];
        bytes[15] = id as u8;
        Guid(bytes)
    }
}

#[derive(Debug, Default)]
pub struct BackendState {
    pub running: bool,
    /// Upcoming `start` calls that should fail
    pub start_failures: usize,
    pub start_calls: usize,
    pub stop_calls: usize,
    pub loaded_mappings: Option<usize>,
    pub flushed: usize,
    pub devices: Vec<FakeDevice>,
    pub events: VecDeque<DeviceEvent>,
    pub opened: Vec<InstanceId>,
    pub open_calls: Vec<InstanceId>,
    pub close_calls: Vec<InstanceId>,
}

/// Backend whose state is shared with the test through cheap clones
#[derive(Clone, Debug, Default)]
pub struct ScriptedBackend {
    state: Rc<RefCell<BackendState>>,
}

impl ScriptedBackend {
    pub fn with_devices(devices: Vec<FakeDevice>) -> Self {
        let backend = Self::default();
        backend.state_mut().devices = devices;
        backend
    }

    pub fn state(&self) -> Ref<'_, BackendState> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, BackendState> {
        self.state.borrow_mut()
    }

    /// Plugs a device in and queues the matching hot-plug event
    pub fn attach(&self, device: FakeDevice) {
        let mut state = self.state_mut();
        state.events.push_back(DeviceEvent::Added(device.id));
        state.devices.push(device);
    }

    /// Unplugs a device and queues the matching hot-plug event
    pub fn detach(&self, id: InstanceId) {
        let mut state = self.state_mut();
        state.devices.retain(|d| d.id != id);
        state.events.push_back(DeviceEvent::Removed(id));
    }

    /// Marks a device disconnected without queuing an event
    pub fn go_stale(&self, id: InstanceId) {
        if let Some(device) = self.state_mut().devices.iter_mut().find(|d| d.id == id) {
            device.connected = false;
        }
    }

    pub fn push_event(&self, event: DeviceEvent) {
        self.state_mut().events.push_back(event);
    }

    fn with_device<T>(&self, id: InstanceId, read: impl FnOnce(&FakeDevice) -> T) -> Option<T> {
        let state = self.state();
        if !state.opened.contains(&id) {
            return None;
        }
        state.devices.iter().find(|d| d.id == id).map(read)
    }
}

impl GamepadBackend for ScriptedBackend {
    fn start(&mut self, mappings: Option<&MappingDatabase>) -> Result<(), BackendError> {
        let mut state = self.state_mut();
        state.start_calls += 1;
        if state.start_failures > 0 {
            state.start_failures -= 1;
            return Err(BackendError::StartError("scripted failure".to_string()));
        }
        state.running = true;
        state.loaded_mappings = mappings.map(MappingDatabase::len);
        // Devices present at startup announce themselves
        let startup: Vec<_> = state.devices.iter().map(|d| DeviceEvent::Added(d.id)).collect();
        state.events.extend(startup);
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.state_mut();
        state.stop_calls += 1;
        state.running = false;
        state.opened.clear();
        state.events.clear();
    }

    fn flush_events(&mut self) -> usize {
        let mut state = self.state_mut();
        let count = state.events.len();
        state.events.clear();
        state.flushed += count;
        count
    }

    fn devices(&self) -> Result<Vec<InstanceId>, BackendError> {
        let state = self.state();
        if !state.running {
            return Err(BackendError::NotRunning);
        }
        Ok(state.devices.iter().map(|d| d.id).collect())
    }

    fn is_gamepad(&self, id: InstanceId) -> bool {
        self.state()
            .devices
            .iter()
            .any(|d| d.id == id && d.gamepad)
    }

    fn open(&mut self, id: InstanceId) -> Result<OpenedDevice, BackendError> {
        let mut state = self.state_mut();
        state.open_calls.push(id);
        let device = state
            .devices
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| BackendError::OpenError(id, "not attached".to_string()))?;
        if device.fail_open {
            return Err(BackendError::OpenError(id, "scripted failure".to_string()));
        }
        state.opened.push(id);
        Ok(OpenedDevice {
            name: device.name,
            guid: FakeDevice::guid_for(id.0),
            mapping: device.mapping,
        })
    }

    fn close(&mut self, id: InstanceId) {
        let mut state = self.state_mut();
        state.close_calls.push(id);
        state.opened.retain(|opened| *opened != id);
    }

    fn is_connected(&self, id: InstanceId) -> bool {
        self.with_device(id, |d| d.connected).unwrap_or(false)
    }

    fn poll_event(&mut self) -> Option<DeviceEvent> {
        self.state_mut().events.pop_front()
    }

    fn button(&self, id: InstanceId, button: PadButton) -> bool {
        self.with_device(id, |d| d.buttons.contains(&button))
            .unwrap_or(false)
    }

    fn axis(&self, id: InstanceId, axis: PadAxis) -> i16 {
        self.with_device(id, |d| d.axes.get(&axis).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}
