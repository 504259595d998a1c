//! Controller session: lifecycle of the single active gamepad.
//!
//! The session owns the input backend and at most one open device. All
//! operations are idempotent and infallible from the caller's point of view;
//! failures are logged and leave the session either empty or unchanged.
//! A missing or unplugged controller is a normal state, not an error.

use std::path::PathBuf;

use tracing::{debug, error, info, warn};

use super::error::SessionError;
use super::system::{InputSystem, Offline, Online};
use crate::backend::{GamepadBackend, InstanceId};
use crate::mapping::Guid;

pub(super) enum SystemLifecycle {
    Offline(InputSystem<Offline>),
    Online(InputSystem<Online>),
}

/// The device currently claimed by the session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveDevice {
    pub instance_id: InstanceId,
    /// Position in the enumeration the device was picked from
    pub index: usize,
    pub name: String,
    pub guid: Guid,
    pub mapping: String,
}

pub struct ControllerSession {
    // Only `None` while a lifecycle transition is in flight
    pub(super) system: Option<SystemLifecycle>,
    pub(super) device: Option<ActiveDevice>,
}

impl ControllerSession {
    /// Creates an uninitialized session. Nothing touches the platform until
    /// [`initialize`](Self::initialize) or the first poll.
    pub fn new(backend: Box<dyn GamepadBackend>, mapping_db: impl Into<PathBuf>) -> Self {
        Self {
            system: Some(SystemLifecycle::Offline(InputSystem::create(
                backend,
                mapping_db.into(),
            ))),
            device: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.system, Some(SystemLifecycle::Online(_)))
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    pub fn active_device(&self) -> Option<&ActiveDevice> {
        self.device.as_ref()
    }

    pub(super) fn online(&self) -> Option<&InputSystem<Online>> {
        match &self.system {
            Some(SystemLifecycle::Online(system)) => Some(system),
            _ => None,
        }
    }

    pub(super) fn online_mut(&mut self) -> Option<&mut InputSystem<Online>> {
        match &mut self.system {
            Some(SystemLifecycle::Online(system)) => Some(system),
            _ => None,
        }
    }

    /// Brings the input subsystem up once; later calls only log.
    pub fn initialize(&mut self) {
        if self.is_initialized() {
            info!("Attempted initialize, but the input subsystem is already initialized");
            return;
        }
        info!("Initializing");

        match self.system.take() {
            Some(SystemLifecycle::Offline(system)) => match system.bring_up() {
                Ok(online) => {
                    self.system = Some(SystemLifecycle::Online(online));
                    info!("    ...done");
                }
                Err((offline, e)) => {
                    error!("    Input subsystem has failed to initialize: {}", e);
                    self.system = Some(SystemLifecycle::Offline(offline));
                }
            },
            other => self.system = other,
        }
    }

    /// Closes any open device, then stops the input subsystem.
    pub fn deinitialize(&mut self) {
        if !self.is_initialized() {
            return;
        }
        info!("Deinitializing");

        self.close();
        match self.system.take() {
            Some(SystemLifecycle::Online(system)) => {
                self.system = Some(SystemLifecycle::Offline(system.shut_down()));
            }
            other => self.system = other,
        }
    }

    /// Opens the first viable gamepad unless a connected one is already open.
    ///
    /// Initializes the subsystem first when needed. A held device that has
    /// gone stale is closed and replaced.
    pub fn open(&mut self) {
        info!("Attempting to open a controller");

        if !self.is_initialized() {
            info!("...but the input subsystem is not initialized yet");
            self.initialize();
        }

        match self.try_open() {
            Ok(()) => {}
            Err(SessionError::AlreadyOpen) => {
                info!("Failed to open a controller: {}", SessionError::AlreadyOpen)
            }
            Err(SessionError::NoViableDevice) => {
                info!("    {}", SessionError::NoViableDevice)
            }
            Err(e) => warn!("Failed to open a controller: {}", e),
        }
    }

    /// Releases the open device, if any.
    pub fn close(&mut self) {
        if !self.is_initialized() {
            // Stray handle from a torn-down backend, nothing to release
            self.device = None;
            return;
        }

        let Some(device) = self.device.take() else {
            return;
        };

        info!("Closing current controller");
        if let Some(system) = self.online_mut() {
            system.backend_mut().close(device.instance_id);
        }
    }

    fn try_open(&mut self) -> Result<(), SessionError> {
        let held_connected = {
            let system = self.online().ok_or(SessionError::NotInitialized)?;
            self.device
                .as_ref()
                .map(|device| system.backend().is_connected(device.instance_id))
        };

        match held_connected {
            Some(true) => return Err(SessionError::AlreadyOpen),
            Some(false) => {
                debug!("Held controller is no longer connected, replacing it");
                self.close();
            }
            None => {}
        }

        let system = self.online_mut().ok_or(SessionError::NotInitialized)?;
        let device = open_first_viable(system.backend_mut())?;
        self.device = Some(device);
        Ok(())
    }
}

impl Drop for ControllerSession {
    fn drop(&mut self) {
        self.deinitialize();
    }
}

/// Scans attached devices in enumeration order and keeps the first gamepad
/// that opens and reports a non-empty mapping. Unmapped gamepads are closed
/// again and skipped.
fn open_first_viable(backend: &mut dyn GamepadBackend) -> Result<ActiveDevice, SessionError> {
    let devices = backend.devices().unwrap_or_else(|e| {
        warn!("    Couldn't get joysticks: {}", e);
        Vec::new()
    });
    info!("    # of joysticks: {}", devices.len());

    for (index, id) in devices.into_iter().enumerate() {
        if !backend.is_gamepad(id) {
            debug!("    Joystick {} is not a gamepad", index);
            continue;
        }

        let opened = match backend.open(id) {
            Ok(opened) => opened,
            Err(e) => {
                warn!("    Couldn't use joystick {}: {}", index, e);
                continue;
            }
        };

        info!("    Found a viable controller: {} (joystick {})", opened.name, index);
        info!("        Joystick instance ID: {}", id);
        info!("        Joystick GUID: {}", opened.guid);

        match opened.mapping.filter(|mapping| !mapping.is_empty()) {
            Some(mapping) => {
                info!("        Controller mapping: {}", mapping);
                return Ok(ActiveDevice {
                    instance_id: id,
                    index,
                    name: opened.name,
                    guid: opened.guid,
                    mapping,
                });
            }
            None => {
                warn!("        This controller has no mapping! Closing it");
                backend.close(id);
            }
        }
    }

    Err(SessionError::NoViableDevice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDevice, ScriptedBackend};

    fn session_with(devices: Vec<FakeDevice>) -> (ControllerSession, ScriptedBackend) {
        let backend = ScriptedBackend::with_devices(devices);
        let session = ControllerSession::new(
            Box::new(backend.clone()),
            std::env::temp_dir().join("octopad-missing-gamecontrollerdb.txt"),
        );
        (session, backend)
    }

    #[test]
    fn initialize_runs_once() {
        let (mut session, backend) = session_with(vec![FakeDevice::mapped(0)]);

        session.initialize();
        session.initialize();

        assert!(session.is_initialized());
        let state = backend.state();
        assert_eq!(state.start_calls, 1);
        // Startup connection event was flushed
        assert_eq!(state.flushed, 1);
        assert!(state.events.is_empty());
        // Initializing alone does not claim a device
        assert!(!session.is_open());
    }

    #[test]
    fn missing_mapping_database_is_not_fatal() {
        let (mut session, backend) = session_with(vec![]);

        session.initialize();

        assert!(session.is_initialized());
        assert_eq!(backend.state().loaded_mappings, None);
    }

    #[test]
    fn mapping_database_is_handed_to_backend() {
        let path = std::env::temp_dir().join(format!("octopad-session-db-{}.txt", std::process::id()));
        std::fs::write(
            &path,
            "03000000790000000600000010010000,Generic USB Pad,a:b2,b:b1,\n",
        )
        .unwrap();
        let backend = ScriptedBackend::default();
        let mut session = ControllerSession::new(Box::new(backend.clone()), &path);

        session.initialize();
        std::fs::remove_file(&path).ok();

        assert_eq!(backend.state().loaded_mappings, Some(1));
        assert_eq!(session.online().unwrap().mapping_db(), path.as_path());
    }

    #[test]
    fn failed_initialize_is_retried_by_open() {
        let (mut session, backend) = session_with(vec![FakeDevice::mapped(2)]);
        backend.state_mut().start_failures = 1;

        session.initialize();
        assert!(!session.is_initialized());

        session.open();
        assert!(session.is_initialized());
        assert_eq!(backend.state().start_calls, 2);
        assert_eq!(session.active_device().unwrap().instance_id, InstanceId(2));
    }

    #[test]
    fn open_gives_up_when_initialize_keeps_failing() {
        let (mut session, backend) = session_with(vec![FakeDevice::mapped(0)]);
        backend.state_mut().start_failures = 5;

        session.open();

        assert!(!session.is_initialized());
        assert!(!session.is_open());
        assert!(backend.state().open_calls.is_empty());
    }

    #[test]
    fn open_picks_first_viable_in_enumeration_order() {
        let (mut session, backend) = session_with(vec![
            FakeDevice::joystick(0),
            FakeDevice::unmapped(1),
            FakeDevice::broken(2),
            FakeDevice::mapped(3),
            FakeDevice::mapped(4),
        ]);

        session.open();

        let active = session.active_device().unwrap();
        assert_eq!(active.instance_id, InstanceId(3));
        assert_eq!(active.index, 3);
        assert_eq!(active.name, "Pad 3");
        assert_eq!(active.guid, FakeDevice::guid_for(3));
        assert!(!active.mapping.is_empty());

        let state = backend.state();
        assert_eq!(state.open_calls, vec![InstanceId(1), InstanceId(2), InstanceId(3)]);
        assert_eq!(state.close_calls, vec![InstanceId(1)]);
        assert_eq!(state.opened, vec![InstanceId(3)]);
    }

    #[test]
    fn open_twice_keeps_the_same_device() {
        let (mut session, backend) = session_with(vec![FakeDevice::mapped(0), FakeDevice::mapped(1)]);

        session.open();
        let first = session.active_device().cloned();
        session.open();

        assert_eq!(session.active_device().cloned(), first);
        assert_eq!(backend.state().open_calls, vec![InstanceId(0)]);
        assert!(backend.state().close_calls.is_empty());
    }

    #[test]
    fn stale_device_is_replaced_on_open() {
        let (mut session, backend) = session_with(vec![FakeDevice::mapped(0), FakeDevice::mapped(1)]);
        session.open();
        assert_eq!(session.active_device().unwrap().instance_id, InstanceId(0));

        backend.go_stale(InstanceId(0));
        backend.state_mut().devices.retain(|d| d.id != InstanceId(0));
        session.open();

        assert_eq!(session.active_device().unwrap().instance_id, InstanceId(1));
        assert_eq!(backend.state().close_calls, vec![InstanceId(0)]);
    }

    #[test]
    fn no_viable_device_leaves_session_empty() {
        let (mut session, backend) = session_with(vec![
            FakeDevice::joystick(0),
            FakeDevice::with_empty_mapping(1),
        ]);

        session.open();

        assert!(session.is_initialized());
        assert!(!session.is_open());
        assert!(backend.state().opened.is_empty());
    }

    #[test]
    fn close_is_idempotent() {
        let (mut session, backend) = session_with(vec![FakeDevice::mapped(0)]);
        session.open();

        session.close();
        session.close();

        assert!(!session.is_open());
        assert!(session.is_initialized());
        assert_eq!(backend.state().close_calls, vec![InstanceId(0)]);
    }

    #[test]
    fn close_without_backend_drops_stray_handle_quietly() {
        let (mut session, backend) = session_with(vec![]);
        session.device = Some(ActiveDevice {
            instance_id: InstanceId(9),
            index: 0,
            name: "stray".to_string(),
            guid: Guid::default(),
            mapping: "stray".to_string(),
        });

        session.close();

        assert!(!session.is_open());
        assert!(backend.state().close_calls.is_empty());
    }

    #[test]
    fn deinitialize_closes_and_stops_once() {
        let (mut session, backend) = session_with(vec![FakeDevice::mapped(0)]);
        session.open();

        session.deinitialize();
        session.deinitialize();

        assert!(!session.is_initialized());
        assert!(!session.is_open());
        let state = backend.state();
        assert_eq!(state.close_calls, vec![InstanceId(0)]);
        assert_eq!(state.stop_calls, 1);
        assert!(!state.running);
    }

    #[test]
    fn session_can_be_brought_up_again() {
        let (mut session, backend) = session_with(vec![FakeDevice::mapped(0)]);
        session.open();
        session.deinitialize();

        session.open();

        assert!(session.is_open());
        assert_eq!(backend.state().start_calls, 2);
    }

    #[test]
    fn dropping_session_releases_backend() {
        let (mut session, backend) = session_with(vec![FakeDevice::mapped(0)]);
        session.open();

        drop(session);

        let state = backend.state();
        assert_eq!(state.stop_calls, 1);
        assert_eq!(state.close_calls, vec![InstanceId(0)]);
    }

    #[test]
    fn dropping_uninitialized_session_touches_nothing() {
        let (session, backend) = session_with(vec![]);
        drop(session);
        assert_eq!(backend.state().stop_calls, 0);
    }
}
