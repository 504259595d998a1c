//! Per-frame entry point: drain hot-plug events, then sample the device.

use tracing::{debug, info};

use super::session::ControllerSession;
use super::snapshot::{write_inputs, InputSnapshot};
use crate::backend::DeviceEvent;

impl ControllerSession {
    /// Processes queued device events and fills `out` from the active gamepad.
    ///
    /// Initializes the subsystem lazily. When no device is open afterwards,
    /// `out` is left untouched; callers should pre-zero it or keep the
    /// previous frame. Returns whether `out` was written.
    pub fn get_inputs(&mut self, out: &mut InputSnapshot) -> bool {
        if !self.is_initialized() {
            info!("Attempting to get inputs but the input subsystem is not initialized");
            self.initialize();
            if !self.is_initialized() {
                return false;
            }
        }

        let handled = self.pump_events();
        if handled > 0 {
            debug!("Handled {} queued device events", handled);
        }

        match (self.online(), self.active_device()) {
            (Some(system), Some(device)) => {
                write_inputs(system.backend(), device.instance_id, out);
                true
            }
            _ => false,
        }
    }

    /// Drains the backend queue in FIFO order without blocking, returning the
    /// number of events taken off the queue.
    pub fn pump_events(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self
            .online_mut()
            .and_then(|system| system.backend_mut().poll_event())
        {
            handled += 1;
            self.dispatch(event);
        }
        handled
    }

    fn dispatch(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::Added(id) => {
                info!("A device has been added (instance {})", id);
                self.open();
            }
            DeviceEvent::Removed(id) => {
                info!("A device has been removed (instance {})", id);
                if self.active_device().map(|device| device.instance_id) == Some(id) {
                    info!("    ...it was the active controller");
                    self.close();
                } else {
                    info!("    ...it was not the active controller");
                }
            }
            DeviceEvent::Other => {}
        }
    }
}
