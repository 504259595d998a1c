//! Bring-up and tear-down of the platform input layer.
//!
//! ```text
//! Offline ──bring_up──► Online ──shut_down──► Offline
//!    ▲         │
//!    └─────────┘ (backend failed to start)
//! ```

use std::path::{Path, PathBuf};

use statum::{machine, state};
use tracing::{debug, info, warn};

use super::error::SessionError;
use crate::backend::GamepadBackend;
use crate::mapping::MappingDatabase;

#[state]
#[derive(Debug, Clone)]
pub enum SystemState {
    Offline, // Backend stopped, no device access
    Online,  // Backend running, events flowing
}

#[machine]
pub struct InputSystem<S: SystemState> {
    backend: Box<dyn GamepadBackend>,
    mapping_db: PathBuf,
}

impl<S: SystemState> InputSystem<S> {
    pub fn mapping_db(&self) -> &Path {
        &self.mapping_db
    }
}

impl InputSystem<Offline> {
    pub fn create(backend: Box<dyn GamepadBackend>, mapping_db: PathBuf) -> Self {
        debug!("Creating input system, mapping database at {}", mapping_db.display());
        Self::new(backend, mapping_db)
    }

    /// Starts the backend and discards the connection events it queues on
    /// startup. A missing or unreadable mapping database is logged and skipped.
    ///
    /// On failure the offline system is handed back so a later call can retry.
    pub fn bring_up(mut self) -> Result<InputSystem<Online>, (Self, SessionError)> {
        let mappings = match load_mappings(&self.mapping_db) {
            Ok(db) => {
                info!(
                    "    Successfully loaded {} mappings from {}",
                    db.len(),
                    self.mapping_db.display()
                );
                Some(db)
            }
            Err(e) => {
                warn!("    Unable to load mappings: {}", e);
                None
            }
        };

        if let Err(e) = self.backend.start(mappings.as_ref()) {
            return Err((self, e.into()));
        }

        let flushed = self.backend.flush_events();
        debug!("    Flushed {} startup events", flushed);

        Ok(self.transition())
    }
}

impl InputSystem<Online> {
    pub fn backend(&self) -> &dyn GamepadBackend {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> &mut dyn GamepadBackend {
        self.backend.as_mut()
    }

    pub fn shut_down(mut self) -> InputSystem<Offline> {
        self.backend.stop();
        debug!("Input backend stopped");
        self.transition()
    }
}

fn load_mappings(path: &Path) -> Result<MappingDatabase, SessionError> {
    Ok(MappingDatabase::load(path)?)
}
