//! Controller subsystem for gamepad input handling
//!
//! 1. [`session`] - Lifecycle of the single active gamepad
//! 2. [`event_pump`] - Per-frame hot-plug handling and sampling
//! 3. [`snapshot`] - Fixed-layout input record and its writer
//! 4. [`axis`] - Deadzone/edge shaping for the caller to apply
//!
//! # Architecture
//!
//! ```text
//! get_inputs ──► Event Pump ──(added/removed)──► Session ──► Backend
//!                    │                                          │
//!                    └──► Snapshot Writer ◄──(buttons/axes)─────┘
//! ```
//!
//! Everything runs synchronously on the caller's thread. Nothing blocks and
//! nothing returns an error: a missing controller is an ordinary state.

pub mod axis;
pub mod error;
pub mod event_pump;
pub mod session;
pub mod snapshot;
pub mod system;

pub use axis::{clamp, max_ceiling, min_floor, scale_and_limit, threshold, StickShaping};
pub use error::SessionError;
pub use session::{ActiveDevice, ControllerSession};
pub use snapshot::{write_inputs, InputSnapshot};
