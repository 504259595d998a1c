//! Gamepad input core: one active controller, hot-plug handling and a
//! fixed-layout per-frame snapshot.

pub mod backend;
pub mod config;
pub mod controller;
pub mod driver;
pub mod logging;
pub mod mapping;

#[cfg(test)]
pub(crate) mod testing;
