//! Controller mapping database.
//!
//! Parses the community `gamecontrollerdb.txt` format, one mapping per line:
//!
//! ```text
//! 030000005e0400008e02000014010000,X360 Controller,a:b0,b:b1,...,platform:Linux,
//! ^ GUID (32 hex digits)           ^ name           ^ bindings     ^ platform tag
//! ```
//!
//! Only lines for the running platform (or without a platform tag) are kept.
//! The accepted text is handed to the gamepad backend on bring-up, and the
//! session uses [`MappingDatabase::lookup`] to report which mapping a device
//! resolved to.

pub mod database;
pub mod error;

pub use database::{current_platform, Guid, MappingDatabase};
pub use error::MappingDbError;
