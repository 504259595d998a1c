//! Error definitions for the mapping database

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or parsing a controller mapping database
#[derive(Debug, Error)]
pub enum MappingDbError {
    /// The database file could not be read
    #[error("Unable to read mappings from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A GUID field is not 32 hexadecimal digits
    #[error("Invalid device GUID: {0}")]
    InvalidGuid(String),
}
