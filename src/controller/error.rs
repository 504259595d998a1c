use crate::backend::BackendError;
use crate::mapping::MappingDbError;

/// Failures inside the controller session.
///
/// None of these reach the host: every public session operation logs them
/// and leaves the session in a well-defined state.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The platform input layer failed
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// The mapping database could not be loaded
    #[error("Mapping database error: {0}")]
    MappingDb(#[from] MappingDbError),

    #[error("input subsystem not initialized")]
    NotInitialized,

    #[error("a controller is already open and connected")]
    AlreadyOpen,

    #[error("couldn't find a viable controller")]
    NoViableDevice,
}
