use std::path::PathBuf;
use thiserror::Error;

/// Why an executable role of an engine cannot be used.
///
/// These never escape registration; they are stored in the role's
/// availability record and their `Display` is the user-facing reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Unavailability {
    #[error("The executable of transcoding engine {engine} is not defined")]
    NotDefined { engine: String },

    #[error("Transcoding engine {engine} is not compatible with this platform")]
    PlatformIncompatible { engine: String },

    #[error("Transcoding engine {engine} requires AviSynth, which could not be found")]
    AviSynthNotFound { engine: String },

    #[error("Executable \"{}\" of transcoding engine {engine} was not found", .path.display())]
    NotFound { path: PathBuf, engine: String },

    #[error(
        "Insufficient permission to execute \"{}\" for transcoding engine {engine}",
        .path.display()
    )]
    NoExecutePermission { path: PathBuf, engine: String },

    /// The probe process could not be started or did not finish
    #[error("{diagnostic}")]
    LaunchFailed { diagnostic: String },

    /// The probe process ran but reported failure
    #[error("{diagnostic}")]
    Rejected { diagnostic: String },
}

/// Errors that propagate out of registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Engine identifier must not be blank")]
    BlankEngineId,

    #[error("Transcoding engine {0} is not registered")]
    UnknownEngine(String),

    #[error("Registration of transcoding engine {engine} was interrupted")]
    Interrupted { engine: String },
}

/// A probe was aborted by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Probe interrupted")]
pub struct Interrupted;
