//! Error types for the projection layer.

use std::fmt;
use std::path::PathBuf;

use uuid::Uuid;

/// Errors that can occur while projecting a directory tree.
#[derive(Debug)]
pub enum ProjectionError {
    /// A native projection call failed with a fatal status code.
    Native {
        /// Native entry point that failed.
        operation: &'static str,
        /// 32-bit status returned by the native layer.
        status: i32,
    },

    /// The virtualization root directory already exists.
    RootAlreadyExists(PathBuf),

    /// Virtualization already started.
    AlreadyStarted,

    /// Virtualization was stopped and cannot be restarted.
    AlreadyStopped,

    /// An enumeration callback referenced an id with no active session.
    UnknownEnumeration(Uuid),

    /// Start-enumeration was invoked twice for the same id.
    DuplicateEnumeration(Uuid),

    /// Path conversion error (UTF-16 <-> UTF-8).
    PathConversion(String),

    /// Triggering process could not be resolved.
    ProcessResolution { process_id: u32, message: String },

    /// The native virtualization subsystem is unavailable on this platform.
    Unsupported(&'static str),

    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionError::Native { operation, status } => {
                write!(f, "native call {} failed: status 0x{:08X}", operation, status)
            }
            ProjectionError::RootAlreadyExists(path) => {
                write!(f, "virtualization root already exists: {}", path.display())
            }
            ProjectionError::AlreadyStarted => write!(f, "virtualization already started"),
            ProjectionError::AlreadyStopped => {
                write!(f, "virtualization was stopped and cannot be restarted")
            }
            ProjectionError::UnknownEnumeration(id) => {
                write!(f, "no active enumeration session for id {}", id)
            }
            ProjectionError::DuplicateEnumeration(id) => {
                write!(f, "enumeration session already exists for id {}", id)
            }
            ProjectionError::PathConversion(msg) => write!(f, "path conversion error: {}", msg),
            ProjectionError::ProcessResolution { process_id, message } => {
                write!(f, "cannot resolve process {}: {}", process_id, message)
            }
            ProjectionError::Unsupported(msg) => write!(f, "{}", msg),
            ProjectionError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ProjectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProjectionError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ProjectionError {
    fn from(e: std::io::Error) -> Self {
        ProjectionError::Io(e)
    }
}
