//! User-mode directory projection over Windows ProjFS.
//!
//! An application implements [`ProjectionProvider`] to describe a virtual
//! directory tree, and a [`VirtualizationInstance`] makes that tree appear
//! under a root directory on disk. The filesystem driver materializes
//! placeholders and file content on demand by calling back into the
//! provider; nothing is stored until something reads it.
//!
//! The crate splits into a portable core and a thin Windows adapter. The
//! core (metadata model, callback router, enumeration sessions, lifecycle
//! state machine) compiles and tests on any platform; only the adapter
//! behind [`VirtualizationBackend`] talks to ProjFS. On non-Windows
//! platforms [`VirtualizationInstance::start`] fails with
//! [`ProjectionError::Unsupported`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use projfs_kit::{ProjectionProvider, VirtualizationInstance};
//! # fn provider() -> Arc<dyn ProjectionProvider> { unimplemented!() }
//!
//! # fn main() -> Result<(), projfs_kit::ProjectionError> {
//! let instance = VirtualizationInstance::new("C:\\virtroot", provider());
//! instance.start()?;
//! // ... serve until shutdown ...
//! instance.stop()?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod info;
pub mod native;
pub mod process;
pub mod provider;
pub mod router;
pub mod util;
pub mod virtualizer;

pub use error::ProjectionError;
pub use info::{ContentIdentity, DirectoryEntry, FileBasicInfo, PlaceholderInfo};
pub use process::{ResolvedProcess, TriggeringProcess};
pub use provider::{EntryCursor, ProjectionProvider};
pub use router::{CallbackOutcome, CallbackRouter};
pub use virtualizer::{VirtualizationBackend, VirtualizationInstance};

/// Whether the native projection subsystem exists on this platform.
#[cfg(windows)]
pub fn projfs_supported() -> bool {
    true
}

/// Whether the native projection subsystem exists on this platform.
#[cfg(not(windows))]
pub fn projfs_supported() -> bool {
    false
}
