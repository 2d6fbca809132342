//! Virtualization root lifecycle.
//!
//! [`VirtualizationInstance`] owns the on-disk root directory and the native
//! virtualization handle, driving an explicit not-started/running/stopped
//! state machine. The native subsystem itself sits behind
//! [`VirtualizationBackend`], implemented over ProjFS on Windows and over
//! fakes in tests.

#[cfg(windows)]
mod callbacks;
#[cfg(windows)]
mod projfs;

#[cfg(windows)]
pub use projfs::ProjFsBackend;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::ProjectionError;
use crate::provider::ProjectionProvider;
use crate::router::CallbackRouter;

/// The native virtualization subsystem, as seen by the lifecycle manager.
pub trait VirtualizationBackend: Send + Sync {
    /// Mark `root` as a placeholder virtualization root tagged with
    /// `instance_id`.
    fn mark_root_as_placeholder(
        &self,
        root: &Path,
        instance_id: Uuid,
    ) -> Result<(), ProjectionError>;

    /// Begin virtualization, registering the router's entry points.
    fn start_virtualizing(
        &self,
        root: &Path,
        router: Arc<CallbackRouter>,
    ) -> Result<(), ProjectionError>;

    /// Stop virtualization. Called at most once, only after a successful
    /// start.
    fn stop_virtualizing(&self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LifecycleState {
    NotStarted,
    Running,
    Stopped,
}

/// Owns a virtualization root: its directory, instance id and native handle.
pub struct VirtualizationInstance {
    root_path: PathBuf,
    instance_id: Uuid,
    router: Arc<CallbackRouter>,
    backend: Box<dyn VirtualizationBackend>,
    state: Mutex<LifecycleState>,
}

impl VirtualizationInstance {
    /// Create an instance over the platform's native backend.
    pub fn new(root_path: impl Into<PathBuf>, provider: Arc<dyn ProjectionProvider>) -> Self {
        Self::with_backend(root_path, provider, default_backend())
    }

    /// Create an instance over an explicit backend.
    pub fn with_backend(
        root_path: impl Into<PathBuf>,
        provider: Arc<dyn ProjectionProvider>,
        backend: Box<dyn VirtualizationBackend>,
    ) -> Self {
        Self {
            root_path: root_path.into(),
            instance_id: Uuid::new_v4(),
            router: Arc::new(CallbackRouter::new(provider)),
            backend,
            state: Mutex::new(LifecycleState::NotStarted),
        }
    }

    /// The virtualization root directory.
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Identifier marking this virtualization instance on disk.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// The callback router registered with the native subsystem.
    pub fn router(&self) -> &Arc<CallbackRouter> {
        &self.router
    }

    /// Whether virtualization is currently running.
    pub fn is_running(&self) -> bool {
        *self.state.lock() == LifecycleState::Running
    }

    /// Create the root directory, mark it as a placeholder root and begin
    /// virtualization.
    ///
    /// Fails with [`ProjectionError::RootAlreadyExists`] before touching the
    /// native layer if the directory exists. If virtualization fails to
    /// start after the placeholder mark succeeded, the directory is left
    /// marked; there is no rollback. [`VirtualizationInstance::stop`] cleans
    /// up either way.
    pub fn start(&self) -> Result<(), ProjectionError> {
        let mut state = self.state.lock();
        match *state {
            LifecycleState::NotStarted => {}
            LifecycleState::Running => return Err(ProjectionError::AlreadyStarted),
            LifecycleState::Stopped => return Err(ProjectionError::AlreadyStopped),
        }

        if self.root_path.exists() {
            return Err(ProjectionError::RootAlreadyExists(self.root_path.clone()));
        }
        std::fs::create_dir_all(&self.root_path)?;

        self.backend
            .mark_root_as_placeholder(&self.root_path, self.instance_id)?;
        self.backend
            .start_virtualizing(&self.root_path, self.router.clone())?;

        *state = LifecycleState::Running;
        tracing::info!(root = %self.root_path.display(), "virtualization started");
        Ok(())
    }

    /// Stop virtualization and remove the root directory.
    ///
    /// Idempotent; safe to call whether or not `start` ever succeeded.
    pub fn stop(&self) -> Result<(), ProjectionError> {
        let mut state = self.state.lock();
        if *state == LifecycleState::Running {
            self.backend.stop_virtualizing();
            tracing::info!(root = %self.root_path.display(), "virtualization stopped");
        }
        *state = LifecycleState::Stopped;

        if self.root_path.exists() {
            std::fs::remove_dir_all(&self.root_path)?;
        }
        Ok(())
    }
}

impl Drop for VirtualizationInstance {
    fn drop(&mut self) {
        if self.is_running() {
            if let Err(e) = self.stop() {
                tracing::error!(error = %e, "failed to stop virtualization on drop");
            }
        }
    }
}

#[cfg(windows)]
fn default_backend() -> Box<dyn VirtualizationBackend> {
    Box::new(ProjFsBackend::new())
}

#[cfg(not(windows))]
fn default_backend() -> Box<dyn VirtualizationBackend> {
    Box::new(UnsupportedBackend)
}

/// Stub backend for platforms without a native projection subsystem.
#[cfg(not(windows))]
struct UnsupportedBackend;

#[cfg(not(windows))]
impl VirtualizationBackend for UnsupportedBackend {
    fn mark_root_as_placeholder(&self, _: &Path, _: Uuid) -> Result<(), ProjectionError> {
        Err(ProjectionError::Unsupported(
            "ProjFS virtualization is only available on Windows",
        ))
    }

    fn start_virtualizing(
        &self,
        _: &Path,
        _: Arc<CallbackRouter>,
    ) -> Result<(), ProjectionError> {
        Err(ProjectionError::Unsupported(
            "ProjFS virtualization is only available on Windows",
        ))
    }

    fn stop_virtualizing(&self) {}
}
