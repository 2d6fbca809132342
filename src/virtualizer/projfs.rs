//! ProjFS backend: the real native virtualization subsystem on Windows.

use std::ffi::c_void;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;
use windows::core::{GUID, PCWSTR};
use windows::Win32::Storage::ProjectedFileSystem::{
    PrjMarkDirectoryAsPlaceholder, PrjStartVirtualizing, PrjStopVirtualizing,
    PRJ_NAMESPACE_VIRTUALIZATION_CONTEXT,
};

use crate::error::ProjectionError;
use crate::router::CallbackRouter;
use crate::util::wstr::string_to_wide;
use crate::virtualizer::callbacks::{build_callbacks, CallbackContext};
use crate::virtualizer::VirtualizationBackend;

/// Native ProjFS backend.
///
/// Holds the namespace virtualization context and the leaked callback
/// context between start and stop. ProjFS keeps a reference to the callback
/// context for the lifetime of the virtualization instance, so it is stored
/// as a raw pointer and reclaimed on stop.
pub struct ProjFsBackend {
    namespace_context: RwLock<Option<PRJ_NAMESPACE_VIRTUALIZATION_CONTEXT>>,
    callback_context: RwLock<Option<*mut CallbackContext>>,
}

// Safety: the raw pointers are only touched while holding the locks, and
// ProjFS allows its context handles to be used from any thread.
unsafe impl Send for ProjFsBackend {}
unsafe impl Sync for ProjFsBackend {}

impl ProjFsBackend {
    pub fn new() -> Self {
        Self {
            namespace_context: RwLock::new(None),
            callback_context: RwLock::new(None),
        }
    }
}

impl Default for ProjFsBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualizationBackend for ProjFsBackend {
    fn mark_root_as_placeholder(
        &self,
        root: &Path,
        instance_id: Uuid,
    ) -> Result<(), ProjectionError> {
        let root_wide: Vec<u16> = path_to_wide(root)?;
        let guid: GUID = GUID::from_u128(instance_id.as_u128());

        unsafe {
            PrjMarkDirectoryAsPlaceholder(
                PCWSTR::from_raw(root_wide.as_ptr()),
                PCWSTR::null(),
                None,
                &guid,
            )
            .map_err(|e| ProjectionError::Native {
                operation: "PrjMarkDirectoryAsPlaceholder",
                status: e.code().0,
            })
        }
    }

    fn start_virtualizing(
        &self,
        root: &Path,
        router: Arc<CallbackRouter>,
    ) -> Result<(), ProjectionError> {
        let root_wide: Vec<u16> = path_to_wide(root)?;
        let callbacks = build_callbacks();

        // Must outlive virtualization; reclaimed in stop_virtualizing.
        let ctx_ptr: *mut CallbackContext = Box::into_raw(Box::new(CallbackContext { router }));

        let result = unsafe {
            PrjStartVirtualizing(
                PCWSTR::from_raw(root_wide.as_ptr()),
                &callbacks,
                Some(ctx_ptr as *const c_void),
                None,
            )
        };

        match result {
            Ok(namespace_context) => {
                *self.namespace_context.write() = Some(namespace_context);
                *self.callback_context.write() = Some(ctx_ptr);
                Ok(())
            }
            Err(e) => {
                // Safety: ProjFS never saw the context; reclaim it here.
                unsafe {
                    drop(Box::from_raw(ctx_ptr));
                }
                Err(ProjectionError::Native {
                    operation: "PrjStartVirtualizing",
                    status: e.code().0,
                })
            }
        }
    }

    fn stop_virtualizing(&self) {
        if let Some(ctx) = self.namespace_context.write().take() {
            unsafe {
                PrjStopVirtualizing(ctx);
            }
        }

        if let Some(ctx_ptr) = self.callback_context.write().take() {
            // Safety: created with Box::into_raw in start_virtualizing and
            // no callbacks run after PrjStopVirtualizing returns.
            unsafe {
                drop(Box::from_raw(ctx_ptr));
            }
        }
    }
}

fn path_to_wide(path: &Path) -> Result<Vec<u16>, ProjectionError> {
    let s = path
        .to_str()
        .ok_or_else(|| ProjectionError::PathConversion(format!("{:?}", path)))?;
    Ok(string_to_wide(s))
}
