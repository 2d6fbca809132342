//! ProjFS callback thunks.
//!
//! These are the `extern "system"` entry points registered with ProjFS. Each
//! thunk decodes the callback data, builds the sinks over the native write
//! primitives and forwards to the [`CallbackRouter`]. The three optional
//! callbacks (query-file-name, notification, cancel-command) stay unbound.

use std::ffi::c_void;
use std::sync::Arc;

use uuid::Uuid;
use windows::core::{GUID, HRESULT, PCWSTR};
use windows::Win32::Foundation::{
    BOOLEAN, ERROR_FILE_NOT_FOUND, ERROR_INSUFFICIENT_BUFFER, E_FAIL, E_OUTOFMEMORY, S_OK,
};
use windows::Win32::Storage::ProjectedFileSystem::{
    PrjAllocateAlignedBuffer, PrjFillDirEntryBuffer, PrjFreeAlignedBuffer, PrjWriteFileData,
    PrjWritePlaceholderInfo, PRJ_CALLBACKS, PRJ_CALLBACK_DATA,
    PRJ_CB_DATA_FLAG_ENUM_RESTART_SCAN, PRJ_DIR_ENTRY_BUFFER_HANDLE, PRJ_FILE_BASIC_INFO,
    PRJ_NAMESPACE_VIRTUALIZATION_CONTEXT, PRJ_PLACEHOLDER_INFO, PRJ_PLACEHOLDER_VERSION_INFO,
};

use crate::error::ProjectionError;
use crate::native::{
    BasicInfoRecord, DirEntrySink, FileDataSink, FillError, PlaceholderRecord, PlaceholderSink,
};
use crate::process::TriggeringProcess;
use crate::router::{CallbackOutcome, CallbackRouter};
use crate::util::wstr::{pcwstr_to_string, string_to_wide};

/// Per-instance context handed to ProjFS and back to every callback.
pub struct CallbackContext {
    pub router: Arc<CallbackRouter>,
}

/// Build the callback table: five mandatory entry points bound, the three
/// optional ones left unregistered.
pub fn build_callbacks() -> PRJ_CALLBACKS {
    PRJ_CALLBACKS {
        StartDirectoryEnumerationCallback: Some(start_dir_enum_cb),
        EndDirectoryEnumerationCallback: Some(end_dir_enum_cb),
        GetDirectoryEnumerationCallback: Some(get_dir_enum_cb),
        GetPlaceholderInfoCallback: Some(get_placeholder_info_cb),
        GetFileDataCallback: Some(get_file_data_cb),
        QueryFileNameCallback: None,
        NotificationCallback: None,
        CancelCommandCallback: None,
    }
}

unsafe fn context<'a>(callback_data: *const PRJ_CALLBACK_DATA) -> &'a CallbackContext {
    &*((*callback_data).InstanceContext as *const CallbackContext)
}

fn guid_to_uuid(guid: &GUID) -> Uuid {
    Uuid::from_u128(guid.to_u128())
}

fn error_to_hresult(e: &ProjectionError) -> HRESULT {
    match e {
        ProjectionError::Native { status, .. } => HRESULT(*status),
        _ => E_FAIL,
    }
}

unsafe fn triggering_process(callback_data: *const PRJ_CALLBACK_DATA) -> TriggeringProcess {
    let image = pcwstr_to_string((*callback_data).TriggeringProcessImageFileName)
        .unwrap_or_default();
    TriggeringProcess::new((*callback_data).TriggeringProcessId, image)
}

pub unsafe extern "system" fn start_dir_enum_cb(
    callback_data: *const PRJ_CALLBACK_DATA,
    enumeration_id: *const GUID,
) -> HRESULT {
    let ctx: &CallbackContext = context(callback_data);

    let relative_path: String = match pcwstr_to_string((*callback_data).FilePathName) {
        Ok(p) => p,
        Err(_) => return E_FAIL,
    };

    match ctx
        .router
        .start_directory_enumeration(guid_to_uuid(&*enumeration_id), &relative_path)
    {
        Ok(()) => S_OK,
        Err(e) => {
            tracing::error!(error = %e, "StartDirectoryEnumeration failed");
            error_to_hresult(&e)
        }
    }
}

pub unsafe extern "system" fn get_dir_enum_cb(
    callback_data: *const PRJ_CALLBACK_DATA,
    enumeration_id: *const GUID,
    search_expression: PCWSTR,
    dir_entry_buffer_handle: PRJ_DIR_ENTRY_BUFFER_HANDLE,
) -> HRESULT {
    let ctx: &CallbackContext = context(callback_data);

    let restart_scan: bool =
        ((*callback_data).Flags.0 & PRJ_CB_DATA_FLAG_ENUM_RESTART_SCAN.0) != 0;
    let search: Option<String> = if search_expression.is_null() {
        None
    } else {
        pcwstr_to_string(search_expression).ok()
    };

    let mut sink = PrjDirEntrySink {
        handle: dir_entry_buffer_handle,
    };

    match ctx.router.get_directory_enumeration(
        guid_to_uuid(&*enumeration_id),
        restart_scan,
        search.as_deref(),
        &mut sink,
    ) {
        Ok(()) => S_OK,
        Err(e) => {
            tracing::error!(error = %e, "GetDirectoryEnumeration failed");
            error_to_hresult(&e)
        }
    }
}

pub unsafe extern "system" fn end_dir_enum_cb(
    callback_data: *const PRJ_CALLBACK_DATA,
    enumeration_id: *const GUID,
) -> HRESULT {
    let ctx: &CallbackContext = context(callback_data);

    match ctx
        .router
        .end_directory_enumeration(guid_to_uuid(&*enumeration_id))
    {
        Ok(()) => S_OK,
        Err(e) => {
            tracing::error!(error = %e, "EndDirectoryEnumeration failed");
            error_to_hresult(&e)
        }
    }
}

pub unsafe extern "system" fn get_placeholder_info_cb(
    callback_data: *const PRJ_CALLBACK_DATA,
) -> HRESULT {
    let ctx: &CallbackContext = context(callback_data);

    let relative_path: String = match pcwstr_to_string((*callback_data).FilePathName) {
        Ok(p) => p,
        Err(_) => return E_FAIL,
    };

    let process = triggering_process(callback_data);
    let mut sink = PrjPlaceholderSink {
        context: (*callback_data).NamespaceVirtualizationContext,
    };

    match ctx
        .router
        .get_placeholder_info(&relative_path, &process, &mut sink)
    {
        Ok(CallbackOutcome::Handled) => S_OK,
        Ok(CallbackOutcome::NotFound) => HRESULT::from(ERROR_FILE_NOT_FOUND),
        Err(e) => {
            tracing::error!(error = %e, "GetPlaceholderInfo failed");
            error_to_hresult(&e)
        }
    }
}

pub unsafe extern "system" fn get_file_data_cb(
    callback_data: *const PRJ_CALLBACK_DATA,
    byte_offset: u64,
    length: u32,
) -> HRESULT {
    let ctx: &CallbackContext = context(callback_data);

    let relative_path: String = match pcwstr_to_string((*callback_data).FilePathName) {
        Ok(p) => p,
        Err(_) => return E_FAIL,
    };

    let process = triggering_process(callback_data);
    let mut sink = PrjFileDataSink {
        context: (*callback_data).NamespaceVirtualizationContext,
        data_stream_id: (*callback_data).DataStreamId,
    };

    match ctx
        .router
        .get_file_data(&relative_path, byte_offset, length, &process, &mut sink)
    {
        Ok(CallbackOutcome::Handled) => S_OK,
        Ok(CallbackOutcome::NotFound) => HRESULT::from(ERROR_FILE_NOT_FOUND),
        Err(e) => {
            tracing::error!(error = %e, "GetFileData failed");
            error_to_hresult(&e)
        }
    }
}

// ============================================================================
// Sink implementations over the native write primitives
// ============================================================================

fn to_prj_basic_info(record: &BasicInfoRecord) -> PRJ_FILE_BASIC_INFO {
    PRJ_FILE_BASIC_INFO {
        IsDirectory: BOOLEAN(if record.is_directory { 1 } else { 0 }),
        FileSize: record.file_size,
        CreationTime: record.creation_time,
        LastAccessTime: record.last_access_time,
        LastWriteTime: record.last_write_time,
        ChangeTime: record.change_time,
        FileAttributes: record.file_attributes,
    }
}

struct PrjDirEntrySink {
    handle: PRJ_DIR_ENTRY_BUFFER_HANDLE,
}

impl DirEntrySink for PrjDirEntrySink {
    fn try_fill(&mut self, name: &str, basic_info: &BasicInfoRecord) -> Result<(), FillError> {
        let name_wide: Vec<u16> = string_to_wide(name);
        let basic_info: PRJ_FILE_BASIC_INFO = to_prj_basic_info(basic_info);

        unsafe {
            match PrjFillDirEntryBuffer(
                PCWSTR::from_raw(name_wide.as_ptr()),
                Some(&basic_info),
                self.handle,
            ) {
                Ok(()) => Ok(()),
                Err(e) if e.code() == HRESULT::from(ERROR_INSUFFICIENT_BUFFER) => {
                    Err(FillError::BufferFull)
                }
                Err(e) => Err(FillError::Native { status: e.code().0 }),
            }
        }
    }
}

struct PrjPlaceholderSink {
    context: PRJ_NAMESPACE_VIRTUALIZATION_CONTEXT,
}

impl PlaceholderSink for PrjPlaceholderSink {
    fn write_placeholder(
        &mut self,
        relative_path: &str,
        record: &PlaceholderRecord,
    ) -> Result<(), ProjectionError> {
        let path_wide: Vec<u16> = string_to_wide(relative_path);

        let placeholder_info = PRJ_PLACEHOLDER_INFO {
            FileBasicInfo: to_prj_basic_info(&record.basic_info),
            VersionInfo: PRJ_PLACEHOLDER_VERSION_INFO {
                ProviderID: record.version_info.provider_id,
                ContentID: record.version_info.content_id,
            },
            ..Default::default()
        };

        unsafe {
            PrjWritePlaceholderInfo(
                self.context,
                PCWSTR::from_raw(path_wide.as_ptr()),
                &placeholder_info,
                std::mem::size_of::<PRJ_PLACEHOLDER_INFO>() as u32,
            )
            .map_err(|e| ProjectionError::Native {
                operation: "PrjWritePlaceholderInfo",
                status: e.code().0,
            })
        }
    }
}

struct PrjFileDataSink {
    context: PRJ_NAMESPACE_VIRTUALIZATION_CONTEXT,
    data_stream_id: GUID,
}

impl FileDataSink for PrjFileDataSink {
    fn write_data(&mut self, byte_offset: u64, data: &[u8]) -> Result<(), ProjectionError> {
        unsafe {
            // ProjFS requires the data buffer to meet device alignment.
            let aligned: *mut c_void = PrjAllocateAlignedBuffer(self.context, data.len());
            if aligned.is_null() {
                return Err(ProjectionError::Native {
                    operation: "PrjAllocateAlignedBuffer",
                    status: E_OUTOFMEMORY.0,
                });
            }

            std::ptr::copy_nonoverlapping(data.as_ptr(), aligned as *mut u8, data.len());

            let result = PrjWriteFileData(
                self.context,
                &self.data_stream_id,
                aligned,
                byte_offset,
                data.len() as u32,
            );

            PrjFreeAlignedBuffer(aligned);

            result.map_err(|e| ProjectionError::Native {
                operation: "PrjWriteFileData",
                status: e.code().0,
            })
        }
    }
}
