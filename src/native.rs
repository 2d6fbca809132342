//! Fixed-layout records and write primitives at the native boundary.
//!
//! The router produces these records from the in-memory model and hands them
//! to the native subsystem through the sink traits below. Binding the sinks
//! to actual ProjFS calls is the Windows adapter's job; tests substitute
//! in-memory fakes.

use crate::info::{FileBasicInfo, PlaceholderInfo, PLACEHOLDER_ID_LENGTH};
use crate::util::filetime::systemtime_to_filetime;

/// Native basic-info record. Timestamps are absolute FILETIME values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BasicInfoRecord {
    pub is_directory: bool,
    pub file_size: i64,
    pub creation_time: i64,
    pub last_access_time: i64,
    pub last_write_time: i64,
    pub change_time: i64,
    pub file_attributes: u32,
}

impl From<&FileBasicInfo> for BasicInfoRecord {
    fn from(info: &FileBasicInfo) -> Self {
        Self {
            is_directory: info.is_directory,
            file_size: info.file_size,
            creation_time: systemtime_to_filetime(info.creation_time),
            last_access_time: systemtime_to_filetime(info.last_access_time),
            last_write_time: systemtime_to_filetime(info.last_write_time),
            change_time: systemtime_to_filetime(info.change_time),
            file_attributes: info.attributes,
        }
    }
}

/// Native 128+128-byte version-identity record.
#[derive(Clone, Copy)]
pub struct VersionInfoRecord {
    pub provider_id: [u8; PLACEHOLDER_ID_LENGTH],
    pub content_id: [u8; PLACEHOLDER_ID_LENGTH],
}

impl VersionInfoRecord {
    /// The all-zero record used for placeholders without a content identity.
    pub fn zeroed() -> Self {
        Self {
            provider_id: [0; PLACEHOLDER_ID_LENGTH],
            content_id: [0; PLACEHOLDER_ID_LENGTH],
        }
    }
}

/// Native placeholder record: basic info plus version identity.
///
/// The extended-attribute, security and stream extension fields of the
/// on-the-wire layout are fixed at zero and owned by the adapter.
#[derive(Clone, Copy)]
pub struct PlaceholderRecord {
    pub basic_info: BasicInfoRecord,
    pub version_info: VersionInfoRecord,
}

impl From<&PlaceholderInfo> for PlaceholderRecord {
    fn from(info: &PlaceholderInfo) -> Self {
        let version_info = match &info.version {
            Some(identity) => VersionInfoRecord {
                provider_id: *identity.provider_id(),
                content_id: *identity.content_id(),
            },
            None => VersionInfoRecord::zeroed(),
        };
        Self {
            basic_info: BasicInfoRecord::from(&info.basic_info),
            version_info,
        }
    }
}

/// Outcome of writing one entry into the OS-owned enumeration buffer.
#[derive(Debug)]
pub enum FillError {
    /// The buffer cannot take another entry. Continuation signal, not a
    /// fault: the OS re-invokes get-enumeration with a fresh buffer.
    BufferFull,
    /// Any other native failure. Fatal for the enumeration call.
    Native { status: i32 },
}

/// OS-owned output buffer for one get-enumeration invocation.
pub trait DirEntrySink {
    /// Attempt to append one entry. On [`FillError::BufferFull`] the buffer
    /// is unchanged and the entry must be retried on the next invocation.
    fn try_fill(&mut self, name: &str, basic_info: &BasicInfoRecord) -> Result<(), FillError>;
}

/// Persists a placeholder record against a relative path.
pub trait PlaceholderSink {
    fn write_placeholder(
        &mut self,
        relative_path: &str,
        record: &PlaceholderRecord,
    ) -> Result<(), crate::error::ProjectionError>;
}

/// Writes file content into the native data stream at a byte offset.
///
/// The slice only needs to stay valid for the duration of the call.
pub trait FileDataSink {
    fn write_data(
        &mut self,
        byte_offset: u64,
        data: &[u8],
    ) -> Result<(), crate::error::ProjectionError>;
}
