//! In-memory metadata model for projected files and directories.

use std::time::SystemTime;

/// Width of each placeholder identity field at the native boundary
/// (`PRJ_PLACEHOLDER_ID_LENGTH`).
pub const PLACEHOLDER_ID_LENGTH: usize = 128;

/// FILE_ATTRIBUTE_NORMAL in the native encoding.
pub const ATTRIBUTE_NORMAL: u32 = 0x80;

/// FILE_ATTRIBUTE_DIRECTORY in the native encoding.
pub const ATTRIBUTE_DIRECTORY: u32 = 0x10;

/// Basic attributes of a projected file or directory.
///
/// Constructed fresh by the provider for every enumeration entry or
/// placeholder query; never mutated afterwards.
#[derive(Clone, Debug)]
pub struct FileBasicInfo {
    /// Whether this entry is a directory.
    pub is_directory: bool,
    /// Size in bytes. Always 0 for directories.
    pub file_size: i64,
    /// Creation time.
    pub creation_time: SystemTime,
    /// Last access time.
    pub last_access_time: SystemTime,
    /// Last write time.
    pub last_write_time: SystemTime,
    /// Change time.
    pub change_time: SystemTime,
    /// Attribute bitmask in the native encoding.
    pub attributes: u32,
}

impl FileBasicInfo {
    /// Create info for a file of the given size.
    pub fn file(
        file_size: i64,
        creation_time: SystemTime,
        last_access_time: SystemTime,
        last_write_time: SystemTime,
        change_time: SystemTime,
    ) -> Self {
        Self {
            is_directory: false,
            file_size,
            creation_time,
            last_access_time,
            last_write_time,
            change_time,
            attributes: ATTRIBUTE_NORMAL,
        }
    }

    /// Create info for a directory. Directories always report size 0.
    pub fn directory(
        creation_time: SystemTime,
        last_access_time: SystemTime,
        last_write_time: SystemTime,
        change_time: SystemTime,
    ) -> Self {
        Self {
            is_directory: true,
            file_size: 0,
            creation_time,
            last_access_time,
            last_write_time,
            change_time,
            attributes: ATTRIBUTE_DIRECTORY,
        }
    }

    /// Replace the attribute bitmask.
    pub fn with_attributes(mut self, attributes: u32) -> Self {
        self.attributes = attributes;
        self
    }
}

/// Opaque (provider, content) identity for a placeholder.
///
/// Both fields are fixed at [`PLACEHOLDER_ID_LENGTH`] bytes regardless of the
/// logical identifier length; shorter inputs are zero-padded, longer inputs
/// truncated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentIdentity {
    provider_id: [u8; PLACEHOLDER_ID_LENGTH],
    content_id: [u8; PLACEHOLDER_ID_LENGTH],
}

impl ContentIdentity {
    /// Build an identity from logical byte strings of any length.
    pub fn new(provider_id: &[u8], content_id: &[u8]) -> Self {
        Self {
            provider_id: pad_id(provider_id),
            content_id: pad_id(content_id),
        }
    }

    /// The all-zero identity used when a placeholder carries no version.
    pub fn zero() -> Self {
        Self {
            provider_id: [0; PLACEHOLDER_ID_LENGTH],
            content_id: [0; PLACEHOLDER_ID_LENGTH],
        }
    }

    /// Fixed-width provider identifier.
    pub fn provider_id(&self) -> &[u8; PLACEHOLDER_ID_LENGTH] {
        &self.provider_id
    }

    /// Fixed-width content identifier.
    pub fn content_id(&self) -> &[u8; PLACEHOLDER_ID_LENGTH] {
        &self.content_id
    }
}

fn pad_id(bytes: &[u8]) -> [u8; PLACEHOLDER_ID_LENGTH] {
    let mut out = [0u8; PLACEHOLDER_ID_LENGTH];
    let len = bytes.len().min(PLACEHOLDER_ID_LENGTH);
    out[..len].copy_from_slice(&bytes[..len]);
    out
}

/// Everything needed to answer one placeholder-info query.
///
/// Produced once per query and consumed immediately to build the native
/// placeholder record; not retained by the core.
#[derive(Clone, Debug)]
pub struct PlaceholderInfo {
    /// Basic attributes of the placeholder.
    pub basic_info: FileBasicInfo,
    /// Optional content identity. Defaults to all zero at the native boundary.
    pub version: Option<ContentIdentity>,
}

impl PlaceholderInfo {
    /// Create placeholder info without a content identity.
    pub fn new(basic_info: FileBasicInfo) -> Self {
        Self {
            basic_info,
            version: None,
        }
    }

    /// Attach a content identity.
    pub fn with_version(mut self, version: ContentIdentity) -> Self {
        self.version = Some(version);
        self
    }
}

/// One entry of a directory enumeration.
#[derive(Clone, Debug)]
pub struct DirectoryEntry {
    /// Entry name (not a path).
    pub name: String,
    /// Basic attributes.
    pub basic_info: FileBasicInfo,
}

impl DirectoryEntry {
    /// Create a directory entry.
    pub fn new(name: impl Into<String>, basic_info: FileBasicInfo) -> Self {
        Self {
            name: name.into(),
            basic_info,
        }
    }
}
