//! The contract a content provider implements to back a projected tree.

use crate::info::{DirectoryEntry, PlaceholderInfo};
use crate::process::TriggeringProcess;

/// Lazy, pull-based sequence of directory entries.
///
/// Dropping the cursor is the release operation: the router drops it on
/// restart, on end-enumeration and on natural exhaustion, so a sequence
/// backed by real resources (an open handle, a network stream) is never
/// leaked across buffer-boundary suspensions.
pub type EntryCursor = Box<dyn Iterator<Item = DirectoryEntry> + Send>;

/// Application-supplied data source behind a virtualization root.
///
/// Calls arrive on native worker threads; implementations may block on I/O
/// but must be callable from any thread.
pub trait ProjectionProvider: Send + Sync {
    /// Enumerate one directory of the projected tree.
    ///
    /// Every call must produce a fresh cursor starting at the first entry;
    /// the router owns pause, resume and abandonment. Consumption may stop
    /// indefinitely between entries (buffer exhaustion) or never finish.
    /// `search_expression` is an optional native wildcard filter; providers
    /// may apply or ignore it.
    fn enumerate_directory(
        &self,
        relative_path: &str,
        search_expression: Option<&str>,
    ) -> EntryCursor;

    /// Resolve placeholder metadata for one path, or `None` if the path is
    /// not part of the projection.
    fn try_get_placeholder_info(
        &self,
        relative_path: &str,
        triggering_process: &TriggeringProcess,
    ) -> Option<PlaceholderInfo>;

    /// Supply exactly the requested byte range of a file's content.
    ///
    /// Returns `None` (declines) whenever `byte_offset + length` exceeds the
    /// content length. A successful return is never shorter than `length`
    /// bytes; partial reads are not part of the contract.
    fn try_get_file_data(
        &self,
        relative_path: &str,
        byte_offset: u64,
        length: u32,
        triggering_process: &TriggeringProcess,
    ) -> Option<Vec<u8>>;
}
