//! End-to-end tests for the projection core.
//!
//! Drives the public API the way the native layer would: lifecycle through
//! a substitute backend, callbacks through the router with in-memory sinks.

use std::sync::Arc;
use std::time::UNIX_EPOCH;

use tempfile::TempDir;
use uuid::Uuid;

use projfs_kit::native::{
    BasicInfoRecord, DirEntrySink, FileDataSink, FillError, PlaceholderRecord, PlaceholderSink,
};
use projfs_kit::router::CallbackRouter;
use projfs_kit::virtualizer::VirtualizationBackend;
use projfs_kit::{
    CallbackOutcome, DirectoryEntry, EntryCursor, FileBasicInfo, PlaceholderInfo,
    ProjectionError, ProjectionProvider, TriggeringProcess, VirtualizationInstance,
};

const CONTENT: &[u8] = b"This is a virtual file!";

/// Demo tree: files `a` and `b` plus directory `c` at the root, a single
/// file `d` in every directory below it.
struct DemoProvider;

impl DemoProvider {
    fn file_info(&self) -> FileBasicInfo {
        FileBasicInfo::file(
            CONTENT.len() as i64,
            UNIX_EPOCH,
            UNIX_EPOCH,
            UNIX_EPOCH,
            UNIX_EPOCH,
        )
    }

    fn dir_info(&self) -> FileBasicInfo {
        FileBasicInfo::directory(UNIX_EPOCH, UNIX_EPOCH, UNIX_EPOCH, UNIX_EPOCH)
    }
}

impl ProjectionProvider for DemoProvider {
    fn enumerate_directory(&self, relative_path: &str, _search: Option<&str>) -> EntryCursor {
        let entries = if relative_path.is_empty() {
            vec![
                DirectoryEntry::new("a", self.file_info()),
                DirectoryEntry::new("b", self.file_info()),
                DirectoryEntry::new("c", self.dir_info()),
            ]
        } else {
            vec![DirectoryEntry::new("d", self.file_info())]
        };
        Box::new(entries.into_iter())
    }

    fn try_get_placeholder_info(
        &self,
        relative_path: &str,
        _process: &TriggeringProcess,
    ) -> Option<PlaceholderInfo> {
        match relative_path.rsplit('\\').next().unwrap_or(relative_path) {
            "a" | "b" | "d" => Some(PlaceholderInfo::new(self.file_info())),
            "c" => Some(PlaceholderInfo::new(self.dir_info())),
            _ => None,
        }
    }

    fn try_get_file_data(
        &self,
        _relative_path: &str,
        byte_offset: u64,
        length: u32,
        _process: &TriggeringProcess,
    ) -> Option<Vec<u8>> {
        let end = byte_offset.checked_add(length as u64)?;
        if end > CONTENT.len() as u64 {
            return None;
        }
        Some(CONTENT[byte_offset as usize..end as usize].to_vec())
    }
}

struct CappedSink {
    capacity: usize,
    written: Vec<(String, BasicInfoRecord)>,
}

impl CappedSink {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            written: Vec::new(),
        }
    }

    fn names(&self) -> Vec<&str> {
        self.written.iter().map(|(n, _)| n.as_str()).collect()
    }
}

impl DirEntrySink for CappedSink {
    fn try_fill(&mut self, name: &str, info: &BasicInfoRecord) -> Result<(), FillError> {
        if self.written.len() >= self.capacity {
            return Err(FillError::BufferFull);
        }
        self.written.push((name.to_string(), *info));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingPlaceholderSink {
    written: Vec<(String, PlaceholderRecord)>,
}

impl PlaceholderSink for RecordingPlaceholderSink {
    fn write_placeholder(
        &mut self,
        relative_path: &str,
        record: &PlaceholderRecord,
    ) -> Result<(), ProjectionError> {
        self.written.push((relative_path.to_string(), *record));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingDataSink {
    written: Vec<(u64, Vec<u8>)>,
}

impl FileDataSink for RecordingDataSink {
    fn write_data(&mut self, byte_offset: u64, data: &[u8]) -> Result<(), ProjectionError> {
        self.written.push((byte_offset, data.to_vec()));
        Ok(())
    }
}

fn process() -> TriggeringProcess {
    TriggeringProcess::new(std::process::id(), "projection-test")
}

#[test]
fn test_full_projection_flow() {
    let router = CallbackRouter::new(Arc::new(DemoProvider));
    let pid = process();

    // Enumerate the root in two buffer-limited passes.
    let id = Uuid::new_v4();
    router.start_directory_enumeration(id, "").unwrap();

    let mut sink = CappedSink::new(2);
    router
        .get_directory_enumeration(id, false, None, &mut sink)
        .unwrap();
    assert_eq!(sink.names(), ["a", "b"]);

    let mut sink = CappedSink::new(16);
    router
        .get_directory_enumeration(id, false, None, &mut sink)
        .unwrap();
    assert_eq!(sink.names(), ["c"]);
    assert!(sink.written[0].1.is_directory);

    router.end_directory_enumeration(id).unwrap();
    assert_eq!(router.active_enumerations(), 0);

    // Materialize a placeholder for one of the enumerated files.
    let mut placeholder_sink = RecordingPlaceholderSink::default();
    let outcome = router
        .get_placeholder_info("a", &pid, &mut placeholder_sink)
        .unwrap();
    assert_eq!(outcome, CallbackOutcome::Handled);
    assert_eq!(
        placeholder_sink.written[0].1.basic_info.file_size,
        CONTENT.len() as i64
    );

    // Hydrate its content.
    let mut data_sink = RecordingDataSink::default();
    let outcome = router
        .get_file_data("a", 0, CONTENT.len() as u32, &pid, &mut data_sink)
        .unwrap();
    assert_eq!(outcome, CallbackOutcome::Handled);
    assert_eq!(data_sink.written, [(0, CONTENT.to_vec())]);
}

#[test]
fn test_nested_directory_projects_single_file() {
    let router = CallbackRouter::new(Arc::new(DemoProvider));

    let id = Uuid::new_v4();
    router.start_directory_enumeration(id, "c").unwrap();

    let mut sink = CappedSink::new(16);
    router
        .get_directory_enumeration(id, false, None, &mut sink)
        .unwrap();
    assert_eq!(sink.names(), ["d"]);

    router.end_directory_enumeration(id).unwrap();

    let mut placeholder_sink = RecordingPlaceholderSink::default();
    let outcome = router
        .get_placeholder_info("c\\d", &process(), &mut placeholder_sink)
        .unwrap();
    assert_eq!(outcome, CallbackOutcome::Handled);
    assert!(!placeholder_sink.written[0].1.basic_info.is_directory);
}

#[test]
fn test_concurrent_enumerations_are_independent() {
    let router = CallbackRouter::new(Arc::new(DemoProvider));

    let root_id = Uuid::new_v4();
    let nested_id = Uuid::new_v4();
    router.start_directory_enumeration(root_id, "").unwrap();
    router.start_directory_enumeration(nested_id, "c").unwrap();
    assert_eq!(router.active_enumerations(), 2);

    // Partially drain the root session, fully drain the nested one.
    let mut sink = CappedSink::new(1);
    router
        .get_directory_enumeration(root_id, false, None, &mut sink)
        .unwrap();
    assert_eq!(sink.names(), ["a"]);

    let mut sink = CappedSink::new(16);
    router
        .get_directory_enumeration(nested_id, false, None, &mut sink)
        .unwrap();
    assert_eq!(sink.names(), ["d"]);

    // The root session resumes where it left off.
    let mut sink = CappedSink::new(16);
    router
        .get_directory_enumeration(root_id, false, None, &mut sink)
        .unwrap();
    assert_eq!(sink.names(), ["b", "c"]);

    router.end_directory_enumeration(root_id).unwrap();
    router.end_directory_enumeration(nested_id).unwrap();
    assert_eq!(router.active_enumerations(), 0);
}

#[test]
fn test_out_of_range_read_is_declined() {
    let router = CallbackRouter::new(Arc::new(DemoProvider));

    let mut data_sink = RecordingDataSink::default();
    let outcome = router
        .get_file_data("a", 16, 16, &process(), &mut data_sink)
        .unwrap();
    assert_eq!(outcome, CallbackOutcome::NotFound);
    assert!(data_sink.written.is_empty());
}

/// Backend standing in for the native subsystem in lifecycle tests.
#[derive(Default)]
struct NullBackend;

impl VirtualizationBackend for NullBackend {
    fn mark_root_as_placeholder(
        &self,
        _root: &std::path::Path,
        _instance_id: Uuid,
    ) -> Result<(), ProjectionError> {
        Ok(())
    }

    fn start_virtualizing(
        &self,
        _root: &std::path::Path,
        _router: Arc<CallbackRouter>,
    ) -> Result<(), ProjectionError> {
        Ok(())
    }

    fn stop_virtualizing(&self) {}
}

#[test]
fn test_lifecycle_round_trip() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("virtroot");

    let instance = VirtualizationInstance::with_backend(
        root.clone(),
        Arc::new(DemoProvider),
        Box::new(NullBackend),
    );

    instance.start().unwrap();
    assert!(instance.is_running());
    assert!(root.is_dir());

    // The instance's router serves callbacks while running.
    let id = Uuid::new_v4();
    instance.router().start_directory_enumeration(id, "").unwrap();
    let mut sink = CappedSink::new(16);
    instance
        .router()
        .get_directory_enumeration(id, false, None, &mut sink)
        .unwrap();
    assert_eq!(sink.names(), ["a", "b", "c"]);
    instance.router().end_directory_enumeration(id).unwrap();

    instance.stop().unwrap();
    assert!(!instance.is_running());
    assert!(!root.exists());
}

#[test]
fn test_existing_root_rejected() {
    let temp = TempDir::new().unwrap();

    let instance = VirtualizationInstance::with_backend(
        temp.path().to_path_buf(),
        Arc::new(DemoProvider),
        Box::new(NullBackend),
    );

    let err = instance.start().unwrap_err();
    assert!(matches!(err, ProjectionError::RootAlreadyExists(_)));
}

#[cfg(not(windows))]
#[test]
fn test_native_backend_unsupported_off_windows() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("virtroot");

    let instance = VirtualizationInstance::new(root, Arc::new(DemoProvider));
    let err = instance.start().unwrap_err();
    assert!(matches!(err, ProjectionError::Unsupported(_)));

    // Cleanup still works even though start failed.
    instance.stop().unwrap();
}
