//! Demo provider binary: projects a small fixed tree under a root directory.
//!
//! The projected tree contains files `a` and `b` and a directory `c` at the
//! root; every projected directory below the root contains a single file
//! `d`. All files share the same demo content.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use clap::Parser;

use projfs_kit::{
    DirectoryEntry, EntryCursor, FileBasicInfo, PlaceholderInfo, ProjectionProvider,
    TriggeringProcess, VirtualizationInstance,
};

const DEMO_CONTENT: &[u8] = b"This is a virtual file!";

#[derive(Parser)]
#[command(name = "projfs-kit", about = "Project a demo directory tree over ProjFS")]
struct Args {
    /// Directory to create as the virtualization root.
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,
}

/// Fixed demo tree served from memory.
struct DemoProvider {
    timestamp: SystemTime,
}

impl DemoProvider {
    fn new() -> Self {
        Self {
            timestamp: SystemTime::now(),
        }
    }

    fn file_info(&self) -> FileBasicInfo {
        FileBasicInfo::file(
            DEMO_CONTENT.len() as i64,
            self.timestamp,
            self.timestamp,
            self.timestamp,
            self.timestamp,
        )
    }

    fn dir_info(&self) -> FileBasicInfo {
        FileBasicInfo::directory(self.timestamp, self.timestamp, self.timestamp, self.timestamp)
    }
}

/// Final path component, with both native and forward-slash separators
/// treated as boundaries.
fn file_name(relative_path: &str) -> &str {
    relative_path
        .rsplit(['\\', '/'])
        .next()
        .unwrap_or(relative_path)
}

impl ProjectionProvider for DemoProvider {
    fn enumerate_directory(&self, relative_path: &str, _search: Option<&str>) -> EntryCursor {
        let entries: Vec<DirectoryEntry> = if relative_path.is_empty() {
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
        triggering_process: &TriggeringProcess,
    ) -> Option<PlaceholderInfo> {
        match triggering_process.process() {
            Ok(resolved) => tracing::info!(
                path = relative_path,
                pid = triggering_process.process_id(),
                exe = %resolved.executable_path.display(),
                "placeholder requested"
            ),
            Err(_) => tracing::info!(
                path = relative_path,
                pid = triggering_process.process_id(),
                image = triggering_process.image_file_name(),
                "placeholder requested"
            ),
        }

        match file_name(relative_path) {
            "a" | "b" | "d" => Some(PlaceholderInfo::new(self.file_info())),
            "c" => Some(PlaceholderInfo::new(self.dir_info())),
            _ => None,
        }
    }

    fn try_get_file_data(
        &self,
        relative_path: &str,
        byte_offset: u64,
        length: u32,
        _triggering_process: &TriggeringProcess,
    ) -> Option<Vec<u8>> {
        tracing::info!(path = relative_path, byte_offset, length, "file data requested");

        let end = byte_offset.checked_add(length as u64)?;
        if end > DEMO_CONTENT.len() as u64 {
            return None;
        }
        Some(DEMO_CONTENT[byte_offset as usize..end as usize].to_vec())
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    if !projfs_kit::projfs_supported() {
        tracing::warn!("native projection is unavailable on this platform");
    }

    let root = std::path::absolute(&args.directory)?;
    tracing::info!(root = %root.display(), "starting virtualization");

    let instance = VirtualizationInstance::new(root, Arc::new(DemoProvider::new()));
    instance.start()?;

    let running = Arc::new(AtomicBool::new(true));
    let running_handler = running.clone();
    ctrlc::set_handler(move || {
        if running_handler.swap(false, Ordering::SeqCst) {
            eprintln!("shutting down, press Ctrl+C again to force exit");
        } else {
            std::process::exit(130);
        }
    })?;

    println!(
        "virtualizing {} (press Ctrl+C to stop)",
        instance.root_path().display()
    );
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    instance.stop()?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
