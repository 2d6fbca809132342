//! Identity of the process whose file operation triggered a callback.

use std::path::PathBuf;
use std::sync::OnceLock;

use crate::error::ProjectionError;

/// Fully resolved information about a triggering process.
#[derive(Clone, Debug)]
pub struct ResolvedProcess {
    /// Absolute path of the process executable.
    pub executable_path: PathBuf,
}

/// The (process id, image name) pair handed to the core by the OS, with
/// full process information resolved lazily on first use.
///
/// Resolution may fail independently of the callback path (the process may
/// already have exited); the identifier accessors never fail, and nothing
/// forces resolution unless [`TriggeringProcess::process`] is called.
/// Resolution is safe from any thread.
#[derive(Debug)]
pub struct TriggeringProcess {
    process_id: u32,
    image_file_name: String,
    resolved: OnceLock<Result<ResolvedProcess, ProjectionError>>,
}

impl TriggeringProcess {
    /// Capture the identifiers supplied by the OS for one callback.
    pub fn new(process_id: u32, image_file_name: impl Into<String>) -> Self {
        Self {
            process_id,
            image_file_name: image_file_name.into(),
            resolved: OnceLock::new(),
        }
    }

    /// OS process identifier.
    pub fn process_id(&self) -> u32 {
        self.process_id
    }

    /// Image file name reported by the OS for the triggering process.
    pub fn image_file_name(&self) -> &str {
        &self.image_file_name
    }

    /// Resolve (once) and return full process information.
    pub fn process(&self) -> Result<&ResolvedProcess, &ProjectionError> {
        self.resolved
            .get_or_init(|| resolve_process(self.process_id))
            .as_ref()
    }
}

#[cfg(windows)]
fn resolve_process(process_id: u32) -> Result<ResolvedProcess, ProjectionError> {
    use windows::core::PWSTR;
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Threading::{
        OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32,
        PROCESS_QUERY_LIMITED_INFORMATION,
    };

    let failure = |message: String| ProjectionError::ProcessResolution {
        process_id,
        message,
    };

    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, process_id)
            .map_err(|e| failure(e.message()))?;

        let mut buffer = [0u16; 1024];
        let mut len: u32 = buffer.len() as u32;
        let result = QueryFullProcessImageNameW(
            handle,
            PROCESS_NAME_WIN32,
            PWSTR(buffer.as_mut_ptr()),
            &mut len,
        );
        let _ = CloseHandle(handle);
        result.map_err(|e| failure(e.message()))?;

        let path = String::from_utf16_lossy(&buffer[..len as usize]);
        Ok(ResolvedProcess {
            executable_path: PathBuf::from(path),
        })
    }
}

#[cfg(target_os = "linux")]
fn resolve_process(process_id: u32) -> Result<ResolvedProcess, ProjectionError> {
    let executable_path =
        std::fs::read_link(format!("/proc/{}/exe", process_id)).map_err(|e| {
            ProjectionError::ProcessResolution {
                process_id,
                message: e.to_string(),
            }
        })?;
    Ok(ResolvedProcess { executable_path })
}

#[cfg(not(any(windows, target_os = "linux")))]
fn resolve_process(process_id: u32) -> Result<ResolvedProcess, ProjectionError> {
    Err(ProjectionError::ProcessResolution {
        process_id,
        message: "process resolution is not supported on this platform".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers_do_not_resolve() {
        // A pid that certainly does not exist; accessors must still work.
        let process = TriggeringProcess::new(u32::MAX - 1, "ghost.exe");
        assert_eq!(process.process_id(), u32::MAX - 1);
        assert_eq!(process.image_file_name(), "ghost.exe");
    }

    #[test]
    fn test_failed_resolution_is_stable() {
        let process = TriggeringProcess::new(u32::MAX - 1, "ghost.exe");
        assert!(process.process().is_err());
        // Second call returns the cached result, no panic, no re-resolution.
        assert!(process.process().is_err());
    }

    #[cfg(any(windows, target_os = "linux"))]
    #[test]
    fn test_resolves_own_process() {
        let process = TriggeringProcess::new(std::process::id(), "self");
        let resolved = process.process().expect("own process should resolve");
        assert!(!resolved.executable_path.as_os_str().is_empty());
    }
}
