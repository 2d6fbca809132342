//! Callback router: translates OS projection callbacks into provider calls.
//!
//! The native layer invokes the five entry points on worker threads it owns.
//! The router keeps per-enumeration cursor state in a [`SessionTable`] and
//! writes results back through the sink traits in [`crate::native`], honoring
//! the continuation protocol: an entry is only advanced past once it has been
//! written, so a buffer-exhaustion boundary never skips or duplicates
//! entries.

mod session;

pub use session::{EnumerationSession, SessionTable};

use std::sync::Arc;

use uuid::Uuid;

use crate::error::ProjectionError;
use crate::native::{BasicInfoRecord, DirEntrySink, FileDataSink, FillError, PlaceholderRecord, PlaceholderSink};
use crate::process::TriggeringProcess;
use crate::provider::ProjectionProvider;

/// Result of a callback that may legitimately find nothing.
///
/// `NotFound` is a designed negative outcome, distinct from a fault: the
/// adapter reports it through the native not-found convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The provider handled the request and output was written.
    Handled,
    /// The path is not part of the projection, or the provider declined.
    NotFound,
}

/// Routes native projection callbacks to a [`ProjectionProvider`].
pub struct CallbackRouter {
    provider: Arc<dyn ProjectionProvider>,
    sessions: SessionTable,
}

impl CallbackRouter {
    pub fn new(provider: Arc<dyn ProjectionProvider>) -> Self {
        Self {
            provider,
            sessions: SessionTable::new(),
        }
    }

    /// Number of currently open enumeration sessions.
    pub fn active_enumerations(&self) -> usize {
        self.sessions.len()
    }

    /// Start-enumeration entry point: register a session for `id`.
    pub fn start_directory_enumeration(
        &self,
        id: Uuid,
        relative_path: &str,
    ) -> Result<(), ProjectionError> {
        tracing::debug!(%id, path = relative_path, "start directory enumeration");
        self.sessions.insert(id, relative_path.to_string())
    }

    /// Get-enumeration entry point: fill `sink` with as many entries as fit.
    ///
    /// Re-invoked by the OS after buffer exhaustion; continues from the
    /// pending entry. With `restart_scan` set, any partially consumed cursor
    /// is dropped and enumeration restarts from the provider's first entry.
    pub fn get_directory_enumeration(
        &self,
        id: Uuid,
        restart_scan: bool,
        search_expression: Option<&str>,
        sink: &mut dyn DirEntrySink,
    ) -> Result<(), ProjectionError> {
        let session = self
            .sessions
            .get(id)
            .ok_or(ProjectionError::UnknownEnumeration(id))?;
        let mut session = session.lock();

        if !session.has_cursor() || restart_scan {
            let relative_path = session.relative_path().to_string();
            tracing::debug!(
                %id,
                path = relative_path,
                restart_scan,
                search = search_expression.unwrap_or(""),
                "opening enumeration cursor"
            );
            let cursor = self
                .provider
                .enumerate_directory(&relative_path, search_expression);
            session.reset_cursor(cursor);
        }

        loop {
            let (name, record) = match session.pending() {
                Some(entry) => (entry.name.clone(), BasicInfoRecord::from(&entry.basic_info)),
                None => break,
            };

            match sink.try_fill(&name, &record) {
                // Only advance past an entry once it has been written.
                Ok(()) => session.advance(),
                // Out of space; the OS calls back with a fresh buffer and we
                // resume from the retained pending entry.
                Err(FillError::BufferFull) => break,
                Err(FillError::Native { status }) => {
                    return Err(ProjectionError::Native {
                        operation: "fill_dir_entry_buffer",
                        status,
                    });
                }
            }
        }

        Ok(())
    }

    /// End-enumeration entry point: remove the session and release its cursor.
    pub fn end_directory_enumeration(&self, id: Uuid) -> Result<(), ProjectionError> {
        tracing::debug!(%id, "end directory enumeration");
        self.sessions
            .remove(id)
            .map(drop)
            .ok_or(ProjectionError::UnknownEnumeration(id))
    }

    /// Get-placeholder-info entry point.
    ///
    /// A provider miss completes without writing anything; the adapter maps
    /// [`CallbackOutcome::NotFound`] to the native not-found convention.
    pub fn get_placeholder_info(
        &self,
        relative_path: &str,
        triggering_process: &TriggeringProcess,
        sink: &mut dyn PlaceholderSink,
    ) -> Result<CallbackOutcome, ProjectionError> {
        tracing::debug!(
            path = relative_path,
            pid = triggering_process.process_id(),
            "get placeholder info"
        );
        match self
            .provider
            .try_get_placeholder_info(relative_path, triggering_process)
        {
            Some(info) => {
                let record = PlaceholderRecord::from(&info);
                sink.write_placeholder(relative_path, &record)?;
                Ok(CallbackOutcome::Handled)
            }
            None => Ok(CallbackOutcome::NotFound),
        }
    }

    /// Get-file-data entry point.
    ///
    /// The provider either supplies exactly the requested range or declines;
    /// on decline nothing is written and the OS surfaces the failure to the
    /// reading process.
    pub fn get_file_data(
        &self,
        relative_path: &str,
        byte_offset: u64,
        length: u32,
        triggering_process: &TriggeringProcess,
        sink: &mut dyn FileDataSink,
    ) -> Result<CallbackOutcome, ProjectionError> {
        tracing::debug!(
            path = relative_path,
            byte_offset,
            length,
            "get file data"
        );
        match self.provider.try_get_file_data(
            relative_path,
            byte_offset,
            length,
            triggering_process,
        ) {
            Some(data) => {
                sink.write_data(byte_offset, &data)?;
                Ok(CallbackOutcome::Handled)
            }
            None => Ok(CallbackOutcome::NotFound),
        }
    }
}
