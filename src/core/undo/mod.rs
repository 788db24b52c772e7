//! # Undo Module
//!
//! Replays the operation log backwards, moving every relocated file back to
//! where it came from.
//!
//! A restore that fails is reported and written to the error log; it never
//! stops the remaining entries from being restored. The log is deleted only
//! when every entry was restored. Otherwise it is rewritten to hold just the
//! lines that were not, so a later undo can retry them.

use crate::core::oplog::{ErrorLog, OperationLog, OperationLogEntry};
use crate::core::relocation::{FileMover, RelocatedFile};
use crate::error::{Result, UndoError};
use crate::events::{Event, EventSender, UndoEvent};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Outcome of a completed undo
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Files moved back, as destination -> original
    pub restored: Vec<RelocatedFile>,
    pub failures: Vec<UndoError>,
    /// Lines left in the operation log for a later undo
    pub retained: usize,
}

#[derive(Debug)]
pub enum UndoOutcome {
    /// The operation log was missing or empty
    NothingToUndo,
    /// The confirmation callback declined
    Cancelled,
    Completed(UndoReport),
}

/// Restores the moves recorded in an operation log
pub struct Undo<'a> {
    operations: &'a OperationLog,
    errors: &'a ErrorLog,
    mover: &'a dyn FileMover,
}

impl<'a> Undo<'a> {
    pub fn new(operations: &'a OperationLog, errors: &'a ErrorLog, mover: &'a dyn FileMover) -> Self {
        Self {
            operations,
            errors,
            mover,
        }
    }

    /// Ask `confirm` (given the number of entries) and restore everything
    pub fn run<F>(&self, confirm: F) -> Result<UndoOutcome>
    where
        F: FnOnce(usize) -> bool,
    {
        self.run_with_events(confirm, &crate::events::null_sender())
    }

    pub fn run_with_events<F>(&self, confirm: F, events: &EventSender) -> Result<UndoOutcome>
    where
        F: FnOnce(usize) -> bool,
    {
        let entries = self.operations.entries()?;
        if entries.is_empty() {
            return Ok(UndoOutcome::NothingToUndo);
        }
        if !confirm(entries.len()) {
            info!("undo cancelled");
            return Ok(UndoOutcome::Cancelled);
        }

        events.send(Event::Undo(UndoEvent::Started {
            total_entries: entries.len(),
        }));

        let mut report = UndoReport::default();
        let mut retained = Vec::new();
        for entry in entries.into_iter().rev() {
            let line = match &entry {
                Ok(entry) => Some(entry.to_line()),
                Err(UndoError::MalformedEntry { line, .. }) => Some(line.clone()),
                Err(_) => None,
            };
            match entry.and_then(|entry| self.restore(&entry).map(|()| entry)) {
                Ok(entry) => {
                    info!(from = %entry.destination.display(), to = %entry.original.display(), "restored");
                    events.send(Event::Undo(UndoEvent::Restored {
                        from: entry.destination.clone(),
                        to: entry.original.clone(),
                    }));
                    report.restored.push(RelocatedFile {
                        from: entry.destination,
                        to: entry.original,
                    });
                }
                Err(error) => {
                    let path = failure_path(&error, self.operations.path());
                    self.errors.record(path, &error.reason())?;
                    events.send(Event::Undo(UndoEvent::Failed {
                        message: error.to_string(),
                    }));
                    report.failures.push(error);
                    retained.extend(line);
                }
            }
        }

        retained.reverse();
        self.operations.rewrite(&retained)?;
        report.retained = retained.len();
        if report.retained > 0 {
            warn!(
                retained = report.retained,
                log = %self.operations.path().display(),
                "kept unrestored entries in the operation log"
            );
        }

        events.send(Event::Undo(UndoEvent::Completed {
            restored: report.restored.len(),
            failed: report.failures.len(),
        }));

        if !report.failures.is_empty() {
            warn!(failed = report.failures.len(), "undo finished with failures");
        }
        Ok(UndoOutcome::Completed(report))
    }

    fn restore(&self, entry: &OperationLogEntry) -> std::result::Result<(), UndoError> {
        let restore_failed = |source| UndoError::RestoreFailed {
            original: entry.original.clone(),
            destination: entry.destination.clone(),
            source,
        };

        if entry.original.symlink_metadata().is_ok() {
            return Err(UndoError::TargetOccupied {
                original: entry.original.clone(),
                destination: entry.destination.clone(),
            });
        }

        if let Some(parent) = entry.original.parent() {
            fs::create_dir_all(parent).map_err(restore_failed)?;
        }

        self.mover
            .move_file(&entry.destination, &entry.original)
            .map_err(restore_failed)
    }
}

fn failure_path<'e>(error: &'e UndoError, log: &'e Path) -> &'e Path {
    match error {
        UndoError::RestoreFailed { destination, .. } | UndoError::TargetOccupied { destination, .. } => {
            destination
        }
        UndoError::MalformedEntry { .. } => log,
    }
}
