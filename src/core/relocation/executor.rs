//! Executes relocation plans with retry, quarantine and logging.

use super::mover::FileMover;
use super::naming::unique_destination;
use super::{RelocatedFile, RelocationConfig, RelocationFailure, RelocationReport};
use crate::core::oplog::{is_recordable, ErrorLog, OperationLog};
use crate::core::quality::{MoveTarget, RelocationPlan};
use crate::error::{DoppelError, RelocationError, Result};
use crate::events::{Event, EventSender, RelocateEvent};
use std::fs;
use std::io;
use std::path::Path;
use std::thread;
use tracing::{debug, info, warn};

/// Moves non-canonical files out of the scanned tree.
///
/// Every successful move is appended to the operation log before the call
/// returns. A file that cannot be moved is sent to the quarantine folder;
/// if even that fails it stays in place and the failure is reported.
pub struct RelocationExecutor {
    config: RelocationConfig,
    mover: Box<dyn FileMover>,
    operations: OperationLog,
    errors: ErrorLog,
}

impl RelocationExecutor {
    pub fn new(
        config: RelocationConfig,
        mover: Box<dyn FileMover>,
        operations: OperationLog,
        errors: ErrorLog,
    ) -> Self {
        Self {
            config,
            mover,
            operations,
            errors,
        }
    }

    pub fn config(&self) -> &RelocationConfig {
        &self.config
    }

    pub(crate) fn mover(&self) -> &dyn FileMover {
        self.mover.as_ref()
    }

    /// Carry out one group's plan
    pub fn relocate(&self, plan: &RelocationPlan, destination: &Path) -> Result<RelocationReport> {
        self.relocate_with_events(plan, destination, &crate::events::null_sender())
    }

    pub fn relocate_with_events(
        &self,
        plan: &RelocationPlan,
        destination: &Path,
        events: &EventSender,
    ) -> Result<RelocationReport> {
        let mut report = RelocationReport::default();
        report.kept.push(plan.keep.path.clone());

        for planned in &plan.moves {
            let dir = match planned.target {
                MoveTarget::Duplicates => destination.to_path_buf(),
                MoveTarget::Thumbnails => destination.join(&self.config.thumbnails_dir),
            };
            self.relocate_file(&planned.record.path, &dir, destination, &mut report, events)?;
        }

        Ok(report)
    }

    /// Move a file that could not be fingerprinted into quarantine
    pub fn quarantine(
        &self,
        path: &Path,
        destination: &Path,
        reason: &str,
    ) -> Result<RelocationReport> {
        self.quarantine_with_events(path, destination, reason, &crate::events::null_sender())
    }

    pub fn quarantine_with_events(
        &self,
        path: &Path,
        destination: &Path,
        reason: &str,
        events: &EventSender,
    ) -> Result<RelocationReport> {
        let mut report = RelocationReport::default();
        debug!(path = %path.display(), reason, "quarantining");
        self.send_to_quarantine(path, destination, &mut report, events)?;
        Ok(report)
    }

    fn relocate_file(
        &self,
        from: &Path,
        dir: &Path,
        destination: &Path,
        report: &mut RelocationReport,
        events: &EventSender,
    ) -> Result<()> {
        ensure_dir(dir)?;

        let Some(file_name) = from.file_name() else {
            let error = RelocationError::Permanent {
                path: from.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
            };
            return self.record_failure(error, report, events);
        };
        let to = unique_destination(dir, file_name);
        if let Some(error) = unrecordable(from, &to) {
            return self.record_failure(error, report, events);
        }

        match self.move_with_retry(from, &to, report) {
            Ok(()) => {
                self.log_move(from, &to)?;
                info!(from = %from.display(), to = %to.display(), "relocated");
                events.send(Event::Relocate(RelocateEvent::Moved {
                    from: from.to_path_buf(),
                    to: to.clone(),
                }));
                report.relocated.push(RelocatedFile {
                    from: from.to_path_buf(),
                    to,
                });
                Ok(())
            }
            Err(error) => {
                self.record_failure(error, report, events)?;
                self.send_to_quarantine(from, destination, report, events)
            }
        }
    }

    fn move_with_retry(
        &self,
        from: &Path,
        to: &Path,
        report: &mut RelocationReport,
    ) -> std::result::Result<(), RelocationError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.mover.move_file(from, to) {
                Ok(()) => return Ok(()),
                Err(source) if is_transient(&source) => {
                    if attempt >= max_attempts {
                        return Err(RelocationError::Transient {
                            path: from.to_path_buf(),
                            attempts: attempt,
                            source,
                        });
                    }
                    warn!(
                        path = %from.display(),
                        attempt,
                        max_attempts,
                        error = %source,
                        "transient move failure, retrying"
                    );
                    report.retries += 1;
                    attempt += 1;
                    thread::sleep(self.config.retry_delay);
                }
                Err(source) => {
                    return Err(RelocationError::Permanent {
                        path: from.to_path_buf(),
                        source,
                    })
                }
            }
        }
    }

    fn send_to_quarantine(
        &self,
        from: &Path,
        destination: &Path,
        report: &mut RelocationReport,
        events: &EventSender,
    ) -> Result<()> {
        let dir = destination.join(&self.config.quarantine_dir);
        ensure_dir(&dir)?;

        let to = match from.file_name() {
            Some(name) => unique_destination(&dir, name),
            None => dir.join("unnamed"),
        };
        if let Some(error) = unrecordable(from, &to) {
            return self.record_failure(error, report, events);
        }

        match self.mover.move_file(from, &to) {
            Ok(()) => {
                self.log_move(from, &to)?;
                info!(from = %from.display(), to = %to.display(), "quarantined");
                events.send(Event::Relocate(RelocateEvent::Quarantined {
                    from: from.to_path_buf(),
                    to: to.clone(),
                }));
                report.quarantined.push(RelocatedFile {
                    from: from.to_path_buf(),
                    to,
                });
                Ok(())
            }
            Err(source) => self.record_failure(
                RelocationError::QuarantineFailed {
                    path: from.to_path_buf(),
                    source,
                },
                report,
                events,
            ),
        }
    }

    /// Append a completed move; if that fails, try to put the file back
    /// before giving up on the run
    fn log_move(&self, from: &Path, to: &Path) -> Result<()> {
        if let Err(error) = self.operations.append(from, to) {
            if let Err(undo) = self.mover.move_file(to, from) {
                warn!(
                    from = %to.display(),
                    to = %from.display(),
                    error = %undo,
                    "could not restore file after log failure"
                );
            }
            return Err(DoppelError::Log(error));
        }
        Ok(())
    }

    fn record_failure(
        &self,
        error: RelocationError,
        report: &mut RelocationReport,
        events: &EventSender,
    ) -> Result<()> {
        let message = error.reason();
        self.errors.record(error.path(), &message)?;
        events.send(Event::Relocate(RelocateEvent::Failed {
            path: error.path().to_path_buf(),
            message: message.clone(),
        }));
        report.errors.push(RelocationFailure {
            path: error.path().to_path_buf(),
            message,
        });
        Ok(())
    }
}

/// A move whose paths cannot be written to the operation log could never be
/// undone, so it is refused up front
fn unrecordable(from: &Path, to: &Path) -> Option<RelocationError> {
    let target = [from, to].into_iter().find(|p| !is_recordable(p))?;
    Some(RelocationError::Unloggable {
        path: from.to_path_buf(),
        target: target.to_path_buf(),
    })
}

fn is_transient(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::PermissionDenied | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| {
        DoppelError::Relocation(RelocationError::DestinationUnavailable {
            path: dir.to_path_buf(),
            source,
        })
    })
}
