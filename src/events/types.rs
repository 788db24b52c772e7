//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// File discovery events
    Scan(ScanEvent),
    /// Fingerprinting events
    Fingerprint(FingerprintEvent),
    /// Grouping events
    Group(GroupEvent),
    /// Relocation events
    Relocate(RelocateEvent),
    /// Undo events
    Undo(UndoEvent),
    /// Engine-level events
    Engine(EngineEvent),
}

/// Events during the discovery phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { root: PathBuf },
    /// A matching file was found
    FileFound { path: PathBuf },
    /// An error occurred but scanning continues
    Error { path: PathBuf, message: String },
    /// Scanning completed
    Completed { total_files: usize },
}

/// Events during the fingerprinting phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FingerprintEvent {
    /// Fingerprinting has started
    Started { total_files: usize },
    /// Progress update after each file
    Progress(FingerprintProgress),
    /// A file could not be fingerprinted
    Failed { path: PathBuf, message: String },
    /// Fingerprinting completed
    Completed {
        total_fingerprinted: usize,
        failures: usize,
    },
}

/// Progress information during fingerprinting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintProgress {
    /// Number of files processed so far
    pub completed: usize,
    /// Total number of files to process
    pub total: usize,
    /// File just processed
    pub current_path: PathBuf,
}

/// Events during the grouping phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GroupEvent {
    /// A duplicate group was formed
    GroupFound { group_id: String, file_count: usize },
    /// Grouping completed
    Completed {
        total_groups: usize,
        total_duplicates: usize,
    },
}

/// Events during relocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RelocateEvent {
    /// Relocation has started
    Started { total_moves: usize },
    /// A file was moved to the destination
    Moved { from: PathBuf, to: PathBuf },
    /// A file was moved to quarantine
    Quarantined { from: PathBuf, to: PathBuf },
    /// A file could not be moved anywhere
    Failed { path: PathBuf, message: String },
    /// Relocation completed
    Completed {
        relocated: usize,
        quarantined: usize,
        errors: usize,
    },
}

/// Events during undo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UndoEvent {
    /// Undo has started
    Started { total_entries: usize },
    /// A file was restored to its original location
    Restored { from: PathBuf, to: PathBuf },
    /// A single restore failed
    Failed { message: String },
    /// Undo completed
    Completed { restored: usize, failed: usize },
}

/// Engine-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EngineEvent {
    /// Moving to a new phase
    PhaseChanged { phase: EnginePhase },
    /// The engine hit a fatal error
    Error { message: String },
}

/// Phases of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnginePhase {
    Scanning,
    Fingerprinting,
    Grouping,
    Relocating,
    Undoing,
}

impl std::fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnginePhase::Scanning => write!(f, "Scanning"),
            EnginePhase::Fingerprinting => write!(f, "Fingerprinting"),
            EnginePhase::Grouping => write!(f, "Grouping"),
            EnginePhase::Relocating => write!(f, "Relocating"),
            EnginePhase::Undoing => write!(f, "Undoing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Fingerprint(FingerprintEvent::Progress(FingerprintProgress {
            completed: 10,
            total: 50,
            current_path: PathBuf::from("/music/track.mp3"),
        }));

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Fingerprint(FingerprintEvent::Progress(p)) => {
                assert_eq!(p.total, 50);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn phase_display() {
        assert_eq!(EnginePhase::Fingerprinting.to_string(), "Fingerprinting");
        assert_eq!(EnginePhase::Undoing.to_string(), "Undoing");
    }
}
