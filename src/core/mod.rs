//! # Core Module
//!
//! The presentation-agnostic duplicate detection engine.
//!
//! ## Modules
//! - `scanner` - Discovers files of one media category
//! - `fingerprint` - Content digests, perceptual image codes and video signatures
//! - `grouper` - Buckets or clusters fingerprints into duplicate groups
//! - `quality` - Picks the copy to keep and spots thumbnails
//! - `relocation` - Moves the other copies aside with retry and quarantine
//! - `oplog` - Operation and error logs
//! - `undo` - Replays the operation log backwards
//! - `engine` - Orchestrates the full workflow

pub mod engine;
pub mod fingerprint;
pub mod grouper;
pub mod oplog;
pub mod quality;
pub mod relocation;
pub mod scanner;
pub mod undo;

// Re-export commonly used types
pub use engine::{Engine, EngineBuilder, ScanOutcome};
pub use fingerprint::{Fingerprint, HashAlgorithmKind, VideoHashMode};
pub use grouper::{DuplicateGroup, MatchType};
pub use relocation::RelocationReport;
pub use scanner::{FileRecord, MediaCategory};
pub use undo::UndoOutcome;
