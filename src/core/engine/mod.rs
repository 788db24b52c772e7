//! # Engine Module
//!
//! Orchestrates the full duplicate detection and resolution workflow.
//!
//! ## Stages
//! 1. **Scan** - Discover files with the category's extensions
//! 2. **Fingerprint** - Run the category's strategy on every file
//! 3. **Group** - Exact buckets or first-fit clusters
//! 4. **Resolve** - Keep the best member of each group, move the rest
//!
//! Undo is a separate operation that replays the operation log backwards.
//!
//! ## Example
//! ```rust,ignore
//! let engine = Engine::builder().log_dir("/tmp/doppel").build()?;
//! let outcome = engine.scan_and_group(&root, MediaCategory::Audio, ["mp3", "wav"])?;
//! let report = engine.resolve(&outcome.groups, &destination)?;
//! ```

mod executor;

pub use executor::{Engine, EngineBuilder, EngineConfig, FingerprintFailure, ScanOutcome};
