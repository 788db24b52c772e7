//! # doppelfiles
//!
//! Finds duplicate and near-duplicate files in a directory tree, keeps the
//! best copy of each, and moves the rest into a destination folder.
//!
//! ## Core Philosophy
//! - **Never delete** - Duplicates are moved, never removed
//! - **Always reversible** - Every move is logged and can be undone
//! - **Keep the best** - Highest resolution, longest, largest copy stays put
//!
//! ## Architecture
//! - `core` - The duplicate detection and relocation engine
//! - `events` - Event-driven progress reporting
//! - `error` - Error taxonomy

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{DoppelError, Result};

/// Initialize tracing for the library
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies. This should
/// be called once by the application entry point.
pub fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
