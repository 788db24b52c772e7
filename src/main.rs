//! # doppelfiles CLI
//!
//! Command-line interface for the duplicate file engine.
//!
//! ## Usage
//! ```bash
//! doppelfiles scan ~/Music --category audio --dest ~/Music-duplicates
//! doppelfiles scan ~/Photos --category image --dest ~/dups --dry-run --output json
//! doppelfiles undo
//! ```

mod cli;

use doppelfiles::Result;

fn main() -> Result<()> {
    cli::run()
}
