//! # Events Module
//!
//! Event-driven progress reporting.
//!
//! ## Design
//! The engine emits events through channels, allowing any front end
//! to subscribe and display progress without the engine knowing about it.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Fingerprint(FingerprintEvent::Progress(p)) = event {
//!             println!("Fingerprinted {}/{}", p.completed, p.total);
//!         }
//!     }
//! });
//!
//! engine.scan_and_group_with_events(&root, MediaCategory::Audio, &extensions, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
