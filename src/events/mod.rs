//! # Events Module
//!
//! Progress reporting for the matching engine.
//!
//! The engine emits events through a channel so the CLI can drive
//! progress bars from a separate thread without the engine knowing
//! anything about terminals.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Fingerprint(FingerprintEvent::Progress(p)) = event {
//!             println!("{} {}/{}", p.set, p.completed, p.total);
//!         }
//!     }
//! });
//!
//! pipeline.run_with_events(&sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
