//! # SnapMatch
//!
//! Traces edited photos back to the raw originals they came from.
//!
//! Every photo is reduced to a 64-bit perceptual fingerprint. Each edited
//! photo is matched to the raw photo with the nearest fingerprint, and a
//! match counts when the two differ in at most a configured number of
//! bits. Resizes, recompression and light colour work survive this;
//! rotation, mirroring and heavy crops do not.
//!
//! ## Architecture
//! - `core` - The fingerprinting and matching engine
//! - `events` - Event-driven progress reporting
//! - `error` - Error types

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{Result, SnapMatchError};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. Logs go to
/// stderr. `RUST_LOG` takes precedence over `verbose`. Calling it twice
/// is harmless.
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "snapmatch=info" } else { "snapmatch=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
