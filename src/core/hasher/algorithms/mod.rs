//! Fingerprint algorithm implementations.

mod difference;

pub use difference::DifferenceHasher;
