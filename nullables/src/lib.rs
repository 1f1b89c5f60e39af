//! Nullable infrastructure for deterministic testing.
//!
//! Inspired by the "A-frame architecture" pattern from RsNano.
//! External dependencies (the clock, trust-anchor retrieval) are abstracted
//! behind traits. This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests. The [`pki`]
//! module generates throwaway certificate hierarchies for the same purpose.

pub mod clock;
pub mod pki;
pub mod source;

pub use clock::NullClock;
pub use pki::TestCert;
pub use source::NullAnchorSource;
