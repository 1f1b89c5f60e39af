//! Time-bounded cache of trust-anchor sets, keyed by source descriptor.
//!
//! [`TtlCache::resolve`] serves a cached set while it is younger than the
//! TTL. Once an entry is absent or expired, exactly one caller per
//! descriptor fetches from the underlying source; callers that raced it wait
//! on the descriptor's refresh lock and share the outcome. Descriptors never
//! wait on each other.

pub mod cache;
pub mod policy;

pub use cache::{CacheSettings, TtlCache};
pub use policy::StalePolicy;
