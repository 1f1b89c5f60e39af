//! The trust validator engine.
//!
//! Wires configuration into a running validator:
//! - [`ContextRouter`] maps each verification context to its trusted list
//!   and keystore.
//! - [`Fallback`] tries the trusted list, then the keystore, over TTL-cached
//!   anchor sets.
//! - [`TrustStore`] and [`TrustStoreRefresher`] serve the simple
//!   service-type profile.
//! - [`CacheEviction`] wipes the trusted-list document cache periodically.
//! - [`TrustValidator`] owns the background tasks and the HTTP server.

pub mod config;
pub mod engine;
pub mod error;
pub mod eviction;
pub mod fallback;
pub mod metrics;
pub mod refresher;
pub mod router;
pub mod shutdown;
pub mod strategy;
pub mod trust_store;
pub mod validator;
pub mod verify_trust;

pub use config::ValidatorConfig;
pub use engine::TrustEngine;
pub use error::{ConfigError, EngineError};
pub use eviction::CacheEviction;
pub use fallback::Fallback;
pub use metrics::ValidatorMetrics;
pub use refresher::TrustStoreRefresher;
pub use router::{ContextRouter, Routes, SourceKind};
pub use shutdown::ShutdownController;
pub use strategy::{ResolutionStrategy, SourceStrategy};
pub use trust_store::TrustStore;
pub use validator::TrustValidator;
pub use verify_trust::VerifyTrust;
