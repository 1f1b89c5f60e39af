//! HTTP surface of the trust validator.
//!
//! Provides endpoints for:
//! - Trust queries by verification context (`POST /trust`)
//! - Trust queries by service type (`POST /trust/service-type`)
//! - Liveness (`GET /health`)
//! - Prometheus metrics (`GET /metrics`)
//!
//! The server only decodes, dispatches and encodes; decisions come from a
//! [`TrustQueryService`].

pub mod cors;
pub mod encoding;
pub mod error;
pub mod handlers;
pub mod server;
pub mod service;

pub use cors::CorsSettings;
pub use error::RpcError;
pub use server::{router, RpcServer};
pub use service::TrustQueryService;
