//! Trust-anchor sources.
//!
//! Every source implements [`TrustAnchorSource`]: given a
//! [`SourceDescriptor`](trustval_types::SourceDescriptor) it produces the
//! current [`TrustAnchorSet`](trustval_types::TrustAnchorSet) or a
//! [`FetchError`](trustval_types::FetchError). Two kinds exist:
//!
//! - [`KeyStoreSource`]: certificates from a local PEM bundle or directory,
//!   filtered by alias.
//! - [`TrustedListSource`]: a published trusted list, downloaded over HTTP(S)
//!   (or read from a file) and kept in an on-disk [`DocumentCache`].
//!
//! [`AnchorSources`] dispatches a descriptor to the source for its kind.

pub mod dispatch;
pub mod document_cache;
pub mod error;
pub mod keystore;
pub mod pem;
pub mod source;
pub mod trusted_list;

pub use dispatch::AnchorSources;
pub use document_cache::DocumentCache;
pub use error::SourceError;
pub use keystore::{KeyStore, KeyStoreEntry, KeyStoreSource};
pub use source::TrustAnchorSource;
pub use trusted_list::{PemBundleParser, TrustedListParser, TrustedListSource};
