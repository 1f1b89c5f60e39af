//! Nullable trust-anchor source: scripted results, counted calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use trustval_sources::TrustAnchorSource;
use trustval_types::{FetchError, SourceDescriptor, TrustAnchorSet};

type Scripted = Result<TrustAnchorSet, FetchError>;

#[derive(Default)]
struct Script {
    responses: HashMap<SourceDescriptor, Scripted>,
    delays: HashMap<SourceDescriptor, Duration>,
    calls: HashMap<SourceDescriptor, usize>,
}

/// A trust-anchor source that answers from a script.
///
/// Unscripted descriptors fail with [`FetchError::Unsupported`]. Every call is
/// counted, and a per-descriptor delay can be set to hold a fetch in flight.
#[derive(Default)]
pub struct NullAnchorSource {
    script: Mutex<Script>,
    total_calls: AtomicUsize,
}

impl NullAnchorSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `descriptor` with `anchors` from now on.
    pub fn respond(&self, descriptor: &SourceDescriptor, anchors: TrustAnchorSet) {
        self.lock()
            .responses
            .insert(descriptor.clone(), Ok(anchors));
    }

    /// Fail `descriptor` with `error` from now on.
    pub fn fail(&self, descriptor: &SourceDescriptor, error: FetchError) {
        self.lock()
            .responses
            .insert(descriptor.clone(), Err(error));
    }

    /// Sleep for `delay` before answering `descriptor`.
    pub fn delay(&self, descriptor: &SourceDescriptor, delay: Duration) {
        self.lock().delays.insert(descriptor.clone(), delay);
    }

    /// Number of fetches issued for `descriptor`.
    pub fn calls(&self, descriptor: &SourceDescriptor) -> usize {
        self.lock().calls.get(descriptor).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TrustAnchorSource for NullAnchorSource {
    async fn fetch(&self, descriptor: &SourceDescriptor) -> Result<TrustAnchorSet, FetchError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        let delay = {
            let mut script = self.lock();
            *script.calls.entry(descriptor.clone()).or_default() += 1;
            script.delays.get(descriptor).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.lock()
            .responses
            .get(descriptor)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::Unsupported(descriptor.to_string())))
    }
}
