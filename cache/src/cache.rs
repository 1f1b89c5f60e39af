use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use dashmap::DashMap;
use tracing::{debug, warn};

use trustval_sources::TrustAnchorSource;
use trustval_types::{Clock, FetchError, SourceDescriptor, Timestamp, TrustAnchorSet};
use trustval_utils::StatsCounter;

use crate::policy::StalePolicy;

pub const STAT_NAMES: &[&str] = &["hits", "misses", "fetches", "fetch_failures", "stale_served"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheSettings {
    pub ttl_secs: u64,
    pub fetch_timeout: Duration,
    pub stale_policy: StalePolicy,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 600,
            fetch_timeout: Duration::from_secs(30),
            stale_policy: StalePolicy::Propagate,
        }
    }
}

struct Entry {
    anchors: TrustAnchorSet,
    created: Timestamp,
}

#[derive(Default)]
struct SlotState {
    entry: Option<Entry>,
    /// Bumped whenever a fetch completes, successful or not.
    generation: u64,
    last_failure: Option<FetchError>,
}

#[derive(Default)]
struct Slot {
    state: Mutex<SlotState>,
    refresh: tokio::sync::Mutex<()>,
}

impl Slot {
    fn state(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct TtlCache {
    name: &'static str,
    source: Arc<dyn TrustAnchorSource>,
    clock: Arc<dyn Clock>,
    settings: CacheSettings,
    slots: DashMap<SourceDescriptor, Arc<Slot>>,
    stats: StatsCounter,
}

impl TtlCache {
    pub fn new(
        name: &'static str,
        source: Arc<dyn TrustAnchorSource>,
        clock: Arc<dyn Clock>,
        settings: CacheSettings,
    ) -> Self {
        Self {
            name,
            source,
            clock,
            settings,
            slots: DashMap::new(),
            stats: StatsCounter::new(STAT_NAMES),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn stats(&self) -> &StatsCounter {
        &self.stats
    }

    /// Number of descriptors that have been resolved at least once.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Current anchors for `descriptor`, fetching them if the cached set is
    /// absent or older than the TTL.
    pub async fn resolve(&self, descriptor: &SourceDescriptor) -> Result<TrustAnchorSet, FetchError> {
        let slot = self.slot(descriptor);

        let seen = {
            let state = slot.state();
            if let Some(anchors) = self.fresh(&state) {
                self.stats.increment("hits");
                return Ok(anchors);
            }
            state.generation
        };

        let _refresh = slot.refresh.lock().await;

        {
            let state = slot.state();
            if state.generation != seen {
                debug!(cache = self.name, source = %descriptor, "joined concurrent refresh");
                return self.settled(&state);
            }
            if let Some(anchors) = self.fresh(&state) {
                self.stats.increment("hits");
                return Ok(anchors);
            }
        }

        self.stats.increment("misses");
        let result = self.fetch(descriptor).await;

        let mut state = slot.state();
        state.generation += 1;
        match result {
            Ok(anchors) => {
                debug!(cache = self.name, source = %descriptor, anchors = anchors.len(), "anchors refreshed");
                state.entry = Some(Entry {
                    anchors: anchors.clone(),
                    created: self.clock.now(),
                });
                state.last_failure = None;
                Ok(anchors)
            }
            Err(e) => {
                self.stats.increment("fetch_failures");
                warn!(cache = self.name, source = %descriptor, error = %e, "anchor refresh failed");
                state.last_failure = Some(e);
                self.settled(&state)
            }
        }
    }

    async fn fetch(&self, descriptor: &SourceDescriptor) -> Result<TrustAnchorSet, FetchError> {
        self.stats.increment("fetches");
        let timeout = self.settings.fetch_timeout;
        match tokio::time::timeout(timeout, self.source.fetch(descriptor)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                descriptor: descriptor.to_string(),
                secs: timeout.as_secs(),
            }),
        }
    }

    fn slot(&self, descriptor: &SourceDescriptor) -> Arc<Slot> {
        if let Some(slot) = self.slots.get(descriptor) {
            return Arc::clone(&slot);
        }
        Arc::clone(&self.slots.entry(descriptor.clone()).or_default())
    }

    fn fresh(&self, state: &SlotState) -> Option<TrustAnchorSet> {
        state
            .entry
            .as_ref()
            .filter(|e| !e.created.is_older_than(self.settings.ttl_secs, self.clock.now()))
            .map(|e| e.anchors.clone())
    }

    /// Outcome of the most recent completed fetch, under the stale policy.
    fn settled(&self, state: &SlotState) -> Result<TrustAnchorSet, FetchError> {
        match (&state.last_failure, &state.entry) {
            (None, Some(entry)) => Ok(entry.anchors.clone()),
            (Some(_), Some(entry)) if self.settings.stale_policy == StalePolicy::ServeStale => {
                self.stats.increment("stale_served");
                Ok(entry.anchors.clone())
            }
            (Some(e), _) => Err(e.clone()),
            (None, None) => Err(FetchError::Unsupported(format!(
                "cache '{}' has no outcome to share",
                self.name
            ))),
        }
    }
}

impl std::fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("descriptors", &self.slots.len())
            .finish()
    }
}
