//! Prometheus metrics for the trust validator.
//!
//! [`ValidatorMetrics`] owns a dedicated [`Registry`] that the `/metrics`
//! endpoint encodes into the Prometheus text exposition format. Cache
//! statistics are copied into gauges at scrape time.

use prometheus::{
    register_int_counter_with_registry, register_int_gauge_vec_with_registry, Encoder,
    IntCounter, IntGaugeVec, Opts, Registry, TextEncoder,
};
use tracing::error;

use trustval_cache::TtlCache;

pub struct ValidatorMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Chain trust queries answered, trusted or not.
    pub queries: IntCounter,
    pub trusted: IntCounter,
    pub not_trusted: IntCounter,
    /// Trust-source failures downgraded to "not trusted".
    pub source_failures: IntCounter,
    /// Successful wipes of the document cache directory.
    pub cache_evictions: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Anchor cache statistics, labelled by cache and statistic.
    pub cache_stats: IntGaugeVec,
    /// Descriptors held by each anchor cache.
    pub cache_entries: IntGaugeVec,
}

impl ValidatorMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let queries = register_int_counter_with_registry!(
            Opts::new("trustval_queries_total", "Total chain trust queries answered"),
            registry
        )
        .expect("failed to register queries counter");

        let trusted = register_int_counter_with_registry!(
            Opts::new("trustval_trusted_total", "Total queries answered as trusted"),
            registry
        )
        .expect("failed to register trusted counter");

        let not_trusted = register_int_counter_with_registry!(
            Opts::new(
                "trustval_not_trusted_total",
                "Total queries answered as not trusted"
            ),
            registry
        )
        .expect("failed to register not_trusted counter");

        let source_failures = register_int_counter_with_registry!(
            Opts::new(
                "trustval_source_failures_total",
                "Total trust-source failures treated as not trusted"
            ),
            registry
        )
        .expect("failed to register source_failures counter");

        let cache_evictions = register_int_counter_with_registry!(
            Opts::new(
                "trustval_cache_evictions_total",
                "Total wipes of the trusted-list document cache"
            ),
            registry
        )
        .expect("failed to register cache_evictions counter");

        let cache_stats = register_int_gauge_vec_with_registry!(
            Opts::new("trustval_anchor_cache", "Anchor cache statistics"),
            &["cache", "stat"],
            registry
        )
        .expect("failed to register cache_stats gauge");

        let cache_entries = register_int_gauge_vec_with_registry!(
            Opts::new(
                "trustval_anchor_cache_entries",
                "Descriptors resolved at least once per anchor cache"
            ),
            &["cache"],
            registry
        )
        .expect("failed to register cache_entries gauge");

        Self {
            registry,
            queries,
            trusted,
            not_trusted,
            source_failures,
            cache_evictions,
            cache_stats,
            cache_entries,
        }
    }

    /// Copy `cache`'s statistics into the gauges.
    pub fn observe_cache(&self, cache: &TtlCache) {
        for (stat, value) in cache.stats().snapshot() {
            self.cache_stats
                .with_label_values(&[cache.name(), stat])
                .set(i64::try_from(value).unwrap_or(i64::MAX));
        }
        self.cache_entries
            .with_label_values(&[cache.name()])
            .set(i64::try_from(cache.len()).unwrap_or(i64::MAX));
    }

    /// Encode the registry in the Prometheus text format. Encoding failures
    /// are logged and yield an empty body.
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
            error!(error = %e, "failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for ValidatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use trustval_cache::CacheSettings;
    use trustval_nullables::{NullAnchorSource, NullClock};

    #[test]
    fn counters_render() {
        let metrics = ValidatorMetrics::new();
        metrics.queries.inc();
        metrics.trusted.inc();
        let text = metrics.render();
        assert!(text.contains("trustval_queries_total 1"));
        assert!(text.contains("trustval_trusted_total 1"));
        assert!(text.contains("trustval_not_trusted_total 0"));
    }

    #[test]
    fn cache_stats_are_labelled() {
        let metrics = ValidatorMetrics::new();
        let cache = TtlCache::new(
            "key_stores",
            Arc::new(NullAnchorSource::new()),
            Arc::new(NullClock::new(0)),
            CacheSettings::default(),
        );
        cache.stats().add("hits", 3);
        metrics.observe_cache(&cache);
        let text = metrics.render();
        assert!(text.contains(r#"trustval_anchor_cache{cache="key_stores",stat="hits"} 3"#), "{text}");
        assert!(text.contains(r#"trustval_anchor_cache_entries{cache="key_stores"} 0"#), "{text}");
    }
}
