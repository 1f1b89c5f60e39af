use std::sync::Arc;
use std::time::Duration;

use trustval_cache::{CacheSettings, StalePolicy, TtlCache};
use trustval_nullables::{pki, NullAnchorSource, NullClock, TestCert};
use trustval_types::{
    AliasPattern, FetchError, KeyStoreFormat, KeyStoreHandle, KeyStoreSelector, SourceDescriptor,
};

const CALLERS: usize = 16;

fn descriptor(path: &str) -> SourceDescriptor {
    SourceDescriptor::KeyStore(KeyStoreSelector {
        keystore: KeyStoreHandle {
            path: path.into(),
            format: KeyStoreFormat::Pem,
            password: None,
        },
        alias_pattern: AliasPattern::default(),
    })
}

fn cache(source: Arc<NullAnchorSource>, clock: Arc<NullClock>) -> Arc<TtlCache> {
    Arc::new(TtlCache::new(
        "anchors",
        source,
        clock,
        CacheSettings {
            ttl_secs: 600,
            fetch_timeout: Duration::from_secs(10),
            stale_policy: StalePolicy::Propagate,
        },
    ))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_fetch() {
    let source = Arc::new(NullAnchorSource::new());
    let d = descriptor("/ks/pid.pem");
    let anchors = pki::anchors(&[&TestCert::root("PID Root")]);
    source.respond(&d, anchors.clone());
    source.delay(&d, Duration::from_millis(200));
    let cache = cache(source.clone(), Arc::new(NullClock::new(10_000)));

    let mut handles = Vec::new();
    for _ in 0..CALLERS {
        let cache = cache.clone();
        let d = d.clone();
        handles.push(tokio::spawn(async move { cache.resolve(&d).await }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), anchors);
    }
    assert_eq!(source.calls(&d), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_failure() {
    let source = Arc::new(NullAnchorSource::new());
    let d = descriptor("/ks/broken.pem");
    source.fail(&d, FetchError::Parse("truncated document".into()));
    source.delay(&d, Duration::from_millis(200));
    let cache = cache(source.clone(), Arc::new(NullClock::new(10_000)));

    let mut handles = Vec::new();
    for _ in 0..CALLERS {
        let cache = cache.clone();
        let d = d.clone();
        handles.push(tokio::spawn(async move { cache.resolve(&d).await }));
    }
    for handle in handles {
        assert_eq!(
            handle.await.unwrap().unwrap_err(),
            FetchError::Parse("truncated document".into())
        );
    }
    assert_eq!(source.calls(&d), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn slow_descriptor_does_not_block_another() {
    let source = Arc::new(NullAnchorSource::new());
    let slow = descriptor("/ks/slow.pem");
    let quick = descriptor("/ks/quick.pem");
    source.respond(&slow, pki::anchors(&[&TestCert::root("Slow")]));
    source.respond(&quick, pki::anchors(&[&TestCert::root("Quick")]));
    source.delay(&slow, Duration::from_secs(5));
    let cache = cache(source.clone(), Arc::new(NullClock::new(10_000)));

    let slow_task = {
        let cache = cache.clone();
        let slow = slow.clone();
        tokio::spawn(async move { cache.resolve(&slow).await })
    };
    // Let the slow fetch get in flight and take its refresh lock.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let quick_result = tokio::time::timeout(Duration::from_secs(1), cache.resolve(&quick)).await;
    assert!(quick_result.expect("quick descriptor was blocked").is_ok());
    assert!(!slow_task.is_finished());
    slow_task.abort();
}

#[tokio::test]
async fn entry_expires_strictly_after_ttl() {
    let source = Arc::new(NullAnchorSource::new());
    let clock = Arc::new(NullClock::new(10_000));
    let d = descriptor("/ks/pid.pem");
    source.respond(&d, pki::anchors(&[&TestCert::root("PID Root")]));
    let cache = cache(source.clone(), clock.clone());

    cache.resolve(&d).await.unwrap();
    assert_eq!(source.calls(&d), 1);

    clock.set(10_000 + 599);
    cache.resolve(&d).await.unwrap();
    assert_eq!(source.calls(&d), 1, "refetched before the TTL elapsed");

    clock.set(10_000 + 600);
    cache.resolve(&d).await.unwrap();
    assert_eq!(source.calls(&d), 1, "an entry exactly TTL old is still live");

    clock.set(10_000 + 601);
    cache.resolve(&d).await.unwrap();
    assert_eq!(source.calls(&d), 2);
}

#[tokio::test]
async fn refreshed_entry_restarts_its_ttl() {
    let source = Arc::new(NullAnchorSource::new());
    let clock = Arc::new(NullClock::new(0));
    let d = descriptor("/ks/pid.pem");
    let first = pki::anchors(&[&TestCert::root("First")]);
    let second = pki::anchors(&[&TestCert::root("Second")]);
    source.respond(&d, first.clone());
    let cache = cache(source.clone(), clock.clone());

    assert_eq!(cache.resolve(&d).await.unwrap(), first);
    clock.advance(601);
    source.respond(&d, second.clone());
    assert_eq!(cache.resolve(&d).await.unwrap(), second);
    clock.advance(599);
    assert_eq!(cache.resolve(&d).await.unwrap(), second);
    assert_eq!(source.calls(&d), 2);
}
