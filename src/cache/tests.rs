use super::*;
use serde::Deserialize;
use std::time::Duration;

fn memory_cache(prefix: &str) -> (Arc<MemoryBackend>, PrefixedCache) {
    let backend = Arc::new(MemoryBackend::new());
    let cache = PrefixedCache::new(backend.clone(), prefix);
    (backend, cache)
}

fn failing_backend() -> MockCacheBackend {
    let mut mock = MockCacheBackend::new();
    mock.expect_get()
        .returning(|_| Err(CacheError::Unavailable("connection refused".to_string())));
    mock.expect_set()
        .returning(|_, _, _| Err(CacheError::Unavailable("connection refused".to_string())));
    mock.expect_exists()
        .returning(|_| Err(CacheError::Unavailable("connection refused".to_string())));
    mock.expect_ttl()
        .returning(|_| Err(CacheError::Unavailable("connection refused".to_string())));
    mock.expect_delete()
        .returning(|_| Err(CacheError::Unavailable("connection refused".to_string())));
    mock
}

#[tokio::test]
async fn test_set_then_get_round_trip() {
    let (_, cache) = memory_cache(MX_CACHE_PREFIX);

    assert!(cache.set("example.com", "payload", 60).await);
    assert_eq!(cache.get("example.com").await.as_deref(), Some("payload"));
}

#[tokio::test]
async fn test_exists_until_deleted() {
    let (_, cache) = memory_cache(MX_CACHE_PREFIX);

    assert!(!cache.exists("example.com").await);
    cache.set("example.com", "payload", 60).await;
    assert!(cache.exists("example.com").await);

    assert!(cache.delete("example.com").await);
    assert!(!cache.exists("example.com").await);
    assert_eq!(cache.get("example.com").await, None);
}

#[tokio::test]
async fn test_keys_are_namespaced_by_prefix() {
    let backend = Arc::new(MemoryBackend::new());
    let tld = PrefixedCache::new(backend.clone(), TLD_CACHE_PREFIX);
    let mx = PrefixedCache::new(backend.clone(), MX_CACHE_PREFIX);

    tld.set("shared", "tld-value", 60).await;
    mx.set("shared", "mx-value", 60).await;

    assert_eq!(tld.get("shared").await.as_deref(), Some("tld-value"));
    assert_eq!(mx.get("shared").await.as_deref(), Some("mx-value"));
    assert_eq!(
        backend.get("tld_cache:shared").await.unwrap().as_deref(),
        Some("tld-value")
    );
    assert_eq!(
        backend.get("mx_cache:shared").await.unwrap().as_deref(),
        Some("mx-value")
    );
}

#[tokio::test]
async fn test_ttl_reports_remaining_seconds() {
    let (_, cache) = memory_cache(TLD_CACHE_PREFIX);

    cache.set("expiring", "v", 100).await;
    cache.set("forever", "v", 0).await;

    match cache.get_ttl("expiring").await {
        KeyTtl::Expires(seconds) => assert!(seconds > 95 && seconds <= 100),
        other => panic!("expected expiring key, got {:?}", other),
    }
    assert_eq!(cache.get_ttl("forever").await, KeyTtl::Persistent);
    assert_eq!(cache.get_ttl("missing").await, KeyTtl::Missing);
    assert_eq!(cache.get_ttl("missing").await.as_seconds(), -2);
    assert_eq!(cache.get_ttl("forever").await.as_seconds(), -1);
}

#[tokio::test]
async fn test_backend_faults_fail_open() {
    let cache = PrefixedCache::new(Arc::new(failing_backend()), MX_CACHE_PREFIX);

    assert!(!cache.set("k", "v", 10).await);
    assert_eq!(cache.get("k").await, None);
    assert!(!cache.exists("k").await);
    assert_eq!(cache.get_ttl("k").await, KeyTtl::Missing);
    assert!(!cache.delete("k").await);
}

#[tokio::test]
async fn test_adapter_passes_prefixed_key_to_backend() {
    let mut mock = MockCacheBackend::new();
    mock.expect_set()
        .withf(|key, value, ttl| key == "mx_cache:gmail.com" && value == "v" && *ttl == 7200)
        .times(1)
        .returning(|_, _, _| Ok(()));

    let cache = PrefixedCache::new(Arc::new(mock), MX_CACHE_PREFIX);
    assert!(cache.set("gmail.com", "v", 7200).await);
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Sample {
    name: String,
    count: usize,
}

#[tokio::test]
async fn test_json_helpers() {
    let (_, cache) = memory_cache(TLD_CACHE_PREFIX);
    let sample = Sample {
        name: "tlds".to_string(),
        count: 3,
    };

    assert!(cache.set_json("sample", &sample, 60).await);
    assert_eq!(cache.get_json::<Sample>("sample").await, Some(sample));
}

#[tokio::test]
async fn test_undecodable_json_is_a_miss() {
    let (_, cache) = memory_cache(TLD_CACHE_PREFIX);
    cache.set("sample", "{not json", 60).await;
    assert_eq!(cache.get_json::<Sample>("sample").await, None);
}

#[test]
fn test_key_ttl_from_raw() {
    assert_eq!(KeyTtl::from_raw(42), KeyTtl::Expires(42));
    assert_eq!(KeyTtl::from_raw(0), KeyTtl::Expires(0));
    assert_eq!(KeyTtl::from_raw(-1), KeyTtl::Persistent);
    assert_eq!(KeyTtl::from_raw(-2), KeyTtl::Missing);
}

#[test]
fn test_memory_backend_len_tracks_live_entries() {
    tokio_test::block_on(async {
        let backend = MemoryBackend::new();
        assert!(backend.is_empty().await);
        backend.set("a", "1", 60).await.unwrap();
        backend.set("b", "2", 0).await.unwrap();
        assert_eq!(backend.len().await, 2);
        assert!(backend.delete("a").await.unwrap());
        assert!(!backend.delete("a").await.unwrap());
        assert_eq!(backend.len().await, 1);
    });
}

#[tokio::test]
async fn test_memory_backend_purges_expired_entries_on_set() {
    let backend = MemoryBackend::new();
    for i in 0..1000 {
        backend.set(&format!("mx_cache:domain{}.com", i), "v", 1).await.unwrap();
    }
    backend.set("tld_cache:tld_list", "[]", 0).await.unwrap();
    assert_eq!(backend.stored().await, 1001);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    backend.set("mx_cache:fresh.com", "v", 60).await.unwrap();

    assert_eq!(backend.len().await, 2);
    assert_eq!(backend.stored().await, 2);
}
