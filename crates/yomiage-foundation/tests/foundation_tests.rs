//! Foundation crate tests
//!
//! Tests cover:
//! - Clock abstraction (TokioClock, TestClock, SharedClock)
//! - SingleFlightCache state machine and bounded-wait followers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use yomiage_foundation::clock::{test_clock, tokio_clock, Clock, TestClock};
use yomiage_foundation::singleflight::{
    SingleFlightCache, SingleFlightConfig, SingleFlightError,
};

#[derive(Debug, PartialEq)]
struct Boom;

impl std::fmt::Display for Boom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("boom")
    }
}

fn cache_with(clock: Arc<TestClock>, max_polls: u32) -> SingleFlightCache<&'static str, u32> {
    SingleFlightCache::with_config(
        clock,
        SingleFlightConfig {
            poll_interval: Duration::from_millis(10),
            max_polls,
        },
    )
}

// ─── Clock Tests ────────────────────────────────────────────────────

#[test]
fn tokio_clock_now_returns_current_time() {
    let clock = tokio_clock();
    let t = clock.now();
    assert!(t.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_clock_advance_accumulates() {
    let clock = TestClock::new();
    let start = clock.now();
    clock.advance(Duration::from_millis(100));
    clock.advance(Duration::from_millis(200));
    assert_eq!(clock.now().duration_since(start), Duration::from_millis(300));
}

#[test]
fn test_clock_set_time() {
    let clock = TestClock::new();
    let target = Instant::now() + Duration::from_secs(1000);
    clock.set_time(target);
    assert_eq!(clock.now(), target);
}

#[tokio::test]
async fn test_clock_sleep_advances_virtual_time() {
    let clock = test_clock();
    let t0 = clock.now();
    clock.sleep(Duration::from_secs(10)).await;
    assert_eq!(clock.now().duration_since(t0), Duration::from_secs(10));
}

// ─── SingleFlightCache Tests ────────────────────────────────────────

#[tokio::test]
async fn ready_value_is_returned_without_suspension() {
    let cache = cache_with(Arc::new(TestClock::new()), 10);
    let first = cache
        .load_or_create("guild", || async { Ok::<u32, Boom>(42) })
        .await
        .unwrap();
    assert_eq!(first, 42);

    // a second run of the factory would surface as this error
    let second = cache
        .load_or_create("guild", || async { Err::<u32, Boom>(Boom) })
        .await
        .unwrap();
    assert_eq!(second, 42);
}

#[tokio::test]
async fn concurrent_callers_share_one_factory_run() {
    let cache = cache_with(Arc::new(TestClock::new()), 10);
    let calls = AtomicUsize::new(0);

    let (a, b, c) = tokio::join!(
        cache.load_or_create("guild", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok::<u32, Boom>(42)
        }),
        cache.load_or_create("guild", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<u32, Boom>(42)
        }),
        cache.load_or_create("guild", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<u32, Boom>(42)
        }),
    );

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(a.unwrap(), 42);
    assert_eq!(b.unwrap(), 42);
    assert_eq!(c.unwrap(), 42);
}

#[tokio::test]
async fn factory_failure_reaches_only_the_initializer() {
    let cache = cache_with(Arc::new(TestClock::new()), 10);
    let err = cache
        .load_or_create("guild", || async { Err::<u32, Boom>(Boom) })
        .await
        .unwrap_err();
    assert!(matches!(err, SingleFlightError::Init(Boom)));
}

#[tokio::test]
async fn failed_initialization_leaves_the_key_retryable() {
    let cache = cache_with(Arc::new(TestClock::new()), 10);
    let _ = cache
        .load_or_create("guild", || async { Err::<u32, Boom>(Boom) })
        .await;
    assert!(cache.is_empty());

    let value = cache
        .load_or_create("guild", || async { Ok::<u32, Boom>(7) })
        .await
        .unwrap();
    assert_eq!(value, 7);
}

#[tokio::test]
async fn follower_of_a_failing_initializer_aborts() {
    let cache = cache_with(Arc::new(TestClock::new()), 10);

    let (initializer, follower) = tokio::join!(
        cache.load_or_create("guild", || async {
            tokio::task::yield_now().await;
            Err::<u32, Boom>(Boom)
        }),
        cache.load_or_create("guild", || async { Ok::<u32, Boom>(1) }),
    );

    assert!(matches!(initializer, Err(SingleFlightError::Init(Boom))));
    // the follower aborts instead of becoming the new initializer
    assert!(matches!(follower, Err(SingleFlightError::Aborted)));
}

#[tokio::test]
async fn follower_times_out_when_initialization_never_resolves() {
    let clock = Arc::new(TestClock::new());
    let cache = Arc::new(cache_with(clock.clone(), 3));
    let started = clock.now();

    let stuck = cache.clone();
    let initializer = tokio::spawn(async move {
        let _ = stuck
            .load_or_create("guild", || async {
                futures::future::pending::<Result<u32, Boom>>().await
            })
            .await;
    });
    // let the initializer claim the key
    tokio::task::yield_now().await;

    let err = cache
        .load_or_create("guild", || async { Ok::<u32, Boom>(1) })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SingleFlightError::InitializationTimeout { polls: 3, .. }
    ));
    // bounded wait: exactly max_polls fixed intervals of virtual time
    assert_eq!(
        clock.now().duration_since(started),
        Duration::from_millis(30)
    );

    initializer.abort();
}

#[tokio::test]
async fn cancelled_initializer_leaves_the_key_retryable() {
    let cache = Arc::new(cache_with(Arc::new(TestClock::new()), 3));

    let stuck = cache.clone();
    let initializer = tokio::spawn(async move {
        let _ = stuck
            .load_or_create("guild", || async {
                futures::future::pending::<Result<u32, Boom>>().await
            })
            .await;
    });
    // let the initializer claim the key, then cancel it mid-initialization
    tokio::task::yield_now().await;
    initializer.abort();
    let _ = initializer.await;

    // the claim must have been withdrawn; a new caller initializes afresh
    let value = cache
        .load_or_create("guild", || async { Ok::<u32, Boom>(5) })
        .await
        .unwrap();
    assert_eq!(value, 5);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn invalidate_allows_a_fresh_initialization() {
    let cache = cache_with(Arc::new(TestClock::new()), 10);
    let first = cache
        .load_or_create("guild", || async { Ok::<u32, Boom>(1) })
        .await
        .unwrap();
    assert_eq!(first, 1);

    assert!(cache.invalidate(&"guild"));
    let second = cache
        .load_or_create("guild", || async { Ok::<u32, Boom>(2) })
        .await
        .unwrap();
    assert_eq!(second, 2);
}

#[tokio::test]
async fn invalidate_on_an_absent_key_is_a_noop() {
    let cache = cache_with(Arc::new(TestClock::new()), 10);
    assert!(!cache.invalidate(&"guild"));
}

#[tokio::test]
async fn distinct_keys_are_independent() {
    let cache = cache_with(Arc::new(TestClock::new()), 10);
    let a = cache
        .load_or_create("guild-a", || async { Ok::<u32, Boom>(1) })
        .await
        .unwrap();
    let b = cache
        .load_or_create("guild-b", || async { Ok::<u32, Boom>(2) })
        .await
        .unwrap();
    assert_eq!((a, b), (1, 2));
    assert_eq!(cache.len(), 2);
}
