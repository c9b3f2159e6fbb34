mod common;

use common::{day, manual_clock, SYMBOL};
use indicator_core::cache::{CacheKey, CacheLookup, FreshnessCache, SubjectType, TtlPolicy};
use indicator_core::domain_types::IndicatorSnapshot;
use rstest::rstest;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn snapshot(value: f64) -> IndicatorSnapshot {
    let mut snapshot = IndicatorSnapshot::new(SYMBOL);
    snapshot.date = Some(day(0));
    for label in ["MA5", "MA10", "RSI6", "K", "D", "J"] {
        snapshot.values.insert(label.to_string(), value);
    }
    snapshot
}

#[test]
fn put_then_get_until_ttl_elapses() {
    let clock = manual_clock();
    let cache = FreshnessCache::with_clock(TtlPolicy::default(), clock.clone());
    let key = CacheKey::new(SubjectType::DailyKline, SYMBOL, "snapshot");

    let stored = cache.put(key.clone(), snapshot(1.0), Duration::from_secs(300));
    let fetched = cache.get(&key).unwrap();
    assert!(Arc::ptr_eq(&stored, &fetched));

    clock.advance(Duration::from_secs(299));
    assert!(cache.get(&key).is_some());

    clock.advance(Duration::from_secs(1));
    assert!(cache.get(&key).is_none());
    assert!(cache.is_empty());
}

#[rstest]
#[case(SubjectType::Realtime, 60)]
#[case(SubjectType::DailyKline, 3_600)]
#[case(SubjectType::Financial, 7 * 86_400)]
#[case(SubjectType::Board, 86_400)]
fn policy_ttl_per_subject(#[case] subject: SubjectType, #[case] ttl_secs: u64) {
    let clock = manual_clock();
    let cache = FreshnessCache::with_clock(TtlPolicy::default(), clock.clone());
    let key = CacheKey::new(subject, SYMBOL, "snapshot");

    cache.put_with_policy(key.clone(), snapshot(1.0));
    clock.advance(Duration::from_secs(ttl_secs - 1));
    assert!(cache.get(&key).is_some());

    clock.advance(Duration::from_secs(1));
    assert!(matches!(cache.lookup(&key), CacheLookup::Expired));
}

#[test]
fn ranges_are_part_of_the_key() {
    let cache: FreshnessCache<IndicatorSnapshot> = FreshnessCache::new(TtlPolicy::default());
    let base = CacheKey::new(SubjectType::DailyKline, SYMBOL, "ma:5");
    let january = base.clone().with_range(day(0), day(30));
    let february = base.clone().with_range(day(31), day(59));

    cache.put_with_policy(january.clone(), snapshot(1.0));

    assert!(cache.get(&january).is_some());
    assert!(cache.get(&february).is_none());
    assert!(cache.get(&base).is_none());
}

#[test]
fn concurrent_writers_never_produce_torn_entries() {
    let cache = Arc::new(FreshnessCache::with_clock(
        TtlPolicy::default(),
        manual_clock(),
    ));
    let key = CacheKey::new(SubjectType::Realtime, SYMBOL, "snapshot");
    cache.put_with_policy(key.clone(), snapshot(0.0));

    thread::scope(|scope| {
        for writer in 1..=4 {
            let cache = Arc::clone(&cache);
            let key = key.clone();
            scope.spawn(move || {
                for round in 0..200 {
                    cache.put_with_policy(key.clone(), snapshot((writer * 1_000 + round) as f64));
                }
            });
        }

        for _ in 0..4 {
            let cache = Arc::clone(&cache);
            let key = key.clone();
            scope.spawn(move || {
                for _ in 0..500 {
                    let value = cache.get(&key).expect("entry stays fresh");
                    let first = value.get("MA5").unwrap();
                    assert!(value.values.values().all(|v| *v == first));
                }
            });
        }
    });

    assert_eq!(cache.len(), 1);
}

#[test]
fn independent_symbols_are_written_concurrently() {
    let cache = Arc::new(FreshnessCache::<IndicatorSnapshot>::new(TtlPolicy::default()));

    thread::scope(|scope| {
        for worker in 0..8 {
            let cache = Arc::clone(&cache);
            scope.spawn(move || {
                for i in 0..50 {
                    let key = CacheKey::new(
                        SubjectType::Valuation,
                        format!("{:06}", worker * 100 + i),
                        "pe",
                    );
                    cache.put_with_policy(key, snapshot(i as f64));
                }
            });
        }
    });

    let stats = cache.stats();
    assert_eq!(stats.total, 400);
    assert_eq!(stats.fresh, 400);
    assert_eq!(cache.invalidate_symbol("000000"), 1);
}
