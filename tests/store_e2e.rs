use std::sync::Arc;
use std::thread;

use chrono::Duration;
use timemap::{
    CollisionPolicy, ManualClock, Record, StoreConfig, StoreError, TimeMapResult, Timestamp,
    VersionedKvStore, VersionedStore,
};

fn sounds(records: &[Arc<Record<String>>]) -> Vec<&str> {
    records.iter().map(|r| r.payload().as_str()).collect()
}

fn seeded_store() -> (VersionedStore<String>, Vec<Timestamp>) {
    let clock = ManualClock::starting_at(1_700_000_000_000_000_000);
    let store = VersionedStore::with_clock(Arc::new(clock));

    let mut dog_stamps = Vec::new();
    for sound in ["woof", "bark", "sigh", "growl", "whimper"] {
        dog_stamps.push(store.set("dog", sound.to_string()));
    }
    for sound in ["hiss", "screech", "crash", "meow"] {
        store.set("cat", sound.to_string());
    }
    (store, dog_stamps)
}

#[test]
fn latest_exact_and_before_reads() -> TimeMapResult<()> {
    let (store, t) = seeded_store();

    assert_eq!(store.get("dog")?.payload(), "whimper");
    assert_eq!(store.get("cat")?.payload(), "meow");

    for (stamp, expected) in t.iter().zip(["woof", "bark", "sigh", "growl", "whimper"]) {
        let record = store.get_at("dog", *stamp)?;
        assert_eq!(record.payload(), expected);
        assert_eq!(record.timestamp(), *stamp);
    }

    assert_eq!(sounds(&store.get_before("dog", t[2])?), vec!["woof", "bark"]);
    assert!(store.get_before("dog", Timestamp::from_nanos(0))?.is_empty());
    assert_eq!(store.get_before("dog", t[4].next())?.len(), 5);
    Ok(())
}

#[test]
fn history_is_sorted_and_complete() -> TimeMapResult<()> {
    let (store, t) = seeded_store();
    let history = store.history("dog")?;
    assert_eq!(history.len(), 5);
    assert!(history.windows(2).all(|w| w[0].timestamp() <= w[1].timestamp()));
    let stamps: Vec<_> = history.iter().map(|r| r.timestamp()).collect();
    assert_eq!(stamps, t);
    assert_eq!(store.keys(), vec!["cat".to_string(), "dog".to_string()]);
    Ok(())
}

#[test]
fn not_found_errors_are_distinct() {
    let (store, t) = seeded_store();

    let err = store.get("bird").unwrap_err();
    assert!(matches!(err, StoreError::KeyNotFound { ref key } if key == "bird"));

    let err = store.get_before("bird", t[0]).unwrap_err();
    assert!(matches!(err, StoreError::KeyNotFound { .. }));

    let between = t[0].next();
    let err = store.get_at("dog", between).unwrap_err();
    assert_eq!(
        err,
        StoreError::TimestampNotFound {
            key: "dog".to_string(),
            timestamp: between,
        }
    );

    let err: timemap::TimeMapError = err.into();
    assert!(err.is_not_found());
}

#[test]
fn failed_reads_leave_state_unchanged() {
    let (store, t) = seeded_store();
    let before = store.history("dog").unwrap();

    let _ = store.get("bird");
    let _ = store.get_at("dog", t[0].next());
    let _ = store.get_before("bird", t[1]);

    assert!(!store.contains_key("bird"));
    assert_eq!(store.key_count(), 2);
    assert_eq!(store.history("dog").unwrap(), before);
}

#[test]
fn repeated_reads_are_identical() {
    let (store, t) = seeded_store();
    assert_eq!(store.get("dog").unwrap(), store.get("dog").unwrap());
    assert_eq!(store.get_at("dog", t[3]).unwrap(), store.get_at("dog", t[3]).unwrap());
    assert_eq!(
        store.get_before("dog", t[3]).unwrap(),
        store.get_before("dog", t[3]).unwrap()
    );
}

#[test]
fn store_is_usable_through_trait_object() {
    let (store, _) = seeded_store();
    let dyn_store: &dyn VersionedKvStore<String> = &store;
    let t = dyn_store.set("owl", "hoot".to_string());
    assert_eq!(dyn_store.get_at("owl", t).unwrap().payload(), "hoot");
    assert_eq!(dyn_store.version_count("dog").unwrap(), 5);
}

#[test]
fn config_loaded_from_json() -> TimeMapResult<()> {
    let config =
        StoreConfig::from_json(r#"{ "collision_policy": "separate", "history_capacity": 4 }"#)?;
    assert_eq!(config.collision_policy, CollisionPolicy::Separate);

    let clock = ManualClock::new().with_step(Duration::zero())?;
    let store = VersionedStore::with_config(Arc::new(clock), config);
    let t1 = store.set("k", 1u64);
    let t2 = store.set("k", 2u64);
    assert!(t1 < t2);
    assert_eq!(*store.get_at("k", t2)?.payload(), 2);
    Ok(())
}

#[test]
fn grouped_collisions_remain_reachable() -> TimeMapResult<()> {
    let clock = ManualClock::new().with_step(Duration::zero())?;
    let store = VersionedStore::with_clock(Arc::new(clock));
    let stamps: Vec<_> = (0..4).map(|i| store.set("k", i)).collect();
    assert!(stamps.windows(2).all(|w| w[0] == w[1]));

    let group = store.get_all_at("k", stamps[0])?;
    let values: Vec<i32> = group.iter().map(|r| *r.payload()).collect();
    assert_eq!(values, vec![0, 1, 2, 3]);
    assert_eq!(*store.get_at("k", stamps[0])?.payload(), 3);
    assert!(store.get_before("k", stamps[0])?.is_empty());
    Ok(())
}

#[test]
fn concurrent_writers_keep_per_key_order() {
    const WRITERS: usize = 8;
    const WRITES: usize = 200;

    let store: Arc<VersionedStore<(usize, usize)>> =
        Arc::new(VersionedStore::with_clock(Arc::new(ManualClock::new())));

    let handles: Vec<_> = (0..WRITERS)
        .map(|w| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let key = if w % 2 == 0 { "even" } else { "odd" };
                for i in 0..WRITES {
                    store.set(key, (w, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for key in ["even", "odd"] {
        let history = store.history(key).unwrap();
        assert_eq!(history.len(), WRITERS / 2 * WRITES);
        assert!(history.windows(2).all(|w| w[0].timestamp() < w[1].timestamp()));

        // each writer's own writes appear in the order it issued them
        for w in (0..WRITERS).filter(|w| (w % 2 == 0) == (key == "even")) {
            let seq: Vec<usize> = history
                .iter()
                .filter(|r| r.payload().0 == w)
                .map(|r| r.payload().1)
                .collect();
            assert_eq!(seq, (0..WRITES).collect::<Vec<_>>());
        }

        for record in &history {
            let exact = store.get_at(key, record.timestamp()).unwrap();
            assert!(Arc::ptr_eq(&exact, record));
        }
    }
}

#[test]
fn readers_never_see_a_key_without_a_value() {
    const KEYS: usize = 20_000;

    let store: Arc<VersionedStore<usize>> =
        Arc::new(VersionedStore::with_clock(Arc::new(ManualClock::new())));
    let far_future = Timestamp::new(chrono::DateTime::<chrono::Utc>::MAX_UTC);

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..KEYS {
                store.set(&format!("k{i}"), i);
            }
        })
    };

    let reader = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..KEYS {
                let key = format!("k{i}");
                while !store.contains_key(&key) {
                    std::hint::spin_loop();
                }
                // Checked as soon as the key appears, racing the writer.
                assert!(store.version_count(&key).unwrap() >= 1);
                assert_eq!(store.get_before(&key, far_future).unwrap().len(), 1);
                assert_eq!(*store.get(&key).unwrap().payload(), i);
                assert!(!store.history(&key).unwrap().is_empty());
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();

    assert_eq!(store.key_count(), KEYS);
    for key in store.keys() {
        assert_eq!(store.version_count(&key).unwrap(), 1);
    }
}
