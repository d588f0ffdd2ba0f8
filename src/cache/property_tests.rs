//! Property-Based Tests for the Cache Module
//!
//! Checks the store against a simple reference model of LRU + TTL behaviour.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheStore, Clock, ManualClock};

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 8;
const TEST_TTL_MS: u64 = 60_000;

// == Strategies ==
/// Small key space so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "url=[a-l]"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{1,16}"
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
    Advance { millis: u64 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        4 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        4 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Delete { key }),
        1 => (0u64..40_000).prop_map(|millis| CacheOp::Advance { millis }),
    ]
}

// == Reference Model ==
/// Straightforward model: value, insertion time and last access tick per key.
#[derive(Default)]
struct Model {
    entries: HashMap<String, (String, u64, u64)>,
    tick: u64,
}

impl Model {
    fn live(&self, key: &str, now: u64) -> bool {
        self.entries
            .get(key)
            .map(|(_, inserted, _)| now < inserted + TEST_TTL_MS)
            .unwrap_or(false)
    }

    fn set(&mut self, key: String, value: String, now: u64) {
        self.tick += 1;
        if !self.entries.contains_key(&key) && self.entries.len() >= TEST_MAX_ENTRIES {
            self.entries
                .retain(|_, (_, inserted, _)| now < *inserted + TEST_TTL_MS);
            if self.entries.len() >= TEST_MAX_ENTRIES {
                let oldest = self
                    .entries
                    .iter()
                    .min_by_key(|(_, (_, _, tick))| *tick)
                    .map(|(key, _)| key.clone());
                if let Some(oldest) = oldest {
                    self.entries.remove(&oldest);
                }
            }
        }
        self.entries.insert(key, (value, now, self.tick));
    }

    fn get(&mut self, key: &str, now: u64) -> Option<String> {
        if !self.live(key, now) {
            self.entries.remove(key);
            return None;
        }
        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(key).map(|entry| {
            entry.2 = tick;
            entry.0.clone()
        })
    }
}

fn store_with_clock() -> (CacheStore<String>, ManualClock) {
    let clock = ManualClock::new(0);
    let store = CacheStore::with_clock(
        TEST_MAX_ENTRIES,
        Duration::from_millis(TEST_TTL_MS),
        Arc::new(clock.clone()),
    );
    (store, clock)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Every get returns exactly what the reference model predicts.
    #[test]
    fn prop_store_matches_reference_model(
        ops in prop::collection::vec(cache_op_strategy(), 1..120)
    ) {
        let (mut store, clock) = store_with_clock();
        let mut model = Model::default();

        for op in ops {
            let now = clock.now_ms();
            match op {
                CacheOp::Set { key, value } => {
                    store.set(key.clone(), value.clone());
                    model.set(key, value, now);
                }
                CacheOp::Get { key } => {
                    prop_assert_eq!(store.get(&key), model.get(&key, now), "get({})", key);
                }
                CacheOp::Delete { key } => {
                    store.delete(&key);
                    model.entries.remove(&key);
                }
                CacheOp::Advance { millis } => {
                    clock.advance(Duration::from_millis(millis));
                }
            }
        }
    }

    // The store never holds more than its capacity.
    #[test]
    fn prop_capacity_enforcement(
        ops in prop::collection::vec(cache_op_strategy(), 1..200)
    ) {
        let (mut store, clock) = store_with_clock();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => store.set(key, value),
                CacheOp::Get { key } => {
                    store.get(&key);
                }
                CacheOp::Delete { key } => {
                    store.delete(&key);
                }
                CacheOp::Advance { millis } => clock.advance(Duration::from_millis(millis)),
            }
            prop_assert!(store.len() <= TEST_MAX_ENTRIES);
        }
    }

    // A stored value reads back unchanged until its TTL elapses, then never.
    #[test]
    fn prop_roundtrip_until_expiry(
        key in key_strategy(),
        value in value_strategy(),
        before in 0u64..TEST_TTL_MS,
        after in TEST_TTL_MS..TEST_TTL_MS * 3,
    ) {
        let (mut store, clock) = store_with_clock();

        store.set(key.clone(), value.clone());

        clock.set(before);
        prop_assert_eq!(store.get(&key), Some(value));

        clock.set(after);
        prop_assert_eq!(store.get(&key), None);
    }

    // Delete always leaves the key absent.
    #[test]
    fn prop_delete_removes_entry(key in key_strategy(), value in value_strategy()) {
        let (mut store, _) = store_with_clock();

        store.set(key.clone(), value);
        store.delete(&key);

        prop_assert_eq!(store.get(&key), None);
        prop_assert!(!store.delete(&key));
    }
}
