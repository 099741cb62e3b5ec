//! Dynamic id allocation: uniqueness, reset and concurrent use.

use hashbrown::{HashMap, HashSet};
use proptest::prelude::*;
use std::sync::{Arc, Barrier};
use std::thread;
use strata_resources::ids::{DEFAULT_DYNAMIC_ID_SEED, DynamicIds};
use strata_resources::model::{ResourceType, TypedName};

fn resource_type() -> impl Strategy<Value = ResourceType> {
    prop::sample::select(ResourceType::ALL.to_vec())
}

proptest! {
    #[test]
    fn distinct_names_get_distinct_resolvable_ids(
        names in prop::collection::hash_set((resource_type(), "[a-z_]{1,12}"), 1..64),
    ) {
        let ids = DynamicIds::new();
        let mut seen = HashSet::new();
        for (ty, name) in &names {
            let id = ids.get_or_allocate(*ty, name);
            prop_assert!(id > DEFAULT_DYNAMIC_ID_SEED);
            prop_assert!(seen.insert(id));
            prop_assert_eq!(ids.resolve(id), Some(TypedName::new(*ty, name.as_str())));
        }
        prop_assert_eq!(ids.len(), names.len());
    }

    #[test]
    fn repeated_requests_are_stable(name in "[a-z]{1,8}", repeats in 1..10usize) {
        let ids = DynamicIds::new();
        let first = ids.get_or_allocate(ResourceType::Drawable, &name);
        for _ in 0..repeats {
            prop_assert_eq!(ids.get_or_allocate(ResourceType::Drawable, &name), first);
        }
        prop_assert_eq!(ids.len(), 1);
    }
}

#[test]
fn reset_makes_old_ids_unresolvable() {
    let ids = DynamicIds::new();
    let allocated: Vec<i32> = (0..5)
        .map(|i| ids.get_or_allocate(ResourceType::Layout, &format!("layout{i}")))
        .collect();

    ids.reset();

    for id in &allocated {
        assert!(ids.resolve(*id).is_none());
    }
    assert_eq!(
        ids.get_or_allocate(ResourceType::Menu, "main"),
        DEFAULT_DYNAMIC_ID_SEED + 1
    );
}

#[test]
fn concurrent_allocation_never_shares_an_id() {
    const THREADS: usize = 8;
    const NAMES: usize = 200;

    let ids = Arc::new(DynamicIds::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let ids = Arc::clone(&ids);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                // Every thread asks for the same names, in a different order.
                (0..NAMES)
                    .map(|i| {
                        let n = (i * 7 + t * 13) % NAMES;
                        let name = format!("name{n}");
                        (name.clone(), ids.get_or_allocate(ResourceType::Id, &name))
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut by_name: HashMap<String, i32> = HashMap::new();
    for handle in handles {
        for (name, id) in handle.join().unwrap() {
            let previous = by_name.entry(name).or_insert(id);
            assert_eq!(*previous, id, "two ids for one name");
        }
    }

    let unique: HashSet<i32> = by_name.values().copied().collect();
    assert_eq!(unique.len(), NAMES);
    assert_eq!(ids.len(), NAMES);
    let max = unique.iter().copied().max().unwrap();
    assert_eq!(max, DEFAULT_DYNAMIC_ID_SEED + NAMES as i32);
}

#[test]
fn reads_race_with_reset() {
    let ids = Arc::new(DynamicIds::new());
    let barrier = Arc::new(Barrier::new(3));

    let allocators: Vec<_> = (0..2)
        .map(|t| {
            let ids = Arc::clone(&ids);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..500 {
                    let name = format!("t{t}_{i}");
                    let id = ids.get_or_allocate(ResourceType::String, &name);
                    // A reset may land in between; a surviving mapping must be exact.
                    if let Some(found) = ids.resolve(id) {
                        assert_eq!(found.ty, ResourceType::String);
                    }
                }
            })
        })
        .collect();

    barrier.wait();
    for _ in 0..50 {
        ids.reset();
    }
    for handle in allocators {
        handle.join().unwrap();
    }

    ids.reset();
    assert!(ids.is_empty());
}
