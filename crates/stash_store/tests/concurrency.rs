//! Concurrent access tests for `stash_store`.
//!
//! These tests hammer one store from several threads and check that no
//! operation is lost, duplicated or observed half-applied.

use core::sync::atomic::{AtomicBool, Ordering};
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use stash_store::ResourceStore;

const THREADS: usize = 8;
const PER_THREAD: usize = 250;

/// Concurrent pushes to one queue lose and duplicate nothing.
#[test]
fn concurrent_pushes_are_all_popped() {
    let store: ResourceStore<usize> = ResourceStore::new();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = store.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..PER_THREAD {
                    store.push("conn1", "events", t * PER_THREAD + i).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Pusher thread panicked");
    }

    let mut seen = HashSet::new();
    while let Some(value) = store.pop("conn1", "events").unwrap() {
        assert!(seen.insert(value), "value {value} popped twice");
    }
    assert_eq!(seen.len(), THREADS * PER_THREAD);
    assert_eq!(seen, (0..THREADS * PER_THREAD).collect::<HashSet<_>>());
}

/// Each thread's own pushes come out in the order it pushed them.
#[test]
fn per_thread_order_is_preserved() {
    let store: ResourceStore<(usize, usize)> = ResourceStore::new();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    store.push("conn1", "events", (t, i)).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Pusher thread panicked");
    }

    let mut next = vec![0; THREADS];
    while let Some((t, i)) = store.pop("conn1", "events").unwrap() {
        assert_eq!(i, next[t], "thread {t} items out of order");
        next[t] += 1;
    }
    assert!(next.iter().all(|&n| n == PER_THREAD));
}

/// Concurrent producers and consumers hand over every value exactly once.
#[test]
fn concurrent_push_and_pop() {
    let store: ResourceStore<usize> = ResourceStore::new();
    let barrier = Arc::new(Barrier::new(THREADS * 2));

    let producers: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = store.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..PER_THREAD {
                    store.push("conn1", "events", t * PER_THREAD + i).unwrap();
                }
            })
        })
        .collect();

    let consumers: Vec<_> = (0..THREADS)
        .map(|_| {
            let store = store.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut taken = Vec::new();
                for _ in 0..PER_THREAD {
                    if let Some(value) = store.pop("conn1", "events").unwrap() {
                        taken.push(value);
                    }
                }
                taken
            })
        })
        .collect();

    for handle in producers {
        handle.join().expect("Producer thread panicked");
    }

    let mut seen = HashSet::new();
    for handle in consumers {
        for value in handle.join().expect("Consumer thread panicked") {
            assert!(seen.insert(value), "value {value} popped twice");
        }
    }
    while let Some(value) = store.pop("conn1", "events").unwrap() {
        assert!(seen.insert(value), "value {value} popped twice");
    }
    assert_eq!(seen.len(), THREADS * PER_THREAD);
}

/// Readers never see a torn two-level write.
#[test]
fn get_all_sees_consistent_snapshots() {
    let store: ResourceStore<usize> = ResourceStore::new();
    let ids: Vec<String> = (0..THREADS).map(|t| format!("conn{t}")).collect();

    let writers: Vec<_> = ids
        .iter()
        .cloned()
        .map(|id| {
            let store = store.clone();
            thread::spawn(move || {
                for round in 0..PER_THREAD {
                    store.store(&id, "status", round);
                }
            })
        })
        .collect();

    let reader = {
        let store = store.clone();
        thread::spawn(move || {
            for _ in 0..PER_THREAD {
                let snapshot = store.get_all("status").unwrap();
                assert!(snapshot.len() <= THREADS);
                assert!(snapshot.values().all(|&round| round < PER_THREAD));
            }
        })
    };

    for handle in writers {
        handle.join().expect("Writer thread panicked");
    }
    reader.join().expect("Reader thread panicked");

    let all = store.get_all("status").unwrap();
    assert_eq!(all.len(), THREADS);
    assert!(all.values().all(|&round| round == PER_THREAD - 1));
}

/// Concurrent deletes of one value hand it to exactly one caller.
#[test]
fn delete_is_won_by_one_thread() {
    for _ in 0..50 {
        let store: ResourceStore<&'static str> = ResourceStore::new();
        store.store("conn1", "credential", "cred");
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let store = store.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    store.delete("conn1", "credential").unwrap()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .filter_map(|handle| handle.join().expect("Deleter thread panicked"))
            .count();
        assert_eq!(winners, 1);
    }
}

/// Payload whose `Clone` panics while its switch is armed.
#[derive(Debug)]
struct Tripwire {
    value: usize,
    armed: Arc<AtomicBool>,
}

impl Clone for Tripwire {
    fn clone(&self) -> Self {
        assert!(!self.armed.load(Ordering::SeqCst), "clone while armed");
        Self {
            value: self.value,
            armed: Arc::clone(&self.armed),
        }
    }
}

/// A panic inside an operation releases the lock and changes nothing.
#[test]
fn panic_inside_operation_releases_lock() {
    let armed = Arc::new(AtomicBool::new(false));
    let store: ResourceStore<Tripwire> = ResourceStore::new();
    store.store(
        "conn1",
        "credential",
        Tripwire {
            value: 7,
            armed: Arc::clone(&armed),
        },
    );
    store
        .push(
            "conn1",
            "events",
            Tripwire {
                value: 1,
                armed: Arc::clone(&armed),
            },
        )
        .unwrap();
    armed.store(true, Ordering::SeqCst);

    // The clone runs while `get`/`get_all` hold the lock.
    let getter = {
        let store = store.clone();
        thread::spawn(move || store.get("conn1", "credential").map(|v| v.map(|t| t.value)))
    };
    assert!(getter.join().is_err());
    let snapshot = {
        let store = store.clone();
        thread::spawn(move || store.get_all("credential").map(|all| all.len()))
    };
    assert!(snapshot.join().is_err());

    // Other threads can still take the lock.
    let popper = {
        let store = store.clone();
        thread::spawn(move || store.pop("conn1", "events").unwrap().map(|t| t.value))
    };
    assert_eq!(popper.join().expect("Popper thread panicked"), Some(1));

    armed.store(false, Ordering::SeqCst);
    assert_eq!(store.ids(), vec!["conn1".to_string()]);
    assert_eq!(store.queue_len("conn1", "events"), 0);
    assert_eq!(
        store.get("conn1", "credential").unwrap().map(|t| t.value),
        Some(7)
    );
}
