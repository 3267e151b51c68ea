#![no_main]

use std::collections::HashMap;

use arbitrary::Arbitrary;
use dedupe_lock::{KeyGuard, KeyedLock};
use dedupe_types::Content;
use libfuzzer_sys::fuzz_target;

// Fuzz target: drive a KeyedLock with arbitrary try-acquire / release
// sequences and check it against a model of which keys are held.
//
// Keys are drawn from a small alphabet so sequences revisit the same
// entries often. After every step, a key is in the table exactly when the
// model says some guard holds it, and then with exactly one holder.
#[derive(Debug, Arbitrary)]
enum Op {
    TryLock { key: u8 },
    Release { key: u8 },
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    ops: Vec<Op>,
}

fn content(key: u8) -> Content {
    Content::from(vec![b'k'; usize::from(key % 8)])
}

fuzz_target!(|input: FuzzInput| {
    let locks = KeyedLock::<Content>::new();
    let mut held: HashMap<u8, KeyGuard<'_, Content>> = HashMap::new();

    for op in input.ops {
        match op {
            Op::TryLock { key } => {
                let key = key % 8;
                let guard = locks.try_lock(content(key));
                assert_eq!(guard.is_some(), !held.contains_key(&key));
                if let Some(guard) = guard {
                    held.insert(key, guard);
                }
            }
            Op::Release { key } => {
                held.remove(&(key % 8));
            }
        }

        assert_eq!(locks.len(), held.len());
        for key in 0..8u8 {
            let expected = usize::from(held.contains_key(&key));
            assert_eq!(locks.holders(&content(key)), expected);
        }
    }

    drop(held);
    assert!(locks.is_empty());
});
