#![cfg(test)]

// Property tests for ProbeTable kept inside the crate so they can check the
// slot-level invariants after every step.

use crate::cursor::Cursor;
use crate::error::Error;
use crate::key::Key;
use crate::probe_table::ProbeTable;
use crate::INITIAL_SIZE;
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Lookup(usize),
    Mutate(usize, i32),
    Iterate,
    CursorWalk,
}

fn key(s: &str) -> Key<'_> {
    Key::try_from(s).unwrap()
}

fn arb_ops(pool_len: usize) -> impl Strategy<Value = Vec<OpI>> {
    let idx = 0..pool_len;
    let op = prop_oneof![
        4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
        3 => idx.clone().prop_map(OpI::Remove),
        2 => idx.clone().prop_map(OpI::Lookup),
        1 => (idx, any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
        1 => Just(OpI::Iterate),
        1 => Just(OpI::CursorWalk),
    ];
    proptest::collection::vec(op, 1..200)
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{1,6}", 1..=48)
        .prop_flat_map(|pool| (Just(pool.clone()), arb_ops(pool.len())))
}

/// Keys sharing a home slot in the initial table, plus their home-slot
/// neighbours, so chains overlap and wrap.
fn colliding_pool() -> Vec<String> {
    let last = INITIAL_SIZE - 1;
    let mut pool = Vec::new();
    for (home, n) in [(last, 6), (0, 4), (1, 3), (50, 8), (51, 4)] {
        pool.extend(
            (0..)
                .map(|i| format!("h{home}-{i}"))
                .filter(|s| key(s).home_index(INITIAL_SIZE) == home)
                .take(n),
        );
    }
    pool
}

fn run_scenario(pool: &[String], ops: Vec<OpI>) -> Result<(), TestCaseError> {
    let mut sut: ProbeTable<'_, i32> = ProbeTable::new();
    let mut model: HashMap<&str, i32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = pool[i].as_str();
                let size_before = sut.len();
                let capacity_before = sut.capacity();
                let stamp_before = sut.stamp();
                match sut.insert(key(k), v) {
                    Ok(prev) => prop_assert_eq!(prev, model.insert(k, v)),
                    Err(Error::ProbingFailed) => {
                        // All-or-nothing: not bound, not replaced, not resized.
                        prop_assert_eq!(sut.len(), size_before);
                        prop_assert_eq!(sut.capacity(), capacity_before);
                        prop_assert_eq!(sut.stamp(), stamp_before);
                        prop_assert_eq!(sut.lookup(key(k)).ok(), model.get(k));
                    }
                    Err(e) => prop_assert!(false, "unexpected insert error {:?}", e),
                }
            }
            OpI::Remove(i) => {
                let k = pool[i].as_str();
                match (sut.remove(key(k)), model.remove(k)) {
                    (Ok((kk, v)), Some(mv)) => {
                        prop_assert_eq!(kk.as_bytes(), k.as_bytes());
                        prop_assert_eq!(v, mv);
                    }
                    (Err(Error::KeyNotFound), None) => {}
                    // Absent key whose whole probe window is occupied.
                    (Err(Error::ProbingFailed), None) => {}
                    (res, mv) => prop_assert!(false, "remove {k:?}: {:?} vs model {:?}", res, mv),
                }
            }
            OpI::Lookup(i) => {
                let k = pool[i].as_str();
                match model.get(k) {
                    Some(v) => prop_assert_eq!(sut.lookup(key(k)), Ok(v)),
                    None => prop_assert_eq!(sut.lookup(key(k)), Err(Error::KeyNotFound)),
                }
            }
            OpI::Mutate(i, d) => {
                let k = pool[i].as_str();
                if let Some(mv) = model.get_mut(k) {
                    let v = sut.lookup_mut(key(k)).expect("present key resolves");
                    *v = v.saturating_add(d);
                    *mv = mv.saturating_add(d);
                }
            }
            OpI::Iterate => {
                let s: BTreeMap<&[u8], i32> =
                    sut.iter().map(|(k, v)| (k.as_bytes(), *v)).collect();
                let m: BTreeMap<&[u8], i32> =
                    model.iter().map(|(k, v)| (k.as_bytes(), *v)).collect();
                prop_assert_eq!(sut.iter().count(), sut.len());
                prop_assert_eq!(s, m);
            }
            OpI::CursorWalk => {
                let mut c = Cursor::new(&sut);
                let mut s = BTreeMap::new();
                while c.has_next(&sut).unwrap() {
                    let (k, v) = c.next(&sut).unwrap();
                    prop_assert!(s.insert(k.as_bytes(), *v).is_none(), "yielded twice");
                }
                prop_assert_eq!(c.next(&sut), Err(Error::IteratorExhausted));
                let m: BTreeMap<&[u8], i32> =
                    model.iter().map(|(k, v)| (k.as_bytes(), *v)).collect();
                prop_assert_eq!(s, m);
            }
        }

        // Post-conditions after each op
        sut.assert_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - Round-trip, overwrite and removal agree with the model.
// - Count equals distinct keys inserted minus keys removed.
// - Iteration and cursor walks yield the model's bindings exactly once.
// - Slot invariants: prime capacity, every key within the probe bound of its
//   home with no gap, load in sync with occupied slots.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(&pool, ops)?;
    }
}

// Property: Same invariants over a pool of keys with clustered homes,
// stressing chain repair on removal, wrapping chains and probe-triggered
// resizes.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions(ops in arb_ops(25)) {
        let pool = colliding_pool();
        prop_assert_eq!(pool.len(), 25);
        run_scenario(&pool, ops)?;
    }
}

// Property: growth preserves contents regardless of how it was triggered.
proptest! {
    #![proptest_config(ProptestConfig { cases: 16, .. ProptestConfig::default() })]
    #[test]
    fn prop_resize_preserves_contents(n in 100usize..400, seed in any::<u32>()) {
        let keys: Vec<String> = (0..n).map(|i| format!("{seed:x}/{i}")).collect();
        let mut t = ProbeTable::new();
        let mut before: BTreeMap<&[u8], usize> = BTreeMap::new();
        for (i, s) in keys.iter().enumerate() {
            let cap = t.capacity();
            if t.insert(key(s), i).is_ok() {
                before.insert(s.as_bytes(), i);
            }
            if t.capacity() != cap {
                let after: BTreeMap<&[u8], usize> =
                    t.iter().map(|(k, v)| (k.as_bytes(), *v)).collect();
                prop_assert_eq!(&after, &before);
            }
            prop_assert!(t.len() < t.capacity());
        }
        t.assert_invariants();
        prop_assert_eq!(t.len(), before.len());
    }
}
