// ProbeTable integration suite.
//
// Each test documents the behavior it verifies. Invariants exercised:
// - Round-trip and overwrite: lookup returns the last inserted value; count
//   only grows for new keys.
// - Chain repair: removing a key never hides another key.
// - Growth: capacity stays prime, grows past the load factor threshold and
//   keeps every binding.
// - Iteration: each binding exactly once, cursor and iterator agree.
use probe_hashmap::{Cursor, Error, Key, ProbeTable, INITIAL_SIZE, MAX_PROBES};
use std::collections::BTreeMap;
use std::ffi::CString;

fn key(s: &str) -> Key<'_> {
    Key::try_from(s).unwrap()
}

fn is_prime(n: usize) -> bool {
    n >= 2 && (2..).take_while(|d| d * d <= n).all(|d| n % d != 0)
}

fn keys_with_home(prefix: &str, size: usize, home: usize, n: usize) -> Vec<String> {
    (0..)
        .map(|i| format!("{prefix}{i}"))
        .filter(|s| key(s).hash_code() as usize % size == home)
        .take(n)
        .collect()
}

fn snapshot<'k>(t: &ProbeTable<'k, i32>) -> BTreeMap<&'k [u8], i32> {
    t.iter().map(|(k, v)| (k.as_bytes(), *v)).collect()
}

// Test: insert a, b, c; remove b.
// Verifies: count tracks inserts/removes, b is gone, a and c stay.
#[test]
fn insert_three_remove_middle() {
    let mut t = ProbeTable::new();
    t.insert(key("a"), 1).unwrap();
    t.insert(key("b"), 2).unwrap();
    t.insert(key("c"), 3).unwrap();
    assert_eq!(t.len(), 3);
    assert_eq!(t.lookup(key("b")), Ok(&2));

    t.remove(key("b")).unwrap();
    assert_eq!(t.len(), 2);
    assert_eq!(t.lookup(key("b")), Err(Error::KeyNotFound));
    assert_eq!(t.lookup(key("a")), Ok(&1));
    assert_eq!(t.lookup(key("c")), Ok(&3));
}

// Test: 200 distinct keys into a fresh table.
// Assumes: the load factor threshold is crossed at the 130th insert.
// Verifies: count, every key still found, capacity grew to 521.
#[test]
fn two_hundred_keys_grow_once() {
    let keys: Vec<String> = (0..200).map(|i| format!("k{i}")).collect();
    let mut t = ProbeTable::new();
    for (i, s) in keys.iter().enumerate() {
        t.insert(key(s), i as i32).unwrap();
        if i < 129 {
            assert_eq!(t.capacity(), INITIAL_SIZE);
        }
    }
    assert_eq!(t.len(), 200);
    assert_eq!(t.capacity(), 521);
    assert!(is_prime(t.capacity()));
    for (i, s) in keys.iter().enumerate() {
        assert_eq!(t.lookup(key(s)), Ok(&(i as i32)));
    }
}

// Test: two keys sharing a home slot; remove the one inserted first.
// Verifies: the second key is relocated and still found.
#[test]
fn colliding_pair_remove_first() {
    let pair = keys_with_home("pair", INITIAL_SIZE, 200, 2);
    let mut t = ProbeTable::new();
    t.insert(key(&pair[0]), 10).unwrap();
    t.insert(key(&pair[1]), 20).unwrap();
    t.remove(key(&pair[0])).unwrap();
    assert_eq!(t.lookup(key(&pair[1])), Ok(&20));
    assert_eq!(t.lookup(key(&pair[0])), Err(Error::KeyNotFound));
    assert_eq!(t.len(), 1);
}

// Test: overwrite an existing key.
// Verifies: value changes, count does not.
#[test]
fn overwrite_keeps_count() {
    let mut t = ProbeTable::new();
    t.insert(key("dup"), 1).unwrap();
    assert_eq!(t.insert(key("dup"), 2), Ok(Some(1)));
    assert_eq!(t.len(), 1);
    assert_eq!(t.lookup(key("dup")), Ok(&2));
}

// Test: count bookkeeping across mixed operations.
// Verifies: count == distinct keys inserted - keys removed.
#[test]
fn count_invariant() {
    let keys: Vec<String> = (0..300).map(|i| format!("n{i}")).collect();
    let mut t = ProbeTable::new();
    for s in &keys {
        t.insert(key(s), 0).unwrap();
    }
    for s in &keys[..100] {
        t.insert(key(s), 1).unwrap();
    }
    for s in keys.iter().step_by(3) {
        t.remove(key(s)).unwrap();
    }
    assert_eq!(t.len(), 300 - 100);
    for (i, s) in keys.iter().enumerate() {
        assert_eq!(t.contains_key(key(s)), i % 3 != 0);
    }
}

// Test: every key of a cluster removed one by one, in insertion order.
// Verifies: the survivors stay reachable after each removal.
#[test]
fn draining_a_cluster() {
    let cluster = keys_with_home("cl", INITIAL_SIZE, 128, 12);
    let mut t = ProbeTable::new();
    for (i, s) in cluster.iter().enumerate() {
        t.insert(key(s), i as i32).unwrap();
    }
    for (n, s) in cluster.iter().enumerate() {
        t.remove(key(s)).unwrap();
        for (i, rest) in cluster.iter().enumerate().skip(n + 1) {
            assert_eq!(t.lookup(key(rest)), Ok(&(i as i32)));
        }
    }
    assert!(t.is_empty());
}

// Test: one more colliding key than a probe sequence can hold.
// Verifies: the insert resizes instead of failing, and the iterated
// contents are the same set before and after.
#[test]
fn probe_triggered_resize_preserves_contents() {
    let pool = keys_with_home("pt", INITIAL_SIZE, 31, MAX_PROBES + 1);
    let mut t = ProbeTable::new();
    for (i, s) in pool[..MAX_PROBES].iter().enumerate() {
        t.insert(key(s), i as i32).unwrap();
    }
    let before = snapshot(&t);
    t.insert(key(&pool[MAX_PROBES]), -1).unwrap();
    assert!(t.capacity() > INITIAL_SIZE);

    let mut after = snapshot(&t);
    assert_eq!(after.remove(pool[MAX_PROBES].as_bytes()), Some(-1));
    assert_eq!(after, before);
}

// Test: external cursor over a populated table.
// Verifies: completeness and agreement with the borrowing iterator.
#[test]
fn cursor_matches_iter() {
    let keys: Vec<String> = (0..150).map(|i| format!("cur{i}")).collect();
    let mut t = ProbeTable::new();
    for (i, s) in keys.iter().enumerate() {
        t.insert(key(s), i as i32).unwrap();
    }
    let mut c = Cursor::new(&t);
    let mut walked = Vec::new();
    while c.has_next(&t).unwrap() {
        let (k, v) = c.next(&t).unwrap();
        walked.push((k.as_bytes(), *v));
    }
    let iterated: Vec<_> = t.iter().map(|(k, v)| (k.as_bytes(), *v)).collect();
    assert_eq!(walked, iterated);
    assert_eq!(walked.len(), 150);
    assert_eq!(c.next(&t), Err(Error::IteratorExhausted));
}

// Test: keys borrowed from C strings.
// Verifies: lookups by an equal byte string from another buffer succeed.
#[test]
fn c_string_keys() {
    let owned = CString::new("from-c").unwrap();
    let mut t = ProbeTable::new();
    t.insert(Key::from_c_str(&owned).unwrap(), 5).unwrap();
    assert_eq!(t.lookup(key("from-c")), Ok(&5));
    let (k, _) = t.remove(key("from-c")).unwrap();
    assert_eq!(k.as_bytes(), owned.as_bytes());
}

// Test: values holding references, the table never owning the referent.
#[test]
fn reference_values() {
    let payload = vec![1, 2, 3];
    let mut t: ProbeTable<'_, &Vec<i32>> = ProbeTable::new();
    t.insert(key("p"), &payload).unwrap();
    assert_eq!(t.lookup(key("p")).map(|v| v.len()), Ok(3));
    drop(t);
    assert_eq!(payload.len(), 3);
}
