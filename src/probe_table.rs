//! ProbeTable: open-addressing store with bounded linear probing,
//! prime-sized growth and tombstone-free removal.

use crate::config::{
    next_prime, GROWTH_RATE, INITIAL_SIZE, LOAD_FACTOR_THRESHOLD, MAX_PROBES, PROBE_INTERVAL,
};
use crate::cursor::{Iter, Stamp};
use crate::error::{Error, Result};
use crate::key::Key;
use std::alloc::{handle_alloc_error, Layout};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

#[derive(Debug)]
pub(crate) struct Binding<'k, V> {
    pub(crate) key: Key<'k>,
    pub(crate) value: V,
}

pub(crate) type Slot<'k, V> = Option<Binding<'k, V>>;

/// A rehash that has been computed but not applied: `placement[new_idx]` is
/// the current index of the binding that would land in `new_idx`.
struct Placement {
    placement: Vec<Option<usize>>,
}

impl Placement {
    fn size(&self) -> usize {
        self.placement.len()
    }

    /// Current indices of the planned bindings, in planned slot order.
    fn order(&self) -> impl Iterator<Item = usize> + '_ {
        self.placement.iter().flatten().copied()
    }
}

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(0);

/// Hash table keyed by borrowed byte strings.
///
/// The slot array is never exposed. Capacity is always a prime `>= 257`, and
/// every key lives within `MAX_PROBES` slots of its home index with no empty
/// slot in between.
pub struct ProbeTable<'k, V> {
    slots: Vec<Slot<'k, V>>,
    load: usize,
    id: u64,
    // Bumped on every structural mutation; cursors compare against it.
    generation: u64,
}

#[inline]
fn probe_sequence(home: usize, size: usize) -> impl Iterator<Item = usize> {
    (0..MAX_PROBES).map(move |i| (home + i * PROBE_INTERVAL) % size)
}

/// First index in the probe window of `key` that is empty or holds `key`,
/// where `occupant` reports the key stored at an index.
fn probe_for<'k, F>(key: Key<'_>, size: usize, occupant: F) -> Result<usize>
where
    F: Fn(usize) -> Option<Key<'k>>,
{
    probe_sequence(key.home_index(size), size)
        .find(|&idx| match occupant(idx) {
            None => true,
            Some(k) => k.as_bytes() == key.as_bytes(),
        })
        .ok_or(Error::ProbingFailed)
}

fn alloc_empty<T>(size: usize) -> Result<Vec<Option<T>>> {
    let mut v = Vec::new();
    v.try_reserve_exact(size)?;
    v.resize_with(size, || None);
    Ok(v)
}

impl<'k, V> ProbeTable<'k, V> {
    /// Empty table at `INITIAL_SIZE`. Allocation failure is fatal.
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_SIZE)
    }

    /// Empty table with at least `capacity` slots (rounded up to a prime,
    /// never below `INITIAL_SIZE`). Allocation failure is fatal.
    pub fn with_capacity(capacity: usize) -> Self {
        match Self::try_with_capacity(capacity) {
            Ok(table) => table,
            Err(_) => handle_alloc_error(
                Layout::array::<Slot<'k, V>>(capacity)
                    .unwrap_or_else(|_| Layout::new::<Slot<'k, V>>()),
            ),
        }
    }

    pub fn try_new() -> Result<Self> {
        Self::try_with_capacity(INITIAL_SIZE)
    }

    /// Like `with_capacity`, but a request no slot array could satisfy
    /// reports `OutOfMemory` instead of aborting.
    pub fn try_with_capacity(capacity: usize) -> Result<Self> {
        let size = Self::slot_count(capacity.max(INITIAL_SIZE))?;
        Ok(Self {
            slots: alloc_empty(size)?,
            load: 0,
            id: NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed),
            generation: 0,
        })
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.load
    }

    pub fn is_empty(&self) -> bool {
        self.load == 0
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn load_factor(&self) -> f64 {
        self.load as f64 / self.capacity() as f64
    }

    /// Smallest prime `>= at_least` that an allocation of slots could
    /// still address.
    fn slot_count(at_least: usize) -> Result<usize> {
        let limit = isize::MAX as usize / core::mem::size_of::<Slot<'k, V>>();
        if at_least > limit {
            return Err(Error::OutOfMemory);
        }
        next_prime(at_least)
            .filter(|&n| n <= limit)
            .ok_or(Error::OutOfMemory)
    }

    /// Index of the slot holding `key`, or of the empty slot where it would
    /// go. `ProbingFailed` when neither shows up within `MAX_PROBES`.
    fn find_slot(&self, key: Key<'_>) -> Result<usize> {
        probe_for(key, self.capacity(), |idx| {
            self.slots[idx].as_ref().map(|b| b.key)
        })
    }

    /// `find_slot` against a planned layout instead of the live one.
    fn find_planned_slot(&self, plan: &Placement, key: Key<'_>) -> Result<usize> {
        probe_for(key, plan.size(), |idx| {
            plan.placement[idx].and_then(|old| self.slots[old].as_ref().map(|b| b.key))
        })
    }

    pub fn lookup(&self, key: Key<'_>) -> Result<&V> {
        match self.find_slot(key) {
            Ok(idx) => self.slots[idx]
                .as_ref()
                .map(|b| &b.value)
                .ok_or(Error::KeyNotFound),
            Err(_) => Err(Error::KeyNotFound),
        }
    }

    pub fn lookup_mut(&mut self, key: Key<'_>) -> Result<&mut V> {
        match self.find_slot(key) {
            Ok(idx) => self.slots[idx]
                .as_mut()
                .map(|b| &mut b.value)
                .ok_or(Error::KeyNotFound),
            Err(_) => Err(Error::KeyNotFound),
        }
    }

    pub fn contains_key(&self, key: Key<'_>) -> bool {
        self.lookup(key).is_ok()
    }

    /// Bind `key` to `value`, returning the value it replaces.
    ///
    /// Grows first when the load factor is at or above the threshold, and
    /// once more if the probe sequence for `key` is exhausted. Growth is only
    /// planned until the insert is known to land, so on error the table is
    /// left exactly as it was and `value` is dropped.
    pub fn insert(&mut self, key: Key<'k>, value: V) -> Result<Option<V>> {
        let mut plan = None;
        if self.load_factor() >= LOAD_FACTOR_THRESHOLD {
            plan = Some(self.plan_growth(self.capacity(), self.occupied())?);
        }

        let probed = match &plan {
            Some(p) => self.find_planned_slot(p, key),
            None => self.find_slot(key),
        };
        let idx = match probed {
            Ok(idx) => idx,
            Err(Error::ProbingFailed) => {
                let retry = match &plan {
                    Some(p) => self.plan_growth(p.size(), p.order())?,
                    None => self.plan_growth(self.capacity(), self.occupied())?,
                };
                trace!(size = retry.size(), "insert probe exhausted, retrying after growth");
                let idx = self.find_planned_slot(&retry, key)?;
                plan = Some(retry);
                idx
            }
            Err(e) => return Err(e),
        };

        if let Some(plan) = plan {
            self.apply(plan)?;
        }
        self.generation += 1;
        let slot = &mut self.slots[idx];
        match slot {
            Some(binding) => {
                binding.key = key;
                Ok(Some(core::mem::replace(&mut binding.value, value)))
            }
            None => {
                *slot = Some(Binding { key, value });
                self.load += 1;
                Ok(None)
            }
        }
    }

    /// Remove `key`, returning the stored key reference and value.
    pub fn remove(&mut self, key: Key<'_>) -> Result<(Key<'k>, V)> {
        let idx = self.find_slot(key)?;
        let removed = self.slots[idx].take().ok_or(Error::KeyNotFound)?;
        self.close_chain(idx);
        self.load -= 1;
        self.generation += 1;
        Ok((removed.key, removed.value))
    }

    /// Repair the collision chain after `hole` was emptied.
    ///
    /// Walks forward to the end of the chain. A binding whose home lies
    /// cyclically in `(hole, idx]` is still reachable and stays; any other
    /// binding moves back into the hole, and its old slot becomes the hole.
    fn close_chain(&mut self, mut hole: usize) {
        let size = self.capacity();
        let mut idx = hole;
        loop {
            idx = (idx + PROBE_INTERVAL) % size;
            let home = match &self.slots[idx] {
                Some(b) => b.key.home_index(size),
                None => break,
            };
            let reachable = if hole <= idx {
                hole < home && home <= idx
            } else {
                hole < home || home <= idx
            };
            if !reachable {
                self.slots[hole] = self.slots[idx].take();
                hole = idx;
            }
        }
    }

    /// Indices of occupied slots in ascending order.
    fn occupied(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|_| idx))
    }

    /// Plan a rehash of the bindings at `order` (visited in that order) from
    /// a layout of `old_size` slots into the next prime capacity.
    ///
    /// Nothing moves. An allocation or probing failure only drops the plan.
    fn plan_growth(
        &self,
        old_size: usize,
        order: impl Iterator<Item = usize>,
    ) -> Result<Placement> {
        let new_size = GROWTH_RATE
            .checked_mul(old_size)
            .ok_or(Error::OutOfMemory)
            .and_then(Self::slot_count)?;
        let mut placement: Vec<Option<usize>> = alloc_empty(new_size)?;

        for old_idx in order {
            let Some(binding) = &self.slots[old_idx] else { continue };
            let home = binding.key.home_index(new_size);
            match probe_sequence(home, new_size).find(|&i| placement[i].is_none()) {
                Some(new_idx) => placement[new_idx] = Some(old_idx),
                None => {
                    debug!(
                        old_size,
                        new_size,
                        load = self.load,
                        "resize abandoned, rehash probe exhausted"
                    );
                    return Err(Error::ProbingFailed);
                }
            }
        }
        Ok(Placement { placement })
    }

    /// Install a planned layout. The new slot array is allocated before any
    /// binding moves, so a failure leaves the table as it was.
    fn apply(&mut self, plan: Placement) -> Result<()> {
        let old_size = self.capacity();
        let new_size = plan.size();
        let mut slots: Vec<Slot<'k, V>> = alloc_empty(new_size)?;
        for (new_idx, old_idx) in plan.placement.into_iter().enumerate() {
            if let Some(old_idx) = old_idx {
                slots[new_idx] = self.slots[old_idx].take();
            }
        }
        self.slots = slots;
        self.generation += 1;
        debug!(old_size, new_size, load = self.load, "probe table resized");
        Ok(())
    }

    /// Borrowing iterator in ascending slot order.
    pub fn iter(&self) -> Iter<'_, 'k, V> {
        Iter::new(self.slots.iter(), self.load)
    }

    /// Call `f` on every binding in slot order.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(Key<'k>, &V),
    {
        for (k, v) in self.iter() {
            f(k, v);
        }
    }

    pub(crate) fn stamp(&self) -> Stamp {
        Stamp::new(self.id, self.generation)
    }

    /// First occupied index at or after `from`, or `capacity()` if none.
    pub(crate) fn next_occupied(&self, from: usize) -> usize {
        let size = self.capacity();
        (from.min(size)..size)
            .find(|&i| self.slots[i].is_some())
            .unwrap_or(size)
    }

    pub(crate) fn binding_at(&self, idx: usize) -> Option<&Binding<'k, V>> {
        self.slots.get(idx)?.as_ref()
    }

    /// Panics if a structural invariant does not hold.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let size = self.capacity();
        assert!(crate::config::is_prime(size) && size >= INITIAL_SIZE);
        let occupied = self.slots.iter().filter(|s| s.is_some()).count();
        assert_eq!(occupied, self.load, "load out of sync");
        assert!(self.load < size);

        let mut seen = std::collections::HashSet::new();
        for (idx, slot) in self.slots.iter().enumerate() {
            let Some(b) = slot else { continue };
            assert!(seen.insert(b.key.as_bytes()), "duplicate key {:?}", b.key);
            let home = b.key.home_index(size);
            let dist = (idx + size - home) % size;
            assert!(dist < MAX_PROBES, "{:?} is {dist} slots from home", b.key);
            for d in 0..dist {
                assert!(
                    self.slots[(home + d) % size].is_some(),
                    "gap between home and {:?}",
                    b.key
                );
            }
        }
    }
}

impl<V> Default for ProbeTable<'_, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, 'k, V> IntoIterator for &'a ProbeTable<'k, V> {
    type Item = (Key<'k>, &'a V);
    type IntoIter = Iter<'a, 'k, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V: core::fmt::Debug> core::fmt::Debug for ProbeTable<'_, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
