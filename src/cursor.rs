//! Iteration in ascending slot order.
//!
//! `Iter` borrows the table and is the usual Rust iterator. `Cursor` is the
//! detached external iterator: it holds no reference, only the stamp of the
//! table state it was positioned against, and every call re-checks that
//! stamp so a mutated or different table is reported instead of read.

use crate::error::{Error, Result};
use crate::key::Key;
use crate::probe_table::{ProbeTable, Slot};

/// Identity of one structural state of one table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct Stamp {
    table: u64,
    generation: u64,
}

impl Stamp {
    pub(crate) fn new(table: u64, generation: u64) -> Self {
        Self { table, generation }
    }
}

/// Iterator over the bindings of a `ProbeTable`.
pub struct Iter<'a, 'k, V> {
    slots: core::slice::Iter<'a, Slot<'k, V>>,
    remaining: usize,
}

impl<'a, 'k, V> Iter<'a, 'k, V> {
    pub(crate) fn new(slots: core::slice::Iter<'a, Slot<'k, V>>, remaining: usize) -> Self {
        Self { slots, remaining }
    }
}

impl<'a, 'k, V> Iterator for Iter<'a, 'k, V> {
    type Item = (Key<'k>, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let b = self.slots.by_ref().find_map(|s| s.as_ref())?;
        self.remaining -= 1;
        Some((b.key, &b.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, '_, V> {}

impl<V> core::iter::FusedIterator for Iter<'_, '_, V> {}

/// External cursor over a `ProbeTable`.
///
/// Valid only while the table it was created or reset against is not
/// inserted into, removed from or resized. Afterwards every call returns
/// `Error::Invalid` until `reset`.
#[derive(Clone, Debug)]
pub struct Cursor {
    stamp: Stamp,
    // Next occupied slot, or the table capacity once exhausted.
    next: usize,
}

impl Cursor {
    /// Position a cursor on the first binding of `table`.
    pub fn new<V>(table: &ProbeTable<'_, V>) -> Self {
        Self {
            stamp: table.stamp(),
            next: table.next_occupied(0),
        }
    }

    /// Rebind to `table`, which may differ from the original, and rewind.
    pub fn reset<V>(&mut self, table: &ProbeTable<'_, V>) {
        *self = Self::new(table);
    }

    pub fn has_next<V>(&self, table: &ProbeTable<'_, V>) -> Result<bool> {
        self.check(table)?;
        Ok(self.next != table.capacity())
    }

    /// Yield the binding under the cursor and advance to the next occupied
    /// slot.
    #[allow(clippy::should_implement_trait)]
    pub fn next<'a, 'k, V>(&mut self, table: &'a ProbeTable<'k, V>) -> Result<(Key<'k>, &'a V)> {
        self.check(table)?;
        let b = table.binding_at(self.next).ok_or(Error::IteratorExhausted)?;
        self.next = table.next_occupied(self.next + 1);
        Ok((b.key, &b.value))
    }

    fn check<V>(&self, table: &ProbeTable<'_, V>) -> Result<()> {
        if self.stamp == table.stamp() {
            Ok(())
        } else {
            Err(Error::Invalid)
        }
    }
}
