//! HandleRegistry: opaque-handle front end over `ProbeTable` and `Cursor`.
//!
//! Tables and iterators live in generational slot maps and are addressed
//! only through `TableHandle` / `IterHandle`. A destroyed handle never
//! aliases a later one, so every operation on it reports `Error::Invalid`.
//! An iterator whose table was destroyed or mutated reports `Invalid` as
//! well.

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::key::Key;
use crate::probe_table::ProbeTable;
use slotmap::{DefaultKey, SlotMap};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TableHandle(DefaultKey);

impl TableHandle {
    pub(crate) fn new(k: DefaultKey) -> Self {
        TableHandle(k)
    }
    pub(crate) fn raw_handle(&self) -> DefaultKey {
        self.0
    }

    pub fn count<V>(&self, registry: &HandleRegistry<'_, V>) -> Result<usize> {
        registry.count(*self)
    }

    pub fn lookup<'r, V>(
        &self,
        registry: &'r HandleRegistry<'_, V>,
        key: Key<'_>,
    ) -> Result<&'r V> {
        registry.lookup(*self, key)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct IterHandle(DefaultKey);

impl IterHandle {
    pub(crate) fn new(k: DefaultKey) -> Self {
        IterHandle(k)
    }
    pub(crate) fn raw_handle(&self) -> DefaultKey {
        self.0
    }

    pub fn has_next<V>(&self, registry: &HandleRegistry<'_, V>) -> Result<bool> {
        registry.iter_has_next(*self)
    }
}

#[derive(Debug)]
struct IterState {
    table: TableHandle,
    cursor: Cursor,
}

/// Owner of every table and iterator reachable through handles.
pub struct HandleRegistry<'k, V> {
    tables: SlotMap<DefaultKey, ProbeTable<'k, V>>,
    iters: SlotMap<DefaultKey, IterState>,
}

impl<'k, V> HandleRegistry<'k, V> {
    pub fn new() -> Self {
        Self {
            tables: SlotMap::with_key(),
            iters: SlotMap::with_key(),
        }
    }

    /// Number of live tables.
    pub fn tables(&self) -> usize {
        self.tables.len()
    }

    /// Number of live iterators.
    pub fn iterators(&self) -> usize {
        self.iters.len()
    }

    /// Borrow the table behind `h`.
    pub fn table(&self, h: TableHandle) -> Result<&ProbeTable<'k, V>> {
        self.tables.get(h.raw_handle()).ok_or(Error::Invalid)
    }

    fn table_mut(&mut self, h: TableHandle) -> Result<&mut ProbeTable<'k, V>> {
        self.tables.get_mut(h.raw_handle()).ok_or(Error::Invalid)
    }

    pub fn create_table(&mut self) -> Result<TableHandle> {
        let table = ProbeTable::try_new()?;
        Ok(TableHandle::new(self.tables.insert(table)))
    }

    /// Destroy the table and its slot array. Iterators over it stay
    /// allocated but report `Invalid` until reset onto a live table.
    pub fn destroy_table(&mut self, h: TableHandle) -> Result<()> {
        self.tables
            .remove(h.raw_handle())
            .map(drop)
            .ok_or(Error::Invalid)
    }

    pub fn lookup(&self, h: TableHandle, key: Key<'_>) -> Result<&V> {
        self.table(h)?.lookup(key)
    }

    pub fn insert(&mut self, h: TableHandle, key: Key<'k>, value: V) -> Result<Option<V>> {
        self.table_mut(h)?.insert(key, value)
    }

    pub fn remove(&mut self, h: TableHandle, key: Key<'_>) -> Result<(Key<'k>, V)> {
        self.table_mut(h)?.remove(key)
    }

    pub fn count(&self, h: TableHandle) -> Result<usize> {
        Ok(self.table(h)?.len())
    }

    pub fn for_each<F>(&self, h: TableHandle, f: F) -> Result<()>
    where
        F: FnMut(Key<'k>, &V),
    {
        self.table(h)?.for_each(f);
        Ok(())
    }

    pub fn iter_create(&mut self, h: TableHandle) -> Result<IterHandle> {
        let cursor = Cursor::new(self.table(h)?);
        let k = self.iters.insert(IterState { table: h, cursor });
        Ok(IterHandle::new(k))
    }

    pub fn iter_has_next(&self, ih: IterHandle) -> Result<bool> {
        let state = self.iters.get(ih.raw_handle()).ok_or(Error::Invalid)?;
        state.cursor.has_next(self.table(state.table)?)
    }

    pub fn iter_next(&mut self, ih: IterHandle) -> Result<(Key<'k>, &V)> {
        let state = self.iters.get_mut(ih.raw_handle()).ok_or(Error::Invalid)?;
        let table = self.tables.get(state.table.raw_handle()).ok_or(Error::Invalid)?;
        state.cursor.next(table)
    }

    /// Rebind the iterator to `h` (any live table) and rewind it.
    pub fn iter_reset(&mut self, ih: IterHandle, h: TableHandle) -> Result<()> {
        let state = self.iters.get_mut(ih.raw_handle()).ok_or(Error::Invalid)?;
        let table = self.tables.get(h.raw_handle()).ok_or(Error::Invalid)?;
        state.cursor.reset(table);
        state.table = h;
        Ok(())
    }

    pub fn iter_destroy(&mut self, ih: IterHandle) -> Result<()> {
        self.iters
            .remove(ih.raw_handle())
            .map(drop)
            .ok_or(Error::Invalid)
    }
}

impl<V> Default for HandleRegistry<'_, V> {
    fn default() -> Self {
        Self::new()
    }
}
