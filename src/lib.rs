//! probe-hashmap: an open-addressing hash table over borrowed byte-string
//! keys, with bounded linear probing, prime-sized growth, tombstone-free
//! removal and an opaque-handle API.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small table whose failure modes are explicit results, never
//!   partial states, layered so each piece has one contract.
//! - Layers:
//!   - ProbeTable<'k, V>: owns the slot array. Hashing (djb2-xor), bounded
//!     linear probing, growth to the next prime, chain repair on removal.
//!   - Iter / Cursor: borrowing iterator, and a detached cursor that
//!     re-validates a `(table id, generation)` stamp on every call.
//!   - HandleRegistry<'k, V>: tables and cursors behind generational
//!     handles; destroyed or stale handles report `Error::Invalid`.
//!
//! Constraints
//! - Single-threaded; callers serialize access. Lookups take `&self`,
//!   everything that can move bindings takes `&mut self`.
//! - Keys are non-empty, NUL-free byte strings borrowed for `'k`; the table
//!   never copies or frees key bytes.
//! - Capacity is always prime and at least `INITIAL_SIZE`.
//! - A probe inspects at most `MAX_PROBES` slots. Running out is
//!   `ProbingFailed`, which an insert answers with one resize and retry.
//!
//! Failure boundaries
//! - Resize computes the full placement before moving anything; allocation
//!   or probing failure leaves the old slot array in place.
//! - Removal has no tombstones: it shifts chain members back into the hole
//!   until every remaining key is reachable from its home again.
//!
//! Iteration order
//! - Ascending physical slot order. It depends on capacity and on the
//!   insert/remove/resize history, so only the set of bindings is stable.

pub mod config;
pub mod cursor;
mod error;
pub mod handle_registry;
mod key;
pub mod probe_table;
mod probe_table_proptest;

// Public surface
pub use config::{GROWTH_RATE, INITIAL_SIZE, LOAD_FACTOR_THRESHOLD, MAX_PROBES, PROBE_INTERVAL};
pub use cursor::{Cursor, Iter};
pub use error::{Error, Result};
pub use handle_registry::{HandleRegistry, IterHandle, TableHandle};
pub use key::Key;
pub use probe_table::ProbeTable;
