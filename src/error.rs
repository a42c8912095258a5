//! Result taxonomy shared by every table, cursor and handle operation.

use std::collections::TryReserveError;
use thiserror::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Error)]
pub enum Error {
    /// Unknown or destroyed handle, stale cursor, or malformed key.
    #[error("invalid handle, stale iterator or malformed key")]
    Invalid,
    #[error("no binding for key")]
    KeyNotFound,
    #[error("out of memory")]
    OutOfMemory,
    /// The bounded probe sequence found neither the key nor an empty slot.
    #[error("probe sequence exhausted without finding a slot")]
    ProbingFailed,
    #[error("iterator exhausted")]
    IteratorExhausted,
}

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Self {
        Error::OutOfMemory
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
