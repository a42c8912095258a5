//! Compile-time tuning constants for `ProbeTable`.

/// Slot count of a freshly created table. Prime.
pub const INITIAL_SIZE: usize = 257;

/// An insert into a table whose `load / size` is at or above this ratio
/// grows the table first.
pub const LOAD_FACTOR_THRESHOLD: f64 = 0.5;

/// The capacity is multiplied by this factor and then rounded up to the
/// next prime on every resize.
pub const GROWTH_RATE: usize = 2;

/// Distance between consecutive probes. Chain repair on removal assumes 1.
pub const PROBE_INTERVAL: usize = 1;

/// Maximum number of slots one probe sequence inspects.
pub const MAX_PROBES: usize = 16;

/// Smallest prime `>= n`, or `None` if there is none below `usize::MAX`.
pub(crate) fn next_prime(mut n: usize) -> Option<usize> {
    while !is_prime(n) {
        n = n.checked_add(1)?;
    }
    Some(n)
}

/// Trial division over the 6k±1 wheel.
pub(crate) fn is_prime(n: usize) -> bool {
    if n < 4 {
        return n >= 2;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    let mut d = 5;
    while d <= n / d {
        if n % d == 0 || n % (d + 2) == 0 {
            return false;
        }
        d += 6;
    }
    true
}
