//! Borrowed byte-string keys.

use crate::error::{Error, Result};
use core::ffi::CStr;
use core::fmt;

/// A non-empty, NUL-free byte string borrowed from the caller.
///
/// Tables store the reference itself and never copy or free the bytes; the
/// `'k` lifetime keeps the bytes alive for as long as any table holds them.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Key<'k>(&'k [u8]);

impl<'k> Key<'k> {
    /// Wrap `bytes`, rejecting empty input and embedded NUL bytes.
    pub fn new(bytes: &'k [u8]) -> Result<Self> {
        if bytes.is_empty() || bytes.contains(&0) {
            return Err(Error::Invalid);
        }
        Ok(Key(bytes))
    }

    pub fn from_c_str(s: &'k CStr) -> Result<Self> {
        Self::new(s.to_bytes())
    }

    pub fn as_bytes(&self) -> &'k [u8] {
        self.0
    }

    /// djb2-xor: seeded with 5381, `h = h * 33 ^ byte` in wrapping 32-bit
    /// arithmetic.
    pub fn hash_code(&self) -> u32 {
        self.0
            .iter()
            .fold(5381u32, |h, &b| (h << 5).wrapping_add(h) ^ u32::from(b))
    }

    #[inline]
    pub(crate) fn home_index(&self, size: usize) -> usize {
        self.hash_code() as usize % size
    }
}

impl<'k> TryFrom<&'k [u8]> for Key<'k> {
    type Error = Error;
    fn try_from(bytes: &'k [u8]) -> Result<Self> {
        Key::new(bytes)
    }
}

impl<'k> TryFrom<&'k str> for Key<'k> {
    type Error = Error;
    fn try_from(s: &'k str) -> Result<Self> {
        Key::new(s.as_bytes())
    }
}

impl<'k> TryFrom<&'k CStr> for Key<'k> {
    type Error = Error;
    fn try_from(s: &'k CStr) -> Result<Self> {
        Key::from_c_str(s)
    }
}

impl fmt::Debug for Key<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&String::from_utf8_lossy(self.0), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: empty keys and keys containing NUL are rejected.
    #[test]
    fn malformed_keys_rejected() {
        assert_eq!(Key::new(b""), Err(Error::Invalid));
        assert_eq!(Key::new(b"a\0b"), Err(Error::Invalid));
        assert_eq!(Key::try_from(""), Err(Error::Invalid));
        assert!(Key::new(b"ok").is_ok());
    }

    #[test]
    fn c_str_keys_drop_the_terminator() {
        let c = CStr::from_bytes_with_nul(b"abc\0").unwrap();
        let k = Key::from_c_str(c).unwrap();
        assert_eq!(k.as_bytes(), b"abc");
        let empty = CStr::from_bytes_with_nul(b"\0").unwrap();
        assert_eq!(Key::try_from(empty), Err(Error::Invalid));
    }

    /// Invariant: the hash matches the djb2-xor reference values.
    #[test]
    fn hash_reference_values() {
        // 5381 * 33 ^ 'a'
        assert_eq!(Key::new(b"a").unwrap().hash_code(), (5381u32 * 33) ^ 97);
        let ab = ((5381u32 * 33) ^ 97).wrapping_mul(33) ^ 98;
        assert_eq!(Key::new(b"ab").unwrap().hash_code(), ab);
        // Long keys wrap instead of overflowing.
        let long = vec![b'z'; 64];
        let expected = long
            .iter()
            .fold(5381u32, |h, &b| h.wrapping_mul(33) ^ b as u32);
        assert_eq!(Key::new(&long).unwrap().hash_code(), expected);
    }

    /// Invariant: the same key always maps to the same home for a given size.
    #[test]
    fn home_index_is_deterministic() {
        let a = Key::try_from("same").unwrap();
        let owned = String::from("same");
        let b = Key::try_from(owned.as_str()).unwrap();
        assert_eq!(a.home_index(257), b.home_index(257));
        assert_eq!(a.home_index(521), b.home_index(521));
        assert!(a.home_index(257) < 257);
    }

    #[test]
    fn debug_is_lossy_string() {
        let k = Key::try_from("key").unwrap();
        assert_eq!(format!("{:?}", k), "\"key\"");
    }
}
