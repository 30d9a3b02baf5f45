//! SHA256 double-hashing and hash display helpers.

use sha2::{Digest, Sha256};

/// A 32-byte hash in internal byte order.
pub type Hash256 = [u8; 32];

/// Bitcoin's double SHA256: SHA256(SHA256(data)).
///
/// This is used for block header hashing, transaction IDs, and merkle trees.
#[inline]
pub fn double_sha256(data: &[u8]) -> Hash256 {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut result = [0u8; 32];
    result.copy_from_slice(&second);
    result
}

/// Single SHA256 hash.
#[inline]
pub fn sha256(data: &[u8]) -> Hash256 {
    let hash = Sha256::digest(data);
    let mut result = [0u8; 32];
    result.copy_from_slice(&hash);
    result
}

/// Reverse the byte order of a 32-byte array.
///
/// Hashes are stored little-endian but displayed (and compared against
/// targets) big-endian.
#[inline]
pub fn reverse_bytes(bytes: &Hash256) -> Hash256 {
    let mut reversed = *bytes;
    reversed.reverse();
    reversed
}

/// Convert a hash to its display format (reversed hex).
pub fn hash_to_display_hex(hash: &Hash256) -> String {
    hex::encode(reverse_bytes(hash))
}

/// Parse a display-format hex hash into internal byte order.
pub fn hash_from_display_hex(display: &str) -> Option<Hash256> {
    let bytes = hex::decode(display).ok()?;
    let mut hash: Hash256 = bytes.try_into().ok()?;
    hash.reverse();
    Some(hash)
}
