//! Proof-of-work nonce search.
//!
//! The search starts at nonce 1 and steps by 2, so only odd nonces are ever
//! tried, and the first one satisfying the predicate wins. There is no upper
//! bound: with a real difficulty the loop may never return, so callers are
//! expected to use trivial test difficulty. Past `u32::MAX` the nonce wraps.

use forge_core::difficulty::check_proof_of_work;
use forge_core::{BlockHeader, ConsensusParams, Hash256, PowError};
use tracing::trace;

/// Search odd nonces 1, 3, 5, ... until `predicate` accepts the header.
///
/// The predicate receives the header's proof-of-work hash, its bits and the
/// candidate nonce. The winning nonce is left in `header` and returned. A
/// predicate error stops the search and is returned unchanged.
pub fn search_nonce<E, F>(header: &mut BlockHeader, mut predicate: F) -> Result<u32, E>
where
    F: FnMut(&Hash256, u32, u32) -> Result<bool, E>,
{
    header.nonce = 1;
    while !predicate(&header.pow_hash(), header.bits, header.nonce)? {
        header.nonce = header.nonce.wrapping_add(2);
    }
    trace!(nonce = header.nonce, "found proof of work");
    Ok(header.nonce)
}

/// Solve `header` against the hashcash predicate of `params`.
pub fn solve_header(header: &mut BlockHeader, params: &ConsensusParams) -> Result<u32, PowError> {
    search_nonce(header, |hash, bits, _nonce| check_proof_of_work(hash, bits, params))
}
