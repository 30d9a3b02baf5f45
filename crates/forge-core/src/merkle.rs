//! Merkle tree computation for block transactions.

use crate::block::Block;
use crate::hash::{double_sha256, Hash256};

/// Compute the merkle root from a list of transaction IDs.
///
/// For a single transaction the merkle root is simply its txid. For
/// multiple transactions we build a binary tree of hashes, duplicating the
/// last hash of any odd-length level.
pub fn compute_merkle_root(txids: &[Hash256]) -> Hash256 {
    compute_merkle_root_checked(txids).0
}

/// Compute the merkle root and report whether the tree is mutated.
///
/// A tree is mutated when some level contains two identical adjacent
/// hashes, which lets a different transaction list produce the same root
/// (CVE-2012-2459). Validators reject such blocks.
pub fn compute_merkle_root_checked(txids: &[Hash256]) -> (Hash256, bool) {
    if txids.is_empty() {
        return ([0u8; 32], false);
    }

    let mut mutated = false;
    let mut current_level: Vec<Hash256> = txids.to_vec();

    while current_level.len() > 1 {
        let mut next_level = Vec::with_capacity((current_level.len() + 1) / 2);

        for pair in current_level.chunks(2) {
            let left = pair[0];
            let right = match pair.get(1) {
                Some(right) => {
                    if *right == left {
                        mutated = true;
                    }
                    *right
                }
                // Odd number of elements, duplicate the last one
                None => left,
            };

            let mut combined = [0u8; 64];
            combined[..32].copy_from_slice(&left);
            combined[32..].copy_from_slice(&right);
            next_level.push(double_sha256(&combined));
        }

        current_level = next_level;
    }

    (current_level[0], mutated)
}

/// Merkle root over the txids of every transaction in `block`.
pub fn block_merkle_root(block: &Block) -> Hash256 {
    compute_merkle_root(&block.txids())
}

/// Like [`block_merkle_root`], also returning the mutation flag.
pub fn block_merkle_root_checked(block: &Block) -> (Hash256, bool) {
    compute_merkle_root_checked(&block.txids())
}
