//! Block header and block construction and serialization.

use crate::hash::{double_sha256, Hash256};
use crate::transaction::{encode_varint, Transaction};

/// Last block version before BIP9 versionbits signalling.
pub const VERSIONBITS_LAST_OLD_BLOCK_VERSION: i32 = 4;

/// Block version with the BIP9 versionbits top bits set.
pub const VERSIONBITS_TOP_BITS: i32 = 0x2000_0000;

/// Size of a block header in bytes.
pub const BLOCK_HEADER_SIZE: usize = 80;

/// A block header (80 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block version.
    pub version: i32,
    /// Hash of the previous block (internal byte order).
    pub prev_block_hash: Hash256,
    /// Merkle root of all transactions.
    pub merkle_root: Hash256,
    /// Block timestamp (Unix time).
    pub timestamp: u32,
    /// Difficulty target in compact "bits" format.
    pub bits: u32,
    /// Nonce for proof of work.
    pub nonce: u32,
}

impl BlockHeader {
    /// Create a new block header with a zero nonce.
    pub fn new(
        version: i32,
        prev_block_hash: Hash256,
        merkle_root: Hash256,
        timestamp: u32,
        bits: u32,
    ) -> Self {
        BlockHeader {
            version,
            prev_block_hash,
            merkle_root,
            timestamp,
            bits,
            nonce: 0,
        }
    }

    /// Serialize the block header to 80 bytes.
    pub fn serialize(&self) -> [u8; BLOCK_HEADER_SIZE] {
        let mut header = [0u8; BLOCK_HEADER_SIZE];

        header[0..4].copy_from_slice(&self.version.to_le_bytes());
        header[4..36].copy_from_slice(&self.prev_block_hash);
        header[36..68].copy_from_slice(&self.merkle_root);
        header[68..72].copy_from_slice(&self.timestamp.to_le_bytes());
        header[72..76].copy_from_slice(&self.bits.to_le_bytes());
        header[76..80].copy_from_slice(&self.nonce.to_le_bytes());

        header
    }

    /// Compute the block hash (double SHA256).
    pub fn hash(&self) -> Hash256 {
        double_sha256(&self.serialize())
    }

    /// The hash the proof-of-work predicate is evaluated on.
    ///
    /// For hashcash chains this is the block hash itself.
    pub fn pow_hash(&self) -> Hash256 {
        self.hash()
    }
}

/// A block: header plus ordered transactions, coinbase first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        Block {
            header,
            transactions,
        }
    }

    /// The block hash.
    pub fn hash(&self) -> Hash256 {
        self.header.hash()
    }

    /// The first transaction, if any.
    pub fn coinbase(&self) -> Option<&Transaction> {
        self.transactions.first()
    }

    /// Txids of all transactions, in block order.
    pub fn txids(&self) -> Vec<Hash256> {
        self.transactions.iter().map(Transaction::txid).collect()
    }

    /// Serialize the complete block.
    pub fn serialize(&self) -> Vec<u8> {
        let mut block = Vec::with_capacity(BLOCK_HEADER_SIZE + 1 + 128 * self.transactions.len());

        block.extend_from_slice(&self.header.serialize());

        encode_varint(self.transactions.len() as u64, &mut block);
        for tx in &self.transactions {
            block.extend_from_slice(&tx.serialize());
        }

        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_to_display_hex;
    use crate::merkle::block_merkle_root;
    use crate::script::p2wsh_op_true;
    use crate::transaction::CoinbaseBuilder;

    #[test]
    fn test_block_header_serialization() {
        let prev_hash = [0x12u8; 32];
        let merkle_root = [0x34u8; 32];
        let timestamp = 1700000000u32;
        let bits = 0x17034219u32;

        let mut header =
            BlockHeader::new(VERSIONBITS_TOP_BITS, prev_hash, merkle_root, timestamp, bits);
        header.nonce = 0xDEADBEEF;

        let serialized = header.serialize();

        // Verify version (0x20000000 in little-endian)
        assert_eq!(&serialized[0..4], &[0x00, 0x00, 0x00, 0x20]);
        assert_eq!(&serialized[4..36], &prev_hash[..]);
        assert_eq!(&serialized[36..68], &merkle_root[..]);
        assert_eq!(&serialized[68..72], &timestamp.to_le_bytes());
        assert_eq!(&serialized[72..76], &[0x19, 0x42, 0x03, 0x17]);
        // Verify nonce (0xDEADBEEF in little-endian)
        assert_eq!(&serialized[76..80], &[0xEF, 0xBE, 0xAD, 0xDE]);
    }

    #[test]
    fn test_nonce_changes_hash() {
        let mut header = BlockHeader::new(1, [0u8; 32], [0u8; 32], 0, 0x207fffff);
        let before = header.hash();
        header.nonce = 1;

        assert_ne!(before, header.hash());
        assert_eq!(header.pow_hash(), header.hash());
    }

    #[test]
    fn test_block_serialization() {
        let coinbase = CoinbaseBuilder::new(1, p2wsh_op_true()).build(50);
        let mut block = Block::new(
            BlockHeader::new(VERSIONBITS_LAST_OLD_BLOCK_VERSION, [0u8; 32], [0u8; 32], 1, 0x207fffff),
            vec![coinbase.clone()],
        );
        block.header.merkle_root = block_merkle_root(&block);

        let raw = block.serialize();

        assert_eq!(&raw[..80], &block.header.serialize()[..]);
        assert_eq!(raw[80], 0x01);
        assert_eq!(&raw[81..], &coinbase.serialize()[..]);
        assert_eq!(block.header.merkle_root, coinbase.txid());
        assert_eq!(hash_to_display_hex(&block.hash()).len(), 64);
    }
}
