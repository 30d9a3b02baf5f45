//! Block primitives for the regtest block forge.
//!
//! This crate provides pure Rust implementations of:
//! - Address decoding into payment destinations (P2PKH, P2SH, P2WPKH, P2WSH, P2TR)
//! - Block header, block and transaction construction and serialization
//! - Coinbase transaction building with BIP34 height commitments
//! - SHA256 double-hashing and merkle roots
//! - Compact difficulty decoding and the proof-of-work predicate
//! - Chain parameters, genesis blocks and the subsidy schedule

pub mod address;
pub mod block;
pub mod difficulty;
pub mod hash;
pub mod merkle;
pub mod network;
pub mod params;
pub mod script;
pub mod transaction;

pub use address::{decode_destination, script_for_destination, AddressError, Destination};
pub use block::{Block, BlockHeader};
pub use difficulty::{bits_to_target, check_proof_of_work, hash_meets_target, PowError};
pub use hash::{double_sha256, hash_to_display_hex, Hash256};
pub use merkle::{block_merkle_root, compute_merkle_root};
pub use network::Network;
pub use params::{block_subsidy, ChainConfig, ChainParams, ConsensusParams, GenesisConfig, ParamsError};
pub use transaction::{CoinbaseBuilder, OutPoint, Transaction, TxIn, TxOut};
