//! Error types for block fabrication.
//!
//! Everything in [`MiningError`] is fatal: the harness is test
//! infrastructure, so a failure means the calling test or its environment
//! is broken. Nothing here is retried.

use forge_core::{AddressError, PowError};
use thiserror::Error;

/// A fatal failure while fabricating or submitting a block.
#[derive(Debug, Error)]
pub enum MiningError {
    #[error("invalid mining address: {0}")]
    InvalidAddress(#[from] AddressError),
    #[error("node context has no {0}")]
    MissingCollaborator(&'static str),
    #[error("block assembly failed: {0}")]
    Assembler(#[from] AssemblerError),
    #[error("proof-of-work predicate failed: {0}")]
    Pow(#[from] PowError),
    #[error("block {hash} rejected: {reason}")]
    BlockRejected { hash: String, reason: BlockRejection },
    #[error("block {hash} has no coinbase")]
    MissingCoinbase { hash: String },
    #[error("template builds on {template_parent} but the tip moved to {tip}")]
    StaleTemplate { template_parent: String, tip: String },
    #[error("block timestamp overflows at height {height}")]
    TimestampOverflow { height: u32 },
    #[error("block height overflows u32")]
    HeightOverflow,
}

/// Failure reported by a block assembler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("next block height overflows u32")]
    HeightOverflow,
    #[error("{0}")]
    Other(String),
}

/// Why a chain state refused a block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockRejection {
    #[error("previous block {0} is not the active tip")]
    PrevBlockNotTip(String),
    #[error("bits {got:#010x} differ from required {required:#010x}")]
    BadDifficultyBits { got: u32, required: u32 },
    #[error("proof of work does not meet target")]
    HighHash,
    #[error("invalid proof-of-work target: {0}")]
    InvalidTarget(PowError),
    #[error("first transaction is not a coinbase")]
    MissingCoinbase,
    #[error("more than one coinbase")]
    MultipleCoinbase,
    #[error("transaction {0} is already confirmed")]
    DuplicateTransaction(String),
    #[error("merkle root mismatch")]
    BadMerkleRoot,
    #[error("duplicate transaction in merkle tree")]
    MutatedMerkle,
    #[error("coinbase does not commit to height {0}")]
    BadCoinbaseHeight(u32),
    #[error("coinbase pays {value}, limit is {limit}")]
    CoinbaseValueTooHigh { value: u64, limit: u64 },
    #[error("timestamp {time} not after median time past {median_time_past}")]
    TimeTooOld { time: u32, median_time_past: u32 },
}
