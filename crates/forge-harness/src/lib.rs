//! Deterministic block fabrication for proof-of-work test environments.
//!
//! Two ways to grow a chain on demand:
//! - [`create_block_chain`] synthesizes a standalone chain from genesis
//!   parameters alone.
//! - [`mine_block`] and [`generate_to_address`] mine one block on top of a
//!   live node's tip and submit it through the node's [`ChainState`].
//!
//! Both search nonces with [`search_nonce`], which only ever tries odd
//! values starting at 1, and are meant for trivial test difficulty.
//!
//! The node is reached through the [`ChainState`], [`Mempool`] and
//! [`BlockAssembler`] traits. [`InMemoryChainState`], [`TxMempool`] and
//! [`DefaultBlockAssembler`] are minimal implementations for running the
//! harness without a full node.

pub mod assembler;
pub mod chain;
pub mod chainstate;
pub mod error;
pub mod mempool;
pub mod miner;
pub mod node;
pub mod pow;

pub use assembler::DefaultBlockAssembler;
pub use chain::create_block_chain;
pub use chainstate::InMemoryChainState;
pub use error::{AssemblerError, BlockRejection, MiningError};
pub use mempool::{MempoolError, TxMempool};
pub use miner::{generate_to_address, mine_block, prepare_block};
pub use node::{BlockAssembler, BlockTemplate, ChainState, ChainTip, Mempool, NodeContext};
pub use pow::{search_nonce, solve_header};
