//! Collaborator contracts and the node context that wires them together.

use std::fmt;
use std::sync::Arc;

use forge_core::{Block, ChainParams, Hash256, Transaction};
use parking_lot::MappedRwLockReadGuard;

use crate::assembler::DefaultBlockAssembler;
use crate::error::{AssemblerError, BlockRejection, MiningError};

/// Summary of the active chain tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainTip {
    pub hash: Hash256,
    pub height: u32,
    pub timestamp: u32,
    pub bits: u32,
    /// Median timestamp of the last blocks up to and including the tip.
    pub median_time_past: u32,
}

/// The validation and chain-state engine.
///
/// Implementations guard their chain with a single reader-writer lock.
/// [`ChainState::read_tip`] hands out a read guard on it; holding the guard
/// keeps the tip from moving. `process_new_block` takes the write side, so
/// it must not be called while a guard from `read_tip` is alive.
pub trait ChainState: Send + Sync {
    /// Parameters of the chain this engine validates.
    fn params(&self) -> &ChainParams;

    /// Read-locked view of the active tip.
    fn read_tip(&self) -> MappedRwLockReadGuard<'_, ChainTip>;

    /// Compact difficulty required of a block building on `tip`.
    ///
    /// Must not take the chain lock; callers may hold a tip guard.
    fn next_work_required(&self, tip: &ChainTip) -> u32;

    /// Validate `block` and, if valid, connect it.
    fn process_new_block(&self, block: &Block, force_processing: bool) -> Result<(), BlockRejection>;
}

/// The pending-transaction pool, opaque to the harness.
pub trait Mempool: Send + Sync {
    /// Transactions available for inclusion, in pool order.
    fn transactions(&self) -> Vec<Transaction>;

    /// Drop every transaction `block` confirms; returns how many went.
    fn remove_for_block(&self, block: &Block) -> usize;
}

/// A candidate block produced by a [`BlockAssembler`].
///
/// The block is not yet valid: its nonce is unset and its timestamp and
/// merkle root may be overwritten before mining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTemplate {
    pub block: Block,
    pub height: u32,
}

/// Selects transactions and builds a header skeleton for the next block.
pub trait BlockAssembler: Send + Sync {
    fn create_new_block(
        &self,
        chainstate: &dyn ChainState,
        mempool: &dyn Mempool,
        coinbase_script: &[u8],
    ) -> Result<BlockTemplate, AssemblerError>;
}

/// Handles to the node a test is driving.
///
/// The chain state and pool are optional so a misconfigured test fails
/// loudly with [`MiningError::MissingCollaborator`] instead of mining
/// against nothing.
#[derive(Clone)]
pub struct NodeContext {
    pub chainstate: Option<Arc<dyn ChainState>>,
    pub mempool: Option<Arc<dyn Mempool>>,
    pub assembler: Arc<dyn BlockAssembler>,
}

impl NodeContext {
    /// A context using the default block assembler.
    pub fn new(chainstate: Arc<dyn ChainState>, mempool: Arc<dyn Mempool>) -> Self {
        NodeContext {
            chainstate: Some(chainstate),
            mempool: Some(mempool),
            assembler: Arc::new(DefaultBlockAssembler::new()),
        }
    }

    /// Replace the block assembler.
    pub fn with_assembler(mut self, assembler: Arc<dyn BlockAssembler>) -> Self {
        self.assembler = assembler;
        self
    }

    pub(crate) fn require_chainstate(&self) -> Result<&dyn ChainState, MiningError> {
        self.chainstate
            .as_deref()
            .ok_or(MiningError::MissingCollaborator("chain state"))
    }

    pub(crate) fn require_mempool(&self) -> Result<&dyn Mempool, MiningError> {
        self.mempool
            .as_deref()
            .ok_or(MiningError::MissingCollaborator("mempool"))
    }
}

impl Default for NodeContext {
    fn default() -> Self {
        NodeContext {
            chainstate: None,
            mempool: None,
            assembler: Arc::new(DefaultBlockAssembler::new()),
        }
    }
}

impl fmt::Debug for NodeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeContext")
            .field("chainstate", &self.chainstate.is_some())
            .field("mempool", &self.mempool.is_some())
            .finish_non_exhaustive()
    }
}
