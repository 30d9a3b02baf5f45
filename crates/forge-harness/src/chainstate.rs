//! An in-memory chain state for driving the harness without a full node.
//!
//! It keeps a single genesis-rooted chain and checks exactly what the
//! harness promises to get right: linkage, merkle binding, proof of work,
//! the coinbase, and median-time-past. It does not track UTXOs, verify
//! scripts, or handle forks.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use forge_core::difficulty::check_proof_of_work;
use forge_core::merkle::block_merkle_root_checked;
use forge_core::params::block_subsidy;
use forge_core::script::ScriptBuilder;
use forge_core::{hash_to_display_hex, Block, ChainParams, Hash256};
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};
use tracing::{debug, warn};

use crate::error::BlockRejection;
use crate::node::{ChainState, ChainTip, Mempool};

/// Number of blocks whose timestamps form the median time past.
pub const MEDIAN_TIME_SPAN: usize = 11;

struct ActiveChain {
    /// Index is height; `blocks[0]` is genesis.
    blocks: Vec<Block>,
    heights: HashMap<Hash256, u32>,
    /// Txids of every connected non-coinbase transaction.
    confirmed: HashSet<Hash256>,
    tip: ChainTip,
}

impl ActiveChain {
    fn new(genesis: Block) -> Self {
        let hash = genesis.hash();
        let mut chain = ActiveChain {
            blocks: vec![genesis],
            heights: HashMap::from([(hash, 0)]),
            confirmed: HashSet::new(),
            tip: ChainTip {
                hash,
                height: 0,
                timestamp: 0,
                bits: 0,
                median_time_past: 0,
            },
        };
        chain.tip = chain.compute_tip();
        chain
    }

    fn compute_tip(&self) -> ChainTip {
        let height = self.blocks.len() - 1;
        let header = &self.blocks[height].header;
        ChainTip {
            hash: header.hash(),
            height: height as u32,
            timestamp: header.timestamp,
            bits: header.bits,
            median_time_past: median_time_past(&self.blocks),
        }
    }

    fn connect(&mut self, block: Block, hash: Hash256) {
        let height = self.tip.height + 1;
        self.confirmed
            .extend(block.transactions.iter().skip(1).map(|tx| tx.txid()));
        self.blocks.push(block);
        self.heights.insert(hash, height);
        self.tip = self.compute_tip();
    }
}

/// Median timestamp of the last [`MEDIAN_TIME_SPAN`] blocks.
fn median_time_past(blocks: &[Block]) -> u32 {
    let start = blocks.len().saturating_sub(MEDIAN_TIME_SPAN);
    let mut times: Vec<u32> = blocks[start..].iter().map(|b| b.header.timestamp).collect();
    times.sort_unstable();
    times.get(times.len() / 2).copied().unwrap_or(0)
}

/// A single-chain, in-memory [`ChainState`].
///
/// When given a pool with [`InMemoryChainState::with_mempool`], every
/// connected block's transactions are removed from it.
pub struct InMemoryChainState {
    params: ChainParams,
    chain: RwLock<ActiveChain>,
    mempool: Option<Arc<dyn Mempool>>,
}

impl InMemoryChainState {
    /// A chain containing only the genesis block of `params`.
    pub fn new(params: ChainParams) -> Self {
        let chain = ActiveChain::new(params.genesis.clone());
        InMemoryChainState {
            params,
            chain: RwLock::new(chain),
            mempool: None,
        }
    }

    /// Prune `mempool` of transactions confirmed by connected blocks.
    pub fn with_mempool(mut self, mempool: Arc<dyn Mempool>) -> Self {
        self.mempool = Some(mempool);
        self
    }

    /// Snapshot of the active tip.
    pub fn tip(&self) -> ChainTip {
        *self.read_tip()
    }

    pub fn height(&self) -> u32 {
        self.read_tip().height
    }

    /// The active-chain block at `height`, if any.
    pub fn block_at(&self, height: u32) -> Option<Block> {
        self.chain.read().blocks.get(height as usize).cloned()
    }

    #[cfg(test)]
    pub(crate) fn is_locked(&self) -> bool {
        self.chain.is_locked()
    }

    /// Height of the active-chain block with `hash`, if any.
    pub fn height_of(&self, hash: &Hash256) -> Option<u32> {
        self.chain.read().heights.get(hash).copied()
    }

    fn check_block(&self, block: &Block, chain: &ActiveChain) -> Result<(), BlockRejection> {
        let tip = &chain.tip;
        let header = &block.header;
        let consensus = &self.params.consensus;

        if header.prev_block_hash != tip.hash {
            return Err(BlockRejection::PrevBlockNotTip(hash_to_display_hex(
                &header.prev_block_hash,
            )));
        }

        let required = self.next_work_required(tip);
        if header.bits != required {
            return Err(BlockRejection::BadDifficultyBits {
                got: header.bits,
                required,
            });
        }

        match check_proof_of_work(&header.pow_hash(), header.bits, consensus) {
            Ok(true) => {}
            Ok(false) => return Err(BlockRejection::HighHash),
            Err(e) => return Err(BlockRejection::InvalidTarget(e)),
        }

        let (root, mutated) = block_merkle_root_checked(block);
        if root != header.merkle_root {
            return Err(BlockRejection::BadMerkleRoot);
        }
        if mutated {
            return Err(BlockRejection::MutatedMerkle);
        }

        let coinbase = match block.transactions.first() {
            Some(tx) if tx.is_coinbase() => tx,
            _ => return Err(BlockRejection::MissingCoinbase),
        };
        if block.transactions[1..].iter().any(|tx| tx.is_coinbase()) {
            return Err(BlockRejection::MultipleCoinbase);
        }

        let mut seen = HashSet::new();
        for tx in &block.transactions[1..] {
            let txid = tx.txid();
            if chain.confirmed.contains(&txid) || !seen.insert(txid) {
                return Err(BlockRejection::DuplicateTransaction(hash_to_display_hex(&txid)));
            }
        }

        let height = tip.height + 1;
        let commitment = ScriptBuilder::new().push_int(i64::from(height)).into_bytes();
        if !coinbase.inputs[0].script_sig.starts_with(&commitment) {
            return Err(BlockRejection::BadCoinbaseHeight(height));
        }

        let limit = block_subsidy(height, consensus);
        let value = coinbase.total_output_value().unwrap_or(u64::MAX);
        if value > limit {
            return Err(BlockRejection::CoinbaseValueTooHigh { value, limit });
        }

        if header.timestamp <= tip.median_time_past {
            return Err(BlockRejection::TimeTooOld {
                time: header.timestamp,
                median_time_past: tip.median_time_past,
            });
        }

        Ok(())
    }
}

impl ChainState for InMemoryChainState {
    fn params(&self) -> &ChainParams {
        &self.params
    }

    fn read_tip(&self) -> MappedRwLockReadGuard<'_, ChainTip> {
        RwLockReadGuard::map(self.chain.read(), |chain| &chain.tip)
    }

    /// Difficulty never retargets: every block carries its parent's bits.
    fn next_work_required(&self, tip: &ChainTip) -> u32 {
        tip.bits
    }

    fn process_new_block(&self, block: &Block, force_processing: bool) -> Result<(), BlockRejection> {
        let hash = block.hash();
        {
            let mut chain = self.chain.write();

            if chain.heights.contains_key(&hash) {
                debug!(hash = %hash_to_display_hex(&hash), "block already known");
                return Ok(());
            }

            if let Err(reason) = self.check_block(block, &chain) {
                warn!(hash = %hash_to_display_hex(&hash), %reason, "rejected block");
                return Err(reason);
            }

            chain.connect(block.clone(), hash);
            debug!(
                hash = %hash_to_display_hex(&hash),
                height = chain.tip.height,
                force_processing,
                "connected block"
            );
        }

        if let Some(mempool) = &self.mempool {
            let removed = mempool.remove_for_block(block);
            debug!(removed, "pruned confirmed transactions from pool");
        }
        Ok(())
    }
}
