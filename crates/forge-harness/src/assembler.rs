//! Default block assembly: coinbase plus pool transactions in pool order.

use std::time::{SystemTime, UNIX_EPOCH};

use forge_core::block::VERSIONBITS_TOP_BITS;
use forge_core::merkle::block_merkle_root;
use forge_core::params::block_subsidy;
use forge_core::{Block, BlockHeader, CoinbaseBuilder};
use tracing::debug;

use crate::error::AssemblerError;
use crate::node::{BlockAssembler, BlockTemplate, ChainState, Mempool};

/// Default cap on pool transactions per block.
pub const DEFAULT_MAX_TRANSACTIONS: usize = 1_000;

/// Assembles the next block from the tip and the pool without any fee
/// policy.
#[derive(Debug, Clone)]
pub struct DefaultBlockAssembler {
    max_transactions: usize,
}

impl DefaultBlockAssembler {
    pub fn new() -> Self {
        DefaultBlockAssembler {
            max_transactions: DEFAULT_MAX_TRANSACTIONS,
        }
    }

    /// Include at most `max` pool transactions besides the coinbase.
    pub fn with_max_transactions(mut self, max: usize) -> Self {
        self.max_transactions = max;
        self
    }
}

impl Default for DefaultBlockAssembler {
    fn default() -> Self {
        DefaultBlockAssembler::new()
    }
}

impl BlockAssembler for DefaultBlockAssembler {
    fn create_new_block(
        &self,
        chainstate: &dyn ChainState,
        mempool: &dyn Mempool,
        coinbase_script: &[u8],
    ) -> Result<BlockTemplate, AssemblerError> {
        let (prev_hash, height, timestamp, bits) = {
            let tip = chainstate.read_tip();
            let height = tip.height.checked_add(1).ok_or(AssemblerError::HeightOverflow)?;
            let timestamp = tip.median_time_past.saturating_add(1).max(current_timestamp());
            (tip.hash, height, timestamp, chainstate.next_work_required(&tip))
        };

        let reward = block_subsidy(height, &chainstate.params().consensus);
        let coinbase = CoinbaseBuilder::new(height, coinbase_script.to_vec()).build(reward);

        let mut transactions = vec![coinbase];
        transactions.extend(
            mempool
                .transactions()
                .into_iter()
                .filter(|tx| !tx.is_coinbase())
                .take(self.max_transactions),
        );

        let header = BlockHeader::new(VERSIONBITS_TOP_BITS, prev_hash, [0u8; 32], timestamp, bits);
        let mut block = Block::new(header, transactions);
        block.header.merkle_root = block_merkle_root(&block);

        debug!(
            height,
            tx_count = block.transactions.len(),
            "assembled block template"
        );
        Ok(BlockTemplate { block, height })
    }
}

/// Get the current Unix timestamp.
fn current_timestamp() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_core::script::{coinbase_script_sig, p2wsh_op_true};
    use forge_core::{ChainParams, Network, OutPoint, Transaction, TxIn, TxOut};

    use crate::chainstate::InMemoryChainState;
    use crate::mempool::TxMempool;

    fn spend(txid_byte: u8) -> Transaction {
        Transaction {
            version: 2,
            inputs: vec![TxIn::new(OutPoint::new([txid_byte; 32], 0))],
            outputs: vec![TxOut {
                value: 500,
                script_pubkey: vec![0x51],
            }],
            lock_time: 0,
        }
    }

    #[test]
    fn test_template_builds_on_tip() {
        let chainstate = InMemoryChainState::new(ChainParams::for_network(Network::Regtest));
        let pool = TxMempool::new();
        let tip = chainstate.tip();

        let template = DefaultBlockAssembler::new()
            .create_new_block(&chainstate, &pool, &p2wsh_op_true())
            .unwrap();
        let header = template.block.header;

        assert_eq!(template.height, 1);
        assert_eq!(header.version, VERSIONBITS_TOP_BITS);
        assert_eq!(header.prev_block_hash, tip.hash);
        assert_eq!(header.bits, tip.bits);
        assert!(header.timestamp > tip.median_time_past);
        assert_eq!(header.merkle_root, block_merkle_root(&template.block));

        let coinbase = &template.block.transactions[0];
        assert_eq!(coinbase.inputs[0].script_sig, coinbase_script_sig(1));
        assert_eq!(coinbase.outputs[0].value, 50 * forge_core::network::COIN);
        assert_eq!(coinbase.outputs[0].script_pubkey, p2wsh_op_true());
    }

    #[test]
    fn test_template_takes_pool_in_order_up_to_max() {
        let chainstate = InMemoryChainState::new(ChainParams::for_network(Network::Regtest));
        let pool = TxMempool::new();
        for byte in 1..=3 {
            pool.add(spend(byte)).unwrap();
        }

        let template = DefaultBlockAssembler::new()
            .with_max_transactions(2)
            .create_new_block(&chainstate, &pool, &[0x51])
            .unwrap();

        assert_eq!(template.block.transactions.len(), 3);
        assert_eq!(template.block.transactions[1], spend(1));
        assert_eq!(template.block.transactions[2], spend(2));
    }
}
