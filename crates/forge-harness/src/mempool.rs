//! A minimal pending-transaction pool.

use forge_core::{hash_to_display_hex, Block, Hash256, Transaction};
use parking_lot::Mutex;
use tracing::debug;

use crate::node::Mempool;

/// Why a transaction was refused by [`TxMempool::add`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MempoolError {
    #[error("transaction {0} is already in the pool")]
    Duplicate(String),
    #[error("coinbase transactions cannot enter the pool")]
    Coinbase,
}

/// Insertion-ordered pool of transactions waiting for a block.
///
/// No policy, fee or script checks are made.
#[derive(Debug, Default)]
pub struct TxMempool {
    entries: Mutex<Vec<Transaction>>,
}

impl TxMempool {
    pub fn new() -> Self {
        TxMempool::default()
    }

    /// Queue `tx` and return its txid.
    pub fn add(&self, tx: Transaction) -> Result<Hash256, MempoolError> {
        if tx.is_coinbase() {
            return Err(MempoolError::Coinbase);
        }
        let txid = tx.txid();
        let mut entries = self.entries.lock();
        if entries.iter().any(|entry| entry.txid() == txid) {
            return Err(MempoolError::Duplicate(hash_to_display_hex(&txid)));
        }
        entries.push(tx);
        debug!(txid = %hash_to_display_hex(&txid), pool_size = entries.len(), "added transaction");
        Ok(txid)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Mempool for TxMempool {
    fn transactions(&self) -> Vec<Transaction> {
        self.entries.lock().clone()
    }

    fn remove_for_block(&self, block: &Block) -> usize {
        let confirmed = block.txids();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|tx| !confirmed.contains(&tx.txid()));
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_core::script::p2wsh_op_true;
    use forge_core::{BlockHeader, CoinbaseBuilder, OutPoint, TxIn, TxOut};

    fn spend(txid_byte: u8) -> Transaction {
        Transaction {
            version: 2,
            inputs: vec![TxIn::new(OutPoint::new([txid_byte; 32], 0))],
            outputs: vec![TxOut {
                value: 1_000,
                script_pubkey: p2wsh_op_true(),
            }],
            lock_time: 0,
        }
    }

    #[test]
    fn test_add_keeps_insertion_order() {
        let pool = TxMempool::new();
        assert!(pool.is_empty());

        let first = pool.add(spend(1)).unwrap();
        let second = pool.add(spend(2)).unwrap();

        let txids: Vec<_> = pool.transactions().iter().map(Transaction::txid).collect();
        assert_eq!(txids, vec![first, second]);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_add_rejects_duplicate_and_coinbase() {
        let pool = TxMempool::new();
        pool.add(spend(1)).unwrap();

        assert!(matches!(pool.add(spend(1)), Err(MempoolError::Duplicate(_))));
        assert_eq!(
            pool.add(CoinbaseBuilder::new(1, p2wsh_op_true()).build(50)),
            Err(MempoolError::Coinbase)
        );
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_remove_for_block() {
        let pool = TxMempool::new();
        pool.add(spend(1)).unwrap();
        pool.add(spend(2)).unwrap();

        let coinbase = CoinbaseBuilder::new(1, p2wsh_op_true()).build(50);
        let block = Block::new(
            BlockHeader::new(4, [0; 32], [0; 32], 0, 0x207fffff),
            vec![coinbase, spend(2)],
        );

        assert_eq!(pool.remove_for_block(&block), 1);
        assert_eq!(pool.transactions(), vec![spend(1)]);
    }
}
