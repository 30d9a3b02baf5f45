//! Transactions, their legacy serialization, and coinbase construction.
//!
//! The coinbase transaction is the first transaction in a block. It has a
//! single input spending the null outpoint and creates the block reward.

use crate::hash::{double_sha256, Hash256};
use crate::script::coinbase_script_sig;

/// Default transaction version for newly built transactions.
pub const TX_VERSION: i32 = 2;

/// Sequence number marking an input as final.
pub const SEQUENCE_FINAL: u32 = 0xFFFF_FFFF;

/// Reference to an output of a previous transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutPoint {
    pub txid: Hash256,
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: Hash256, vout: u32) -> Self {
        OutPoint { txid, vout }
    }

    /// The outpoint spent by coinbase inputs.
    pub fn null() -> Self {
        OutPoint {
            txid: [0u8; 32],
            vout: u32::MAX,
        }
    }

    pub fn is_null(&self) -> bool {
        self.txid == [0u8; 32] && self.vout == u32::MAX
    }
}

/// A transaction input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxIn {
    pub previous_output: OutPoint,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
}

impl TxIn {
    /// An unsigned, final input spending `previous_output`.
    pub fn new(previous_output: OutPoint) -> Self {
        TxIn {
            previous_output,
            script_sig: Vec::new(),
            sequence: SEQUENCE_FINAL,
        }
    }
}

/// A transaction output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOut {
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}

/// A transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
}

impl Transaction {
    /// Whether this is a coinbase: exactly one input, spending the null outpoint.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].previous_output.is_null()
    }

    /// Sum of all output values, `None` on overflow.
    pub fn total_output_value(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |total, output| total.checked_add(output.value))
    }

    /// Serialize without witness data (the form hashed for the txid).
    pub fn serialize(&self) -> Vec<u8> {
        let mut raw_tx = Vec::with_capacity(128);

        // Version (4 bytes, little-endian)
        raw_tx.extend_from_slice(&self.version.to_le_bytes());

        encode_varint(self.inputs.len() as u64, &mut raw_tx);
        for input in &self.inputs {
            raw_tx.extend_from_slice(&input.previous_output.txid);
            raw_tx.extend_from_slice(&input.previous_output.vout.to_le_bytes());
            encode_varint(input.script_sig.len() as u64, &mut raw_tx);
            raw_tx.extend_from_slice(&input.script_sig);
            raw_tx.extend_from_slice(&input.sequence.to_le_bytes());
        }

        encode_varint(self.outputs.len() as u64, &mut raw_tx);
        for output in &self.outputs {
            raw_tx.extend_from_slice(&output.value.to_le_bytes());
            encode_varint(output.script_pubkey.len() as u64, &mut raw_tx);
            raw_tx.extend_from_slice(&output.script_pubkey);
        }

        raw_tx.extend_from_slice(&self.lock_time.to_le_bytes());

        raw_tx
    }

    /// Transaction ID (double SHA256 of the legacy serialization).
    pub fn txid(&self) -> Hash256 {
        double_sha256(&self.serialize())
    }
}

/// Builder for coinbase transactions.
#[derive(Debug, Clone)]
pub struct CoinbaseBuilder {
    /// The block height, committed to in the scriptSig (BIP34).
    block_height: u32,
    /// Script receiving the block reward.
    script_pubkey: Vec<u8>,
    /// Overrides the default `<height> OP_0` scriptSig.
    script_sig: Option<Vec<u8>>,
    version: i32,
}

impl CoinbaseBuilder {
    pub fn new(block_height: u32, script_pubkey: Vec<u8>) -> Self {
        CoinbaseBuilder {
            block_height,
            script_pubkey,
            script_sig: None,
            version: TX_VERSION,
        }
    }

    /// Use a custom scriptSig instead of the height commitment.
    pub fn with_script_sig(mut self, script_sig: Vec<u8>) -> Self {
        self.script_sig = Some(script_sig);
        self
    }

    pub fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    /// Build the coinbase paying `reward` in a single output.
    pub fn build(self, reward: u64) -> Transaction {
        let script_sig = self
            .script_sig
            .unwrap_or_else(|| coinbase_script_sig(self.block_height));

        Transaction {
            version: self.version,
            inputs: vec![TxIn {
                previous_output: OutPoint::null(),
                script_sig,
                sequence: SEQUENCE_FINAL,
            }],
            outputs: vec![TxOut {
                value: reward,
                script_pubkey: self.script_pubkey,
            }],
            lock_time: 0,
        }
    }
}

/// Encode a variable-length integer (Bitcoin varint).
pub fn encode_varint(value: u64, output: &mut Vec<u8>) {
    if value < 0xfd {
        output.push(value as u8);
    } else if value <= 0xffff {
        output.push(0xfd);
        output.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xffffffff {
        output.push(0xfe);
        output.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        output.push(0xff);
        output.extend_from_slice(&value.to_le_bytes());
    }
}
