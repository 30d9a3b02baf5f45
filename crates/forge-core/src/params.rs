//! Chain and consensus parameters, genesis blocks, and the subsidy schedule.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::block::{Block, BlockHeader};
use crate::difficulty::{target_for_bits, PowError};
use crate::hash::Hash256;
use crate::merkle::block_merkle_root;
use crate::network::Network;
use crate::script::{encode_script_num, ScriptBuilder, OP_CHECKSIG};
use crate::transaction::CoinbaseBuilder;

/// Errors loading chain parameters.
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("invalid chain config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("genesis bits {bits:#010x} unusable: {source}")]
    GenesisBits { bits: u32, source: PowError },
}

/// Consensus rules consumed by the harness.
///
/// Difficulty is fixed: every block carries its parent's bits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsensusParams {
    /// Blocks between subsidy halvings.
    pub subsidy_halving_interval: u32,
    /// Subsidy of the first era, in base units.
    pub initial_subsidy: u64,
    /// Easiest allowed target, in compact form.
    pub pow_limit_bits: u32,
}

/// Header fields and reward used to build a genesis block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    pub time: u32,
    pub nonce: u32,
    pub bits: u32,
    pub version: i32,
    pub reward: u64,
}

/// Optional overrides of a network's genesis fields, as read from config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenesisOverrides {
    pub time: Option<u32>,
    pub nonce: Option<u32>,
    pub bits: Option<u32>,
    pub version: Option<i32>,
    pub reward: Option<u64>,
}

impl GenesisOverrides {
    fn apply(&self, base: GenesisConfig) -> GenesisConfig {
        GenesisConfig {
            time: self.time.unwrap_or(base.time),
            nonce: self.nonce.unwrap_or(base.nonce),
            bits: self.bits.unwrap_or(base.bits),
            version: self.version.unwrap_or(base.version),
            reward: self.reward.unwrap_or(base.reward),
        }
    }
}

/// A chain parameter document.
///
/// ```json
/// { "network": "regtest", "genesis": { "time": 1231006505 } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    pub network: Network,
    #[serde(default)]
    pub consensus: Option<ConsensusParams>,
    #[serde(default)]
    pub genesis: GenesisOverrides,
}

/// Everything a synthesis or mining call reads about the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainParams {
    pub network: Network,
    pub consensus: ConsensusParams,
    pub genesis: Block,
}

impl ChainParams {
    /// Built-in parameters for `network`.
    pub fn for_network(network: Network) -> Self {
        ChainParams {
            network,
            consensus: network.consensus_params(),
            genesis: create_genesis_block(&network.genesis_config()),
        }
    }

    /// Replace the genesis block with one built from `config`.
    ///
    /// The genesis bits must decode to a target within the proof-of-work
    /// limit. The genesis nonce is taken as given and not checked.
    pub fn with_genesis(mut self, config: GenesisConfig) -> Result<Self, ParamsError> {
        target_for_bits(config.bits, &self.consensus).map_err(|source| {
            ParamsError::GenesisBits {
                bits: config.bits,
                source,
            }
        })?;
        self.genesis = create_genesis_block(&config);
        Ok(self)
    }

    /// Load parameters from a [`ChainConfig`] JSON document.
    pub fn from_json(json: &str) -> Result<Self, ParamsError> {
        let config: ChainConfig = serde_json::from_str(json)?;
        Self::from_config(&config)
    }

    pub fn from_config(config: &ChainConfig) -> Result<Self, ParamsError> {
        let mut params = ChainParams::for_network(config.network);
        if let Some(consensus) = &config.consensus {
            params.consensus = consensus.clone();
        }
        let genesis = config.genesis.apply(config.network.genesis_config());
        params.with_genesis(genesis)
    }

    pub fn genesis_hash(&self) -> Hash256 {
        self.genesis.hash()
    }
}

const GENESIS_MESSAGE: &str =
    "The Times 03/Jan/2009 Chancellor on brink of second bailout for banks";

const GENESIS_PUBKEY: [u8; 65] = [
    0x04, 0x67, 0x8a, 0xfd, 0xb0, 0xfe, 0x55, 0x48, 0x27, 0x19, 0x67, 0xf1, 0xa6, 0x71, 0x30, 0xb7,
    0x10, 0x5c, 0xd6, 0xa8, 0x28, 0xe0, 0x39, 0x09, 0xa6, 0x79, 0x62, 0xe0, 0xea, 0x1f, 0x61, 0xde,
    0xb6, 0x49, 0xf6, 0xbc, 0x3f, 0x4c, 0xef, 0x38, 0xc4, 0xf3, 0x55, 0x04, 0xe5, 0x1e, 0xc1, 0x12,
    0xde, 0x5c, 0x38, 0x4d, 0xf7, 0xba, 0x0b, 0x8d, 0x57, 0x8a, 0x4c, 0x70, 0x2b, 0x6b, 0xf1, 0x1d,
    0x5f,
];

/// Build a genesis block with the given header fields.
///
/// Every supported network shares the original genesis coinbase; only the
/// header fields and reward vary.
pub fn create_genesis_block(config: &GenesisConfig) -> Block {
    // The scriptSig always commits to 0x1d00ffff, whatever the genesis bits
    let script_sig = ScriptBuilder::new()
        .push_slice(&encode_script_num(486604799))
        .push_slice(&encode_script_num(4))
        .push_slice(GENESIS_MESSAGE.as_bytes())
        .into_bytes();
    let script_pubkey = ScriptBuilder::new()
        .push_slice(&GENESIS_PUBKEY)
        .push_opcode(OP_CHECKSIG)
        .into_bytes();

    let coinbase = CoinbaseBuilder::new(0, script_pubkey)
        .with_script_sig(script_sig)
        .with_version(1)
        .build(config.reward);

    let mut genesis = Block::new(
        BlockHeader::new(config.version, [0u8; 32], [0u8; 32], config.time, config.bits),
        vec![coinbase],
    );
    genesis.header.merkle_root = block_merkle_root(&genesis);
    genesis.header.nonce = config.nonce;
    genesis
}

/// Block subsidy at `height`: the initial subsidy halved once per interval.
pub fn block_subsidy(height: u32, params: &ConsensusParams) -> u64 {
    if params.subsidy_halving_interval == 0 {
        return params.initial_subsidy;
    }
    let halvings = height / params.subsidy_halving_interval;
    // Shifting by 64 or more is undefined; the subsidy is zero by then anyway
    if halvings >= 64 {
        return 0;
    }
    params.initial_subsidy >> halvings
}
