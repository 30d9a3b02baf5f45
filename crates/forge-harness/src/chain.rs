//! Standalone chain synthesis from genesis parameters.

use forge_core::block::VERSIONBITS_LAST_OLD_BLOCK_VERSION;
use forge_core::merkle::block_merkle_root;
use forge_core::params::block_subsidy;
use forge_core::script::p2wsh_op_true;
use forge_core::{hash_to_display_hex, Block, BlockHeader, ChainParams, CoinbaseBuilder};
use tracing::{debug, info};

use crate::error::MiningError;
use crate::pow::solve_header;

/// Build `total_height` valid blocks on top of the genesis of `params`.
///
/// Block `h` (stored at index `h - 1`) pays its full subsidy to the
/// P2WSH `OP_TRUE` script, is timestamped one second per height after
/// genesis and keeps the genesis difficulty. The result is deterministic
/// for a given `params`.
pub fn create_block_chain(total_height: usize, params: &ChainParams) -> Result<Vec<Block>, MiningError> {
    let genesis = &params.genesis.header;
    let genesis_hash = params.genesis_hash();
    let coinbase_script = p2wsh_op_true();

    let mut chain: Vec<Block> = Vec::with_capacity(total_height);
    for index in 0..total_height {
        let height = u32::try_from(index + 1).map_err(|_| MiningError::HeightOverflow)?;
        let timestamp = genesis
            .timestamp
            .checked_add(height)
            .ok_or(MiningError::TimestampOverflow { height })?;
        let prev_block_hash = match index {
            0 => genesis_hash,
            _ => chain[index - 1].hash(),
        };

        let coinbase = CoinbaseBuilder::new(height, coinbase_script.clone())
            .build(block_subsidy(height, &params.consensus));
        let header = BlockHeader::new(
            VERSIONBITS_LAST_OLD_BLOCK_VERSION,
            prev_block_hash,
            [0u8; 32],
            timestamp,
            genesis.bits,
        );
        let mut block = Block::new(header, vec![coinbase]);
        block.header.merkle_root = block_merkle_root(&block);

        let nonce = solve_header(&mut block.header, &params.consensus)?;
        debug!(height, nonce, "synthesized block");
        chain.push(block);
    }

    if let Some(tip) = chain.last() {
        info!(
            blocks = chain.len(),
            tip = %hash_to_display_hex(&tip.hash()),
            "synthesized chain"
        );
    }
    Ok(chain)
}
