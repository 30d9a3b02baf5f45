//! Mining on top of a live node.
//!
//! [`prepare_block`] asks the node's assembler for a template and finalizes
//! its header against the current tip, [`mine_block`] solves and submits it,
//! and [`generate_to_address`] does both for a payout address.

use forge_core::merkle::block_merkle_root;
use forge_core::{
    decode_destination, hash_to_display_hex, script_for_destination, Block, OutPoint, TxIn,
};
use tracing::{debug, info};

use crate::error::MiningError;
use crate::node::NodeContext;
use crate::pow::solve_header;

/// Build a block template paying to `coinbase_script`, ready to be solved.
///
/// The timestamp is forced to one second past the tip's median time past and
/// the merkle root is recomputed over whatever the assembler returned. Both
/// happen while the chain state's tip is read-locked, and fail with
/// [`MiningError::StaleTemplate`] if the tip is no longer the template's
/// parent.
pub fn prepare_block(node: &NodeContext, coinbase_script: &[u8]) -> Result<Block, MiningError> {
    let chainstate = node.require_chainstate()?;
    let mempool = node.require_mempool()?;

    let template = node
        .assembler
        .create_new_block(chainstate, mempool, coinbase_script)?;
    let mut block = template.block;

    {
        let tip = chainstate.read_tip();
        if tip.hash != block.header.prev_block_hash {
            return Err(MiningError::StaleTemplate {
                template_parent: hash_to_display_hex(&block.header.prev_block_hash),
                tip: hash_to_display_hex(&tip.hash),
            });
        }
        block.header.timestamp = tip
            .median_time_past
            .checked_add(1)
            .ok_or(MiningError::TimestampOverflow {
                height: template.height,
            })?;
        block.header.merkle_root = block_merkle_root(&block);
    }

    debug!(
        height = template.height,
        timestamp = block.header.timestamp,
        tx_count = block.transactions.len(),
        "prepared block"
    );
    Ok(block)
}

/// Mine one block paying to `coinbase_script` and submit it.
///
/// Returns an input spending the coinbase's first output. Any rejection by
/// the chain state is fatal.
pub fn mine_block(node: &NodeContext, coinbase_script: &[u8]) -> Result<TxIn, MiningError> {
    let mut block = prepare_block(node, coinbase_script)?;
    let chainstate = node.require_chainstate()?;

    solve_header(&mut block.header, &chainstate.params().consensus)?;

    let hash = hash_to_display_hex(&block.hash());
    chainstate
        .process_new_block(&block, true)
        .map_err(|reason| MiningError::BlockRejected {
            hash: hash.clone(),
            reason,
        })?;

    let coinbase = block
        .transactions
        .first()
        .ok_or_else(|| MiningError::MissingCoinbase { hash: hash.clone() })?;
    info!(%hash, nonce = block.header.nonce, "mined block");

    Ok(TxIn::new(OutPoint::new(coinbase.txid(), 0)))
}

/// Mine one block paying to `address` on the node's network.
///
/// The address is decoded before anything else is touched, so a bad address
/// never reaches the assembler.
pub fn generate_to_address(node: &NodeContext, address: &str) -> Result<TxIn, MiningError> {
    let network = node.require_chainstate()?.params().network;
    let destination = decode_destination(address, network)?;
    let coinbase_script = script_for_destination(&destination);
    debug!(address, kind = destination.name(), "mining to address");
    mine_block(node, &coinbase_script)
}
