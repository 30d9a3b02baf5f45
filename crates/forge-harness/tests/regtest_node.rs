//! Drives a regtest node end to end through the public API.

use std::sync::Arc;

use forge_core::hash::hash_from_display_hex;
use forge_core::script::p2wsh_op_true;
use forge_core::{ChainParams, Network, Transaction, TxOut};
use forge_harness::{
    create_block_chain, generate_to_address, mine_block, BlockRejection, ChainState,
    InMemoryChainState, MiningError, NodeContext, TxMempool,
};

const OP_TRUE_ADDRESS: &str = "bcrt1qft5p2uhsdcdc3l2ua4ap5qqfg4pjaqlp250x7us7a8qqhrxrxfsqseac85";

const REGTEST_GENESIS: &str = "0f9188f13cb7b2c71f2a335e3a4fc328bf5beb436012afca590b1a11466e2206";

fn node(params: ChainParams) -> (Arc<InMemoryChainState>, Arc<TxMempool>, NodeContext) {
    let mempool = Arc::new(TxMempool::new());
    let chainstate = Arc::new(InMemoryChainState::new(params).with_mempool(mempool.clone()));
    let context = NodeContext::new(chainstate.clone(), mempool.clone());
    (chainstate, mempool, context)
}

#[test]
fn synthesized_chain_is_accepted_by_node() {
    let params = ChainParams::for_network(Network::Regtest);
    assert_eq!(Some(params.genesis_hash()), hash_from_display_hex(REGTEST_GENESIS));

    let chain = create_block_chain(20, &params).unwrap();
    let (chainstate, _, _) = node(params);

    for block in &chain {
        chainstate.process_new_block(block, false).unwrap();
    }

    assert_eq!(chainstate.height(), 20);
    assert_eq!(chainstate.tip().hash, chain[19].hash());
}

#[test]
fn mined_coinbase_can_be_spent() -> Result<(), MiningError> {
    let params = ChainParams::for_network(Network::Regtest);
    let chain = create_block_chain(3, &params)?;
    let (chainstate, mempool, context) = node(params);
    for block in &chain {
        chainstate.process_new_block(block, true).unwrap();
    }

    let input = generate_to_address(&context, OP_TRUE_ADDRESS)?;
    let mined = chainstate.block_at(4).unwrap();
    assert_eq!(input.previous_output.txid, mined.transactions[0].txid());
    assert_eq!(input.previous_output.vout, 0);
    assert_eq!(mined.transactions[0].outputs[0].script_pubkey, p2wsh_op_true());

    let spend = Transaction {
        version: 2,
        inputs: vec![input],
        outputs: vec![TxOut {
            value: mined.transactions[0].outputs[0].value - 1_000,
            script_pubkey: p2wsh_op_true(),
        }],
        lock_time: 0,
    };
    let spend_txid = mempool.add(spend.clone()).unwrap();

    mine_block(&context, &p2wsh_op_true())?;
    let next = chainstate.block_at(5).unwrap();
    assert_eq!(next.txids()[1], spend_txid);
    assert!(mempool.is_empty());

    mine_block(&context, &p2wsh_op_true())?;
    assert_eq!(chainstate.block_at(6).unwrap().transactions.len(), 1);

    // The node refuses the spend once it is confirmed
    mempool.add(spend).unwrap();
    let err = mine_block(&context, &p2wsh_op_true()).unwrap_err();
    assert!(matches!(
        err,
        MiningError::BlockRejected {
            reason: BlockRejection::DuplicateTransaction(_),
            ..
        }
    ));
    assert_eq!(chainstate.height(), 6);
    Ok(())
}

#[test]
fn mining_keeps_pace_with_median_time() -> Result<(), MiningError> {
    let params = ChainParams::from_json(
        r#"{ "network": "regtest", "genesis": { "time": 1231006505 } }"#,
    )
    .unwrap();
    let (chainstate, _, context) = node(params);

    for _ in 0..15 {
        mine_block(&context, &p2wsh_op_true())?;
    }

    assert_eq!(chainstate.height(), 15);
    for height in 1..=15 {
        let block = chainstate.block_at(height).unwrap();
        assert!(block.header.timestamp > 1231006505);
        assert_eq!(block.header.nonce % 2, 1);
    }
    Ok(())
}
