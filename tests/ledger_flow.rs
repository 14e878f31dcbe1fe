use mini_ledger::blockchain::{Blockchain, BlockchainError, Transaction, TransactionError, Wallet};
use mini_ledger::config::ChainConfig;

fn ledger(difficulty: usize) -> Blockchain {
    Blockchain::with_config(&ChainConfig::with_difficulty(difficulty)).unwrap()
}

/// Sign a transfer, mine it, and check balances and validity
#[test]
fn test_end_to_end_transfer() {
    let mut chain = ledger(2);
    let signer = Wallet::new();
    let recipient = Wallet::new();

    let mut transfer = Transaction::new(signer.address().clone(), recipient.address().clone(), 10.0);
    transfer.sign(&signer).unwrap();
    assert!(transfer.is_valid().unwrap());

    chain.add_transaction(transfer).unwrap();
    chain.mine_pending_transactions(signer.address()).unwrap();

    assert_eq!(chain.chain().len(), 2);
    assert!(chain.chain()[1].hash.starts_with("00"));
    assert_eq!(
        chain.get_balance_of_address(signer.address()),
        chain.mining_reward() - 10.0
    );
    assert_eq!(chain.get_balance_of_address(recipient.address()), 10.0);
    assert!(chain.is_chain_valid());
}

/// Editing a mined transaction is caught on re-validation
#[test]
fn test_tampering_is_detected() {
    let mut chain = ledger(2);
    let signer = Wallet::new();
    let recipient = Wallet::new();

    let mut transfer = Transaction::new(signer.address().clone(), recipient.address().clone(), 10.0);
    transfer.sign(&signer).unwrap();
    chain.add_transaction(transfer).unwrap();
    chain.mine_pending_transactions(signer.address()).unwrap();
    assert!(chain.is_chain_valid());

    chain.block_mut(1).unwrap().transactions[0].amount = 1.0;
    assert!(!chain.is_chain_valid());
}

/// Blocks link by hash across several rounds
#[test]
fn test_multiple_rounds_stay_linked() {
    let mut chain = ledger(1);
    let alice = Wallet::new();
    let bob = Wallet::new();
    let miner = Wallet::new();

    for round in 0..3 {
        let mut transfer = Transaction::new(alice.address().clone(), bob.address().clone(), 5.0);
        transfer.sign(&alice).unwrap();
        chain.add_transaction(transfer).unwrap();
        chain.mine_pending_transactions(miner.address()).unwrap();
        assert_eq!(chain.chain().len(), round + 2);
    }

    let blocks = chain.chain();
    for pair in blocks.windows(2) {
        assert_eq!(pair[1].previous_hash, pair[0].hash);
    }

    assert_eq!(chain.get_balance_of_address(alice.address()), -15.0);
    assert_eq!(chain.get_balance_of_address(bob.address()), 15.0);
    // 80 in block 1, then 160 in each later block (carried reward plus new one)
    assert_eq!(chain.get_balance_of_address(miner.address()), 400.0);
    assert!(chain.is_chain_valid());
}

/// Failed submissions leave the pool untouched
#[test]
fn test_rejected_submissions_do_not_mutate() {
    let mut chain = ledger(1);
    let signer = Wallet::new();
    let intruder = Wallet::new();

    let mut transfer = Transaction::new(signer.address().clone(), intruder.address().clone(), 10.0);
    assert!(matches!(
        transfer.sign(&intruder),
        Err(TransactionError::Authorization { .. })
    ));

    assert!(matches!(
        chain.add_transaction(transfer),
        Err(BlockchainError::TransactionError(TransactionError::MissingSignature))
    ));
    assert!(chain.pending_transactions().is_empty());
    assert_eq!(chain.chain().len(), 1);
}
