use chrono::{TimeZone, Utc};
use log::{debug, info, warn};
use thiserror::Error;

use super::block::{Block, BlockError, MAX_DIFFICULTY};
use super::crypto::Address;
use super::transaction::{Transaction, TransactionError};
use crate::config::ChainConfig;

/// Creation time of the genesis block, 2022-01-01T00:00:00Z
const GENESIS_TIMESTAMP_MILLIS: i64 = 1_640_995_200_000;

/// Previous-hash sentinel carried by the genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Errors that can occur during blockchain operations
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Transaction error: {0}")]
    TransactionError(#[from] TransactionError),

    #[error("Block error: {0}")]
    BlockError(#[from] BlockError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Chain has no blocks")]
    EmptyChain,
}

/// An in-memory, single-writer chain of proof-of-work blocks.
///
/// Mutation goes through `&mut self`, so sharing one across threads needs an
/// outer lock around the whole value.
#[derive(Debug, Clone)]
pub struct Blockchain {
    /// The chain of blocks, genesis first
    chain: Vec<Block>,

    /// Transactions waiting for the next block
    pending_transactions: Vec<Transaction>,

    /// Mining difficulty (number of leading zeros required in hash)
    difficulty: usize,

    /// Mining reward
    mining_reward: f64,
}

impl Blockchain {
    /// Creates a new blockchain with default settings
    pub fn new() -> Self {
        let config = ChainConfig::default();
        Self::from_parts(config.difficulty, config.mining_reward)
    }

    /// Creates a new blockchain holding only the genesis block.
    ///
    /// Fails if the difficulty can never be met or the reward is negative
    /// or not finite.
    pub fn with_config(config: &ChainConfig) -> Result<Self, BlockchainError> {
        if config.difficulty > MAX_DIFFICULTY {
            return Err(BlockchainError::InvalidConfig(format!(
                "difficulty {} exceeds the maximum of {}",
                config.difficulty, MAX_DIFFICULTY
            )));
        }

        if !config.mining_reward.is_finite() || config.mining_reward < 0.0 {
            return Err(BlockchainError::InvalidConfig(format!(
                "mining reward must be a non-negative number: {}",
                config.mining_reward
            )));
        }

        Ok(Self::from_parts(config.difficulty, config.mining_reward))
    }

    fn from_parts(difficulty: usize, mining_reward: f64) -> Self {
        Blockchain {
            chain: vec![Self::create_genesis_block()],
            pending_transactions: Vec::new(),
            difficulty,
            mining_reward,
        }
    }

    /// The fixed first block. It is never mined and holds no transactions.
    pub fn create_genesis_block() -> Block {
        let timestamp = Utc
            .timestamp_millis_opt(GENESIS_TIMESTAMP_MILLIS)
            .single()
            .unwrap_or_default();

        Block::new(timestamp, Vec::new(), GENESIS_PREVIOUS_HASH.to_string())
    }

    pub fn get_latest_block(&self) -> Result<&Block, BlockchainError> {
        self.chain.last().ok_or(BlockchainError::EmptyChain)
    }

    /// Queues a signed transfer for the next block.
    ///
    /// Only the signature is checked; balances are not, so a sender may go
    /// negative. An unsigned transfer surfaces as
    /// [`TransactionError::MissingSignature`]; every other defect, including
    /// an undecodable sender or signature, is an `InvalidTransaction`.
    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<(), BlockchainError> {
        if transaction.from_address.is_none() || transaction.to_address.is_none() {
            return Err(BlockchainError::InvalidTransaction(
                "Transaction must include from and to address".to_string(),
            ));
        }

        if !transaction.amount.is_finite() || transaction.amount < 0.0 {
            return Err(BlockchainError::InvalidTransaction(format!(
                "Amount must be a non-negative number: {}",
                transaction.amount
            )));
        }

        let valid = match transaction.is_valid() {
            Ok(valid) => valid,
            Err(TransactionError::CryptoError(err)) => {
                warn!("Rejected transaction {}: {}", transaction.calculate_hash(), err);
                return Err(BlockchainError::InvalidTransaction(err.to_string()));
            }
            Err(err) => return Err(err.into()),
        };

        if !valid {
            warn!("Rejected transaction {}: bad signature", transaction.calculate_hash());
            return Err(BlockchainError::InvalidTransaction(
                "Cannot add invalid transactions to chain".to_string(),
            ));
        }

        debug!("Accepted transaction {}", transaction.calculate_hash());
        self.pending_transactions.push(transaction);

        Ok(())
    }

    /// Seals every pending transaction plus a reward into a new block.
    ///
    /// On success the pool is reseeded with a fresh reward for
    /// `reward_address`, which will be paid out by the following block. On
    /// failure neither the chain nor the pool is changed.
    pub fn mine_pending_transactions(&mut self, reward_address: &Address) -> Result<&Block, BlockchainError> {
        let previous_hash = self.get_latest_block()?.hash.clone();

        let mut transactions = self.pending_transactions.clone();
        transactions.push(Transaction::reward(reward_address.clone(), self.mining_reward));

        let mut block = Block::new(Utc::now(), transactions, previous_hash);
        block.mine(self.difficulty)?;

        info!(
            "Block {} appended with {} transactions",
            self.chain.len(),
            block.transactions.len()
        );

        self.chain.push(block);
        self.pending_transactions = vec![Transaction::reward(reward_address.clone(), self.mining_reward)];

        self.get_latest_block()
    }

    /// Sum of everything received minus everything sent by `address`,
    /// over every block in chain order. Pending transactions are ignored.
    pub fn get_balance_of_address(&self, address: &Address) -> f64 {
        let mut balance = 0.0;

        for block in &self.chain {
            for transaction in &block.transactions {
                if transaction.from_address.as_ref() == Some(address) {
                    balance -= transaction.amount;
                }

                if transaction.to_address.as_ref() == Some(address) {
                    balance += transaction.amount;
                }
            }
        }

        balance
    }

    /// Validates every block after genesis: its transactions, its stored
    /// hash and its link to the predecessor. Stops at the first failure.
    pub fn is_chain_valid(&self) -> bool {
        for (index, pair) in self.chain.windows(2).enumerate() {
            let (previous_block, current_block) = (&pair[0], &pair[1]);
            let height = index + 1;

            if !current_block.has_valid_transactions() {
                warn!("Block {} has invalid transactions", height);
                return false;
            }

            if current_block.hash != current_block.calculate_hash() {
                warn!("Block {} hash does not match its contents", height);
                return false;
            }

            if current_block.previous_hash != previous_block.hash {
                warn!("Block {} does not link to block {}", height, index);
                return false;
            }
        }

        true
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    /// Mutable access to a stored block. Edits are not re-mined, so they
    /// show up in [`Blockchain::is_chain_valid`].
    pub fn block_mut(&mut self, index: usize) -> Option<&mut Block> {
        self.chain.get_mut(index)
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending_transactions
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn mining_reward(&self) -> f64 {
        self.mining_reward
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}
