use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::transaction::Transaction;

/// Hex digits in a SHA-256 digest; no difficulty above this can be met
pub const MAX_DIFFICULTY: usize = 64;

/// Errors that can occur while sealing a block
#[derive(Debug, Error)]
pub enum BlockError {
    #[error("Mining cancelled after {attempts} attempts")]
    MiningCancelled { attempts: u64 },

    #[error("Mining failed: exhausted nonce range without finding valid hash")]
    NonceExhausted,

    #[error("Difficulty {difficulty} exceeds the maximum of {max}", max = MAX_DIFFICULTY)]
    DifficultyTooHigh { difficulty: usize },
}

/// An ordered batch of transactions sealed by proof of work.
///
/// `hash` is computed at construction and again after every nonce change,
/// so it always equals [`Block::calculate_hash`] unless a field was edited
/// directly afterwards. Once [`Block::mine`] returns `Ok`, `hash` also starts
/// with `difficulty` zero digits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Timestamp when the block was created
    pub timestamp: DateTime<Utc>,

    /// Transactions in the order they were submitted
    pub transactions: Vec<Transaction>,

    /// Hash of the previous block
    pub previous_hash: String,

    /// Hash of the current block
    pub hash: String,

    /// Proof of work search variable
    pub nonce: u64,
}

impl Block {
    /// Creates a new unsealed block with nonce 0
    pub fn new(timestamp: DateTime<Utc>, transactions: Vec<Transaction>, previous_hash: String) -> Self {
        let mut block = Block {
            timestamp,
            transactions,
            previous_hash,
            hash: String::new(),
            nonce: 0,
        };

        block.hash = block.calculate_hash();
        block
    }

    /// Calculates the SHA-256 hash of the block as a hexadecimal string.
    ///
    /// Each transaction contributes its own digest followed by its signature,
    /// so reordering, editing or re-signing any of them changes the result.
    pub fn calculate_hash(&self) -> String {
        let mut hasher = Sha256::new();

        hasher.update(self.previous_hash.as_bytes());
        hasher.update(self.timestamp.timestamp_millis().to_string());

        for transaction in &self.transactions {
            hasher.update(transaction.calculate_hash());
            if let Some(signature) = &transaction.signature {
                hasher.update(signature.0.as_bytes());
            }
        }

        hasher.update(self.nonce.to_string());

        hex::encode(hasher.finalize())
    }

    /// Whether the stored hash starts with `difficulty` zero digits
    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        hash_meets_difficulty(&self.hash, difficulty)
    }

    /// Searches nonces from the current one upwards until the hash meets
    /// `difficulty`. Blocks the calling thread.
    pub fn mine(&mut self, difficulty: usize) -> Result<(), BlockError> {
        self.mine_until(difficulty, |_| true)
    }

    /// Like [`Block::mine`], but asks `keep_going` before every attempt.
    ///
    /// `keep_going` receives the number of attempts made so far; returning
    /// `false` stops the search with [`BlockError::MiningCancelled`], leaving
    /// the block with a consistent but unsealed nonce/hash pair. A difficulty
    /// above [`MAX_DIFFICULTY`] is rejected before any attempt is made.
    pub fn mine_until<F>(&mut self, difficulty: usize, mut keep_going: F) -> Result<(), BlockError>
    where
        F: FnMut(u64) -> bool,
    {
        if difficulty > MAX_DIFFICULTY {
            return Err(BlockError::DifficultyTooHigh { difficulty });
        }

        let mut attempts: u64 = 0;

        while !self.meets_difficulty(difficulty) {
            if !keep_going(attempts) {
                warn!("Mining cancelled at nonce {} after {} attempts", self.nonce, attempts);
                return Err(BlockError::MiningCancelled { attempts });
            }

            self.nonce = self.nonce.checked_add(1).ok_or(BlockError::NonceExhausted)?;
            self.hash = self.calculate_hash();
            attempts += 1;
        }

        debug!("Found nonce {} after {} attempts", self.nonce, attempts);
        info!("Block mined: {}", self.hash);
        Ok(())
    }

    /// True iff every transaction verifies. Stops at the first failure.
    ///
    /// An unsigned transfer or an undecodable sender counts as invalid here.
    pub fn has_valid_transactions(&self) -> bool {
        self.transactions.iter().all(|transaction| match transaction.is_valid() {
            Ok(valid) => valid,
            Err(err) => {
                warn!("Transaction {} failed validation: {}", transaction.calculate_hash(), err);
                false
            }
        })
    }
}

fn hash_meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}
