// Blockchain module
//
// Core ledger types:
// - Transaction structure and signature binding
// - Block structure and proof of work
// - Blockchain structure, validation and balance queries
// - Key handling (wallets, addresses, signatures)

pub mod block;
pub mod chain;
pub mod crypto;
pub mod transaction;

// Re-export main components for easier access
pub use block::{Block, BlockError};
pub use chain::{Blockchain, BlockchainError};
pub use crypto::{Address, CryptoError, DigitalSignature, Wallet};
pub use transaction::{Transaction, TransactionError};
