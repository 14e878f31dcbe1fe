//! A minimal single-node proof-of-work ledger.
//!
//! Transactions are signed by the sender's [`Wallet`](blockchain::Wallet),
//! queued on a [`Blockchain`](blockchain::Blockchain), and sealed into
//! hash-linked blocks whose integrity can be re-verified at any time.

pub mod blockchain;
pub mod config;

pub use blockchain::{Address, Block, Blockchain, Transaction, Wallet};
pub use config::ChainConfig;
