use log::warn;
use serde::{Deserialize, Serialize};

use crate::blockchain::block::MAX_DIFFICULTY;

use std::env;
use std::str::FromStr;

/// Default number of leading zero hex digits a block hash needs
pub const DEFAULT_DIFFICULTY: usize = 3;

/// Default amount credited to the miner of each block
pub const DEFAULT_MINING_REWARD: f64 = 80.0;

/// Tunables for a [`Blockchain`](crate::blockchain::Blockchain).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Proof of work difficulty
    pub difficulty: usize,

    /// Reward paid per mined block
    pub mining_reward: f64,

    /// Log level used by the binary when `RUST_LOG` is unset
    pub log_level: String,
}

impl ChainConfig {
    pub fn new() -> Self {
        ChainConfig {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: DEFAULT_MINING_REWARD,
            log_level: "info".to_string(),
        }
    }

    pub fn with_difficulty(difficulty: usize) -> Self {
        ChainConfig {
            difficulty,
            ..ChainConfig::new()
        }
    }

    /// Load config from environment variables
    ///
    /// Environment variables:
    /// - `MINI_LEDGER_DIFFICULTY`: leading zero digits required per block
    /// - `MINI_LEDGER_MINING_REWARD`: reward per mined block
    /// - `MINI_LEDGER_LOG_LEVEL`: log level
    ///
    /// Values that fail to parse or are out of range are ignored with a
    /// warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from any variable source, with the same rules as
    /// [`ChainConfig::from_env`]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ChainConfig::new();

        if let Some(difficulty) = parse_var::<usize, _>(&lookup, "MINI_LEDGER_DIFFICULTY") {
            if difficulty <= MAX_DIFFICULTY {
                config.difficulty = difficulty;
            } else {
                warn!(
                    "Ignoring MINI_LEDGER_DIFFICULTY={}: must be at most {}",
                    difficulty, MAX_DIFFICULTY
                );
            }
        }

        if let Some(reward) = parse_var::<f64, _>(&lookup, "MINI_LEDGER_MINING_REWARD") {
            if reward.is_finite() && reward >= 0.0 {
                config.mining_reward = reward;
            } else {
                warn!("Ignoring MINI_LEDGER_MINING_REWARD={}: must be a non-negative number", reward);
            }
        }

        if let Some(level) = lookup("MINI_LEDGER_LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig::new()
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid value", name, raw);
            None
        }
    }
}
