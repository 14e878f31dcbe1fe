use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use mini_ledger::blockchain::{Address, Blockchain, Transaction, Wallet};
use mini_ledger::config::ChainConfig;

#[derive(Parser)]
#[command(name = "mini_ledger")]
#[command(about = "Single-node proof-of-work ledger")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the proof of work difficulty
    #[arg(short, long)]
    difficulty: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new keypair
    Keygen,

    /// Sign, submit and mine a transfer, then tamper with the result
    Demo {
        /// Hex encoded private key of the sender (random if omitted)
        #[arg(short, long)]
        key: Option<String>,

        /// Recipient address (random if omitted)
        #[arg(short, long)]
        to: Option<String>,

        /// Amount to transfer
        #[arg(short, long, default_value_t = 10.0)]
        amount: f64,

        /// Print the resulting chain as JSON
        #[arg(long)]
        json: bool,
    },
}

fn keygen() {
    let wallet = Wallet::new();

    println!();
    println!("Private Key: {}", hex::encode(wallet.export_secret_key()));
    println!();
    println!("Public Key: {}", wallet.address());
}

fn demo(config: &ChainConfig, key: Option<String>, to: Option<String>, amount: f64, json: bool) -> Result<()> {
    let wallet = match key {
        Some(key) => Wallet::from_secret_hex(&key).context("invalid private key")?,
        None => Wallet::new(),
    };
    let recipient: Address = match to {
        Some(to) => to.parse().context("invalid recipient address")?,
        None => Wallet::new().address().clone(),
    };

    let mut ledger = Blockchain::with_config(config)?;

    let mut transfer = Transaction::new(wallet.address().clone(), recipient.clone(), amount);
    transfer.sign(&wallet)?;
    ledger.add_transaction(transfer)?;

    info!("Starting to mine with difficulty {}", ledger.difficulty());
    ledger.mine_pending_transactions(wallet.address())?;

    println!("Balance of {} is {}", wallet.address(), ledger.get_balance_of_address(wallet.address()));
    println!("Balance of {} is {}", recipient, ledger.get_balance_of_address(&recipient));
    println!("Is the chain valid? {}", ledger.is_chain_valid());

    if json {
        println!("{}", serde_json::to_string_pretty(ledger.chain())?);
    }

    if let Some(transaction) = ledger.block_mut(1).and_then(|block| block.transactions.first_mut()) {
        transaction.amount = 1.0;
    }
    println!("After tampering, is the chain valid? {}", ledger.is_chain_valid());

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ChainConfig::from_env();
    if let Some(difficulty) = cli.difficulty {
        config.difficulty = difficulty;
    }

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(config.log_level.as_str()));

    match cli.command {
        Commands::Keygen => keygen(),
        Commands::Demo { key, to, amount, json } => demo(&config, key, to, amount, json)?,
    }

    Ok(())
}
