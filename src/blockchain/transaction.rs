use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::crypto::{verify_signature, Address, CryptoError, DigitalSignature, Wallet};

/// Errors that can occur during transaction operations
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Cannot sign transactions for other wallets (signer {signer})")]
    Authorization { signer: Address },

    #[error("No signature in this transaction")]
    MissingSignature,

    #[error("Crypto error: {0}")]
    CryptoError(#[from] CryptoError),
}

/// A movement of value between two addresses.
///
/// A transaction without a sender is a reward minted by the chain itself
/// and needs no signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender's address, `None` for mining rewards
    pub from_address: Option<Address>,

    /// Recipient's address
    pub to_address: Option<Address>,

    /// Amount being transferred
    pub amount: f64,

    /// Signature over [`Transaction::calculate_hash`], set by [`Transaction::sign`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<DigitalSignature>,
}

impl Transaction {
    /// Creates a new unsigned transfer
    pub fn new(from_address: Address, to_address: Address, amount: f64) -> Self {
        Transaction {
            from_address: Some(from_address),
            to_address: Some(to_address),
            amount,
            signature: None,
        }
    }

    /// Creates a reward transaction with no sender
    pub fn reward(to_address: Address, amount: f64) -> Self {
        Transaction {
            from_address: None,
            to_address: Some(to_address),
            amount,
            signature: None,
        }
    }

    /// SHA-256 over sender, recipient and amount, hex encoded.
    ///
    /// Each field is prefixed with its byte length so no two field splits
    /// hash alike. The signature is not part of the digest, so signing never
    /// changes it.
    pub fn calculate_hash(&self) -> String {
        let mut hasher = Sha256::new();
        update_field(&mut hasher, self.from_address.as_ref().map_or("", Address::as_str));
        update_field(&mut hasher, self.to_address.as_ref().map_or("", Address::as_str));
        update_field(&mut hasher, &self.amount.to_string());
        hex::encode(hasher.finalize())
    }

    /// Signs the transaction with a wallet.
    ///
    /// The wallet must own the sender address; a reward transaction has no
    /// sender and therefore can never be signed.
    pub fn sign(&mut self, wallet: &Wallet) -> Result<(), TransactionError> {
        if self.from_address.as_ref() != Some(wallet.address()) {
            return Err(TransactionError::Authorization {
                signer: wallet.address().clone(),
            });
        }

        let hash = self.calculate_hash();
        self.signature = Some(wallet.sign(hash.as_bytes()));

        Ok(())
    }

    /// Checks the signature against the sender's public key.
    ///
    /// Rewards are always valid. A transfer without a signature is an error
    /// rather than `false`, so callers can tell "unsigned" from "forged".
    pub fn is_valid(&self) -> Result<bool, TransactionError> {
        let sender = match &self.from_address {
            Some(sender) => sender,
            None => return Ok(true),
        };

        let signature = match &self.signature {
            Some(sig) if !sig.is_empty() => sig,
            _ => return Err(TransactionError::MissingSignature),
        };

        let public_key = sender.to_public_key()?;
        let hash = self.calculate_hash();

        Ok(verify_signature(hash.as_bytes(), signature, &public_key)?)
    }

    pub fn is_reward(&self) -> bool {
        self.from_address.is_none()
    }
}

fn update_field(hasher: &mut Sha256, field: &str) {
    hasher.update((field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
}
