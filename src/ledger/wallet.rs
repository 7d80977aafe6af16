//! Wallet management and challenge signing.
//!
//! # Security
//! - Private keys are never logged or serialized
//! - `Debug` prints the address only

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};

use crate::ledger::types::{LedgerError, LedgerResult};

/// Output of signing a service challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeSignature {
    /// Base58 address the service knows the account by.
    pub address: String,
    /// Base64 of the raw 32-byte public key.
    pub encoded_public_key: String,
    /// Base64 of the 64-byte ed25519 signature.
    pub signature: String,
}

/// A decoded account keypair.
pub struct Wallet {
    keypair: Keypair,
}

impl Wallet {
    /// Decode a base58 secret key (64-byte keypair encoding).
    pub fn from_base58(private_key: &str) -> LedgerResult<Self> {
        let bytes = bs58::decode(private_key.trim())
            .into_vec()
            .map_err(|e| LedgerError::InvalidCredential(format!("invalid base58: {}", e)))?;

        let keypair = Keypair::try_from(bytes.as_slice())
            .map_err(|e| LedgerError::InvalidCredential(format!("invalid keypair bytes: {}", e)))?;

        Ok(Self { keypair })
    }

    /// The wallet's public address.
    pub fn address(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// Underlying signer for transaction signing.
    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// Sign a challenge string issued by the reward service.
    pub fn sign_challenge(&self, challenge: &[u8]) -> ChallengeSignature {
        let signature = self.keypair.sign_message(challenge);
        ChallengeSignature {
            address: self.address().to_string(),
            encoded_public_key: BASE64.encode(self.address().to_bytes()),
            signature: BASE64.encode(signature.as_ref()),
        }
    }
}

/// Sign `challenge` with a base58 private key in one step.
pub fn sign_challenge(private_key: &str, challenge: &[u8]) -> LedgerResult<ChallengeSignature> {
    Ok(Wallet::from_base58(private_key)?.sign_challenge(challenge))
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet").field("address", &self.address()).finish()
    }
}
