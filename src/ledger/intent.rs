//! Transaction intents built from session state.
//!
//! # Responsibilities
//! - Pick a transfer destination from the configured pool
//! - Build and sign transfer transactions
//! - Decode service-built transaction blobs and add the account's signature

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::Rng;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
#[allow(deprecated)]
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;

use crate::ledger::types::{LedgerError, LedgerResult};

/// A transfer of a fixed amount to one destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferIntent {
    pub from: Pubkey,
    pub to: Pubkey,
    pub lamports: u64,
}

impl TransferIntent {
    /// Choose a destination uniformly from `pool`, or send to `from` when the pool is empty.
    pub fn random<R: Rng + ?Sized>(from: Pubkey, pool: &[Pubkey], lamports: u64, rng: &mut R) -> Self {
        let to = pick_destination(pool, from, rng);
        Self { from, to, lamports }
    }

    /// Build the signed transfer against `recent_blockhash`.
    pub fn into_transaction(self, payer: &Keypair, recent_blockhash: Hash) -> Transaction {
        #[allow(deprecated)]
        let ix = system_instruction::transfer(&self.from, &self.to, self.lamports);
        Transaction::new_signed_with_payer(&[ix], Some(&self.from), &[payer], recent_blockhash)
    }
}

/// Uniform choice from `pool`; the account's own address when the pool is empty.
pub fn pick_destination<R: Rng + ?Sized>(pool: &[Pubkey], own: Pubkey, rng: &mut R) -> Pubkey {
    if pool.is_empty() {
        return own;
    }
    pool[rng.gen_range(0..pool.len())]
}

/// Decode a base64 bincode transaction as returned by the reward service.
pub fn decode_transaction(blob: &str) -> LedgerResult<Transaction> {
    let bytes = BASE64
        .decode(blob.trim())
        .map_err(|e| LedgerError::Decode(format!("base64: {}", e)))?;
    bincode::deserialize(&bytes).map_err(|e| LedgerError::Decode(format!("bincode: {}", e)))
}

/// Re-sign a service-built transaction as sole signer against a fresh blockhash.
pub fn sign_fresh(mut transaction: Transaction, signer: &Keypair, recent_blockhash: Hash) -> LedgerResult<Transaction> {
    transaction
        .try_sign(&[signer], recent_blockhash)
        .map_err(|e| LedgerError::Decode(format!("signing: {}", e)))?;
    Ok(transaction)
}

/// Add the account's signature, keeping the service's blockhash and co-signatures.
pub fn sign_partial(mut transaction: Transaction, signer: &Keypair) -> LedgerResult<Transaction> {
    let blockhash = transaction.message.recent_blockhash;
    transaction
        .try_partial_sign(&[signer], blockhash)
        .map_err(|e| LedgerError::Decode(format!("partial signing: {}", e)))?;
    Ok(transaction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use solana_sdk::message::Message;
    use solana_sdk::signature::{Signature, Signer};

    #[test]
    fn test_empty_pool_sends_to_self() {
        let own = Pubkey::new_unique();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(pick_destination(&[], own, &mut rng), own);
        }
    }

    #[test]
    fn test_destination_comes_from_pool() {
        let own = Pubkey::new_unique();
        let pool = [Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique()];
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let dest = pick_destination(&pool, own, &mut rng);
            assert!(pool.contains(&dest));
            seen.insert(dest);
        }
        assert_eq!(seen.len(), pool.len());
    }

    #[test]
    fn test_transfer_transaction_is_signed() {
        let payer = Keypair::new();
        let mut rng = StdRng::seed_from_u64(1);
        let intent = TransferIntent::random(payer.pubkey(), &[], 100_000, &mut rng);
        assert_eq!(intent.to, payer.pubkey());

        let tx = intent.into_transaction(&payer, Hash::new_unique());
        assert!(tx.is_signed());
        assert_eq!(tx.message.account_keys[0], payer.pubkey());
    }

    #[test]
    fn test_decode_and_partial_sign_keeps_blockhash() {
        let user = Keypair::new();
        let service = Keypair::new();
        let blockhash = Hash::new_unique();

        #[allow(deprecated)]
        let ix = system_instruction::transfer(&user.pubkey(), &service.pubkey(), 1);
        let message = Message::new_with_blockhash(&[ix], Some(&service.pubkey()), &blockhash);
        let mut tx = Transaction {
            signatures: vec![Signature::default(); message.header.num_required_signatures as usize],
            message,
        };
        tx.partial_sign(&[&service], blockhash);

        let blob = BASE64.encode(bincode::serialize(&tx).unwrap());
        let decoded = decode_transaction(&blob).unwrap();
        let signed = sign_partial(decoded, &user).unwrap();

        assert_eq!(signed.message.recent_blockhash, blockhash);
        assert!(signed.is_signed());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_transaction("%%%"), Err(LedgerError::Decode(_))));
        let blob = BASE64.encode([1u8, 2, 3]);
        assert!(matches!(decode_transaction(&blob), Err(LedgerError::Decode(_))));
    }
}
