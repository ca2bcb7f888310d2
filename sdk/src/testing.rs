//! Testing utilities for the barter escrow
//!
//! In-memory stand-ins for the ledger and key store, so the validator and assembler
//! can be exercised without a network.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use barter_escrow::{EscrowState, Pack, ESCROW_STATE_LEN};
use solana_sdk::{
    hash::Hash, pubkey::Pubkey, signature::Keypair, signature::Signature, signer::Signer,
    transaction::Transaction,
};

use crate::{
    client::{HoldingAccount, Ledger, SubmitOptions},
    error::{SdkError, SdkResult},
    keystore::KeyStore,
};

#[derive(Default)]
struct LedgerState {
    data: HashMap<Pubkey, Vec<u8>>,
    lamports: HashMap<Pubkey, u64>,
    holdings: HashMap<Pubkey, HoldingAccount>,
    submitted: Vec<(Transaction, SubmitOptions)>,
}

/// Ledger held in memory
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
    blockhash: Hash,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            blockhash: Hash::new_unique(),
        }
    }

    pub fn blockhash(&self) -> Hash {
        self.blockhash
    }

    pub fn set_lamports(&self, address: Pubkey, lamports: u64) {
        self.lock().lamports.insert(address, lamports);
    }

    pub fn set_holding(&self, address: Pubkey, owner: Pubkey, amount: u64) {
        self.lock()
            .holdings
            .insert(address, HoldingAccount { owner, amount });
    }

    pub fn set_account_data(&self, address: Pubkey, data: Vec<u8>) {
        self.lock().data.insert(address, data);
    }

    /// Store `state` as an escrow record at `address`
    pub fn set_escrow(&self, address: Pubkey, state: &EscrowState) {
        let mut data = vec![0u8; ESCROW_STATE_LEN];
        state.pack_into_slice(&mut data);
        self.set_account_data(address, data);
    }

    /// Transactions handed to `submit`, in order
    pub fn submitted(&self) -> Vec<Transaction> {
        self.lock()
            .submitted
            .iter()
            .map(|(tx, _)| tx.clone())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        // A poisoned lock only means another test thread panicked
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn account_data(&self, address: &Pubkey) -> SdkResult<Option<Vec<u8>>> {
        Ok(self.lock().data.get(address).cloned())
    }

    async fn lamports(&self, address: &Pubkey) -> SdkResult<u64> {
        Ok(self.lock().lamports.get(address).copied().unwrap_or(0))
    }

    async fn holding(&self, address: &Pubkey) -> SdkResult<HoldingAccount> {
        self.lock()
            .holdings
            .get(address)
            .copied()
            .ok_or(SdkError::AccountNotFound(*address))
    }

    async fn latest_blockhash(&self) -> SdkResult<Hash> {
        Ok(self.blockhash)
    }

    async fn submit(
        &self,
        transaction: &Transaction,
        options: SubmitOptions,
    ) -> SdkResult<Signature> {
        let signature = transaction.signatures.first().copied().unwrap_or_default();
        self.lock()
            .submitted
            .push((transaction.clone(), options));
        Ok(signature)
    }
}

/// Key store held in memory
#[derive(Default)]
pub struct MemoryKeyStore {
    keypairs: HashMap<String, Keypair>,
    publics: Mutex<HashMap<String, Pubkey>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fresh keypair under `name` and return its public key
    pub fn generate(&mut self, name: &str) -> Pubkey {
        let keypair = Keypair::new();
        let pubkey = keypair.pubkey();
        self.keypairs.insert(name.to_string(), keypair);
        pubkey
    }

    pub fn insert_public(&self, name: &str, key: Pubkey) {
        self.publics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.to_string(), key);
    }
}

impl KeyStore for MemoryKeyStore {
    fn load(&self, name: &str) -> SdkResult<Keypair> {
        self.keypairs
            .get(name)
            .map(|keypair| keypair.insecure_clone())
            .ok_or_else(|| SdkError::CredentialUnavailable {
                name: name.to_string(),
                reason: "no such key".into(),
            })
    }

    fn load_public(&self, name: &str) -> SdkResult<Pubkey> {
        if let Some(keypair) = self.keypairs.get(name) {
            return Ok(keypair.pubkey());
        }
        self.publics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .copied()
            .ok_or_else(|| SdkError::CredentialUnavailable {
                name: name.to_string(),
                reason: "no such key".into(),
            })
    }

    fn save_public(&self, key: &Pubkey, name: &str) -> SdkResult<()> {
        self.insert_public(name, *key);
        Ok(())
    }
}
