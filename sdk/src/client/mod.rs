//! Ledger access and the escrow client

mod escrow;
mod rpc;

pub use escrow::EscrowClient;
pub use rpc::RpcLedger;

use async_trait::async_trait;
use solana_sdk::{
    commitment_config::CommitmentLevel, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};

use crate::error::SdkResult;

/// Token holding state relevant to pre-flight checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldingAccount {
    pub owner: Pubkey,
    pub amount: u64,
}

/// Options forwarded to the transport on submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOptions {
    pub skip_preflight: bool,
    pub preflight_commitment: CommitmentLevel,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            skip_preflight: false,
            preflight_commitment: CommitmentLevel::Confirmed,
        }
    }
}

/// Read and submit access to the ledger network.
///
/// Implementations surface transport failures as-is; nothing here retries.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Raw account data, `None` when the account does not exist
    async fn account_data(&self, address: &Pubkey) -> SdkResult<Option<Vec<u8>>>;

    async fn lamports(&self, address: &Pubkey) -> SdkResult<u64>;

    /// Decoded token holding; missing accounts are `AccountNotFound`
    async fn holding(&self, address: &Pubkey) -> SdkResult<HoldingAccount>;

    async fn latest_blockhash(&self) -> SdkResult<Hash>;

    /// Submit a signed transaction and wait for confirmation
    async fn submit(&self, transaction: &Transaction, options: SubmitOptions)
        -> SdkResult<Signature>;
}
