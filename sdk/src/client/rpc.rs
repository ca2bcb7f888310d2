use std::sync::Arc;

use async_trait::async_trait;
use solana_client::{nonblocking::rpc_client::RpcClient, rpc_config::RpcSendTransactionConfig};
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};
use spl_token::{solana_program::program_pack::Pack, state::Account as TokenAccount};
use tracing::{debug, info};

use super::{HoldingAccount, Ledger, SubmitOptions};
use crate::{
    config::NetworkConfig,
    error::{SdkError, SdkResult},
};

/// Ledger backed by a JSON-RPC endpoint
pub struct RpcLedger {
    rpc: Arc<RpcClient>,
    commitment: CommitmentConfig,
}

impl RpcLedger {
    pub fn new(rpc: Arc<RpcClient>, commitment: CommitmentConfig) -> Self {
        Self { rpc, commitment }
    }

    pub fn from_config(network: &NetworkConfig) -> SdkResult<Self> {
        let commitment = network.commitment_config()?;
        let rpc = RpcClient::new_with_commitment(network.rpc_url.clone(), commitment);
        Ok(Self::new(Arc::new(rpc), commitment))
    }

}

#[async_trait]
impl Ledger for RpcLedger {
    async fn account_data(&self, address: &Pubkey) -> SdkResult<Option<Vec<u8>>> {
        let account = self
            .rpc
            .get_account_with_commitment(address, self.commitment)
            .await?
            .value;
        Ok(account.map(|account| account.data))
    }

    async fn lamports(&self, address: &Pubkey) -> SdkResult<u64> {
        Ok(self
            .rpc
            .get_balance_with_commitment(address, self.commitment)
            .await?
            .value)
    }

    async fn holding(&self, address: &Pubkey) -> SdkResult<HoldingAccount> {
        let data = self
            .account_data(address)
            .await?
            .ok_or(SdkError::AccountNotFound(*address))?;
        let account = TokenAccount::unpack(&data).map_err(|e| SdkError::InvalidAccountData {
            account: *address,
            reason: e.to_string(),
        })?;
        Ok(HoldingAccount {
            owner: account.owner,
            amount: account.amount,
        })
    }

    async fn latest_blockhash(&self) -> SdkResult<Hash> {
        Ok(self.rpc.get_latest_blockhash().await?)
    }

    async fn submit(
        &self,
        transaction: &Transaction,
        options: SubmitOptions,
    ) -> SdkResult<Signature> {
        let config = RpcSendTransactionConfig {
            skip_preflight: options.skip_preflight,
            preflight_commitment: Some(options.preflight_commitment),
            ..Default::default()
        };
        debug!(
            "Sending transaction to {} (skip_preflight: {})",
            self.rpc.url(),
            options.skip_preflight
        );
        let signature = self
            .rpc
            .send_and_confirm_transaction_with_spinner_and_config(
                transaction,
                self.commitment,
                config,
            )
            .await?;
        info!("Transaction confirmed: {}", signature);
        Ok(signature)
    }
}
