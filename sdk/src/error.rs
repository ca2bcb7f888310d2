//! SDK error types

use barter_escrow::{AccountRole, EscrowError, Field};
use solana_sdk::{pubkey::Pubkey, signer::SignerError};
use thiserror::Error;

/// SDK error type
#[derive(Error, Debug)]
pub enum SdkError {
    /// Wire contract violation detected locally
    #[error(transparent)]
    Escrow(#[from] EscrowError),

    /// Recorded or live authority differs from the derived custody authority
    #[error("Authority mismatch at {field}: derived {expected}, found {found}")]
    AuthorityMismatch {
        field: Field,
        expected: Pubkey,
        found: Pubkey,
    },

    /// Holding or lamport balance below what a leg moves
    #[error("Insufficient funds in {role} ({account}): requires {required}, available {available}")]
    InsufficientFunds {
        role: AccountRole,
        account: Pubkey,
        required: u64,
        available: u64,
    },

    /// An account the instruction needs could not be resolved
    #[error("Missing account reference for {role}: {detail}")]
    MissingAccountReference { role: AccountRole, detail: String },

    /// A required signer was not supplied
    #[error("Missing signer for {role} ({pubkey})")]
    MissingSigner { role: AccountRole, pubkey: Pubkey },

    /// Key material absent or malformed
    #[error("Credential unavailable for {name}: {reason}")]
    CredentialUnavailable { name: String, reason: String },

    /// The escrow record disagrees with the terms being submitted
    #[error("Escrow record does not match the submitted terms at {field}")]
    TermsMismatch { field: Field },

    /// Account not found
    #[error("Account not found: {0}")]
    AccountNotFound(Pubkey),

    /// Account data could not be interpreted
    #[error("Failed to deserialize account {account}: {reason}")]
    InvalidAccountData { account: Pubkey, reason: String },

    /// Invalid configuration or terms
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Signing failed
    #[error("Failed to sign transaction: {0}")]
    Signing(#[from] SignerError),

    /// Transport error, passed through unchanged
    #[error("RPC error: {0}")]
    Rpc(#[from] solana_client::client_error::ClientError),
}

pub type SdkResult<T> = Result<T, SdkError>;
