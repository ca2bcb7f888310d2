/// Barter escrow SDK
///
/// Client side of the two-party barter escrow:
/// - Swap terms resolved from configuration and the key store
/// - Pre-flight validation against live ledger state
/// - Transaction assembly in the account order the settlement program expects
/// - Submission through a pluggable ledger transport
pub mod client;
pub mod config;
pub mod error;
pub mod instructions;
pub mod keystore;
pub mod terms;
pub mod testing;
pub mod utils;
pub mod validator;

pub use client::{EscrowClient, HoldingAccount, Ledger, RpcLedger, SubmitOptions};
pub use config::ClientConfig;
pub use error::{SdkError, SdkResult};
pub use instructions::{EscrowInstructionBuilder, TransactionAssembler};
pub use keystore::{FileKeyStore, KeyStore};
pub use terms::{FungibleLeg, HoldingPair, SideTerms, SwapTerms};
pub use validator::TermsValidator;

// Re-export the wire contract
pub use barter_escrow;
