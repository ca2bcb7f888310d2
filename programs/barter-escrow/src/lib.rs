//! Wire contract of the barter escrow
//!
//! Instruction payloads, the persisted escrow record and the positional account
//! schema, shared byte-for-byte by the off-chain client and the settlement program.

pub mod accounts;
pub mod constants;
pub mod error;
pub mod instruction;
pub mod key;
pub mod manifest;
pub mod seeds;
pub mod state;

pub use accounts::{AccountRole, AccountSchema, AccountSlot};
pub use error::{EscrowError, EscrowResult, Field};
pub use instruction::{EscrowInstruction, InstructionKind};
pub use manifest::{NativeDirection, NativeLeg, Side, SwapManifest};
pub use seeds::derive_authority;
pub use state::{EscrowState, LegRecord, ESCROW_STATE_LEN};

// Brings `EscrowState::LEN` and `EscrowState::unpack` into scope for callers
pub use solana_program::program_pack::{IsInitialized, Pack};
