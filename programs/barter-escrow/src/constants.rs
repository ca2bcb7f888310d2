//! Protocol constants for the barter escrow
//!
//! Seeds, leg limits and layout widths shared by the client and the settlement program

// PDA seed constants
pub const ESCROW_SEED: &[u8] = b"escrow"; // Custody authority for every escrowed holding

// Leg limits (per side)
pub const MAX_NFT_LEGS: usize = 3;
pub const MAX_FUNGIBLE_LEGS: usize = 1;
/// Upper bound on the leg count byte of an instruction payload
pub const MAX_LEGS_PER_SIDE: usize = MAX_NFT_LEGS + MAX_FUNGIBLE_LEGS;

/// Leg slots reserved per side in the persisted escrow record.
/// Wider than `MAX_LEGS_PER_SIDE` so the record can outlive the current leg limits.
pub const LEG_SLOTS_PER_SIDE: usize = 9;

/// Amount moved by a non-fungible leg
pub const NFT_AMOUNT: u64 = 1;

// Wire widths
pub const PUBKEY_BYTES: usize = 32;
pub const AMOUNT_BYTES: usize = 8;

// Native currency decimals (lamports per SOL = 10^9)
pub const NATIVE_DECIMALS: u8 = 9;
