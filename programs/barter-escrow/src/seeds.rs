//! PDA derivation helpers
//!
//! The custody authority is the only program-derived address of the protocol.

use solana_program::pubkey::Pubkey;

use crate::constants::ESCROW_SEED;

/// Derive the custody authority that owns every escrowed holding
pub fn derive_authority(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[ESCROW_SEED], program_id)
}

/// Signer seeds for `invoke_signed` on behalf of the custody authority
pub fn authority_signer_seeds(bump: &[u8; 1]) -> [&[u8]; 2] {
    [ESCROW_SEED, bump]
}
