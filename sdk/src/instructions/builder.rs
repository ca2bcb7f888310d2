use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

use barter_escrow::AccountSlot;

/// Builder for constructing escrow instructions
pub struct EscrowInstructionBuilder {
    program_id: Pubkey,
    accounts: Vec<AccountMeta>,
    data: Vec<u8>,
}

impl EscrowInstructionBuilder {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            accounts: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Add an account with the flags its schema slot carries
    pub fn add_slot(mut self, pubkey: Pubkey, slot: &AccountSlot) -> Self {
        self.accounts.push(if slot.is_writable {
            AccountMeta::new(pubkey, slot.is_signer)
        } else {
            AccountMeta::new_readonly(pubkey, slot.is_signer)
        });
        self
    }

    /// Set the instruction data
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    /// Build the final instruction
    pub fn build(self) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: self.accounts,
            data: self.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barter_escrow::AccountRole;

    #[test]
    fn test_slot_flags_carry_over() {
        let program_id = Pubkey::new_unique();
        let signer = Pubkey::new_unique();
        let sysvar = Pubkey::new_unique();
        let slot = AccountSlot {
            role: AccountRole::Initiator,
            is_signer: true,
            is_writable: true,
        };
        let readonly = AccountSlot {
            role: AccountRole::Rent,
            is_signer: false,
            is_writable: false,
        };

        let ix = EscrowInstructionBuilder::new(program_id)
            .add_slot(signer, &slot)
            .add_slot(sysvar, &readonly)
            .with_data(vec![2])
            .build();

        assert_eq!(ix.program_id, program_id);
        assert_eq!(ix.accounts[0], AccountMeta::new(signer, true));
        assert_eq!(ix.accounts[1], AccountMeta::new_readonly(sysvar, false));
        assert_eq!(ix.data, vec![2]);
    }
}
