//! Transaction assembly
//!
//! Accounts are placed by walking the `AccountSchema` for the instruction, so the
//! order the settlement program indexes into comes from one place.

use barter_escrow::{
    derive_authority, AccountRole, AccountSchema, EscrowInstruction, InstructionKind,
};
use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
    system_program, sysvar,
    transaction::Transaction,
};
use tracing::debug;

use super::builder::EscrowInstructionBuilder;
use crate::{
    error::{SdkError, SdkResult},
    terms::SwapTerms,
};

/// Builds single-instruction escrow transactions for one program deployment
#[derive(Debug, Clone)]
pub struct TransactionAssembler {
    program_id: Pubkey,
    authority: Pubkey,
}

impl TransactionAssembler {
    pub fn new(program_id: Pubkey) -> Self {
        let (authority, _) = derive_authority(&program_id);
        Self {
            program_id,
            authority,
        }
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    /// Custody authority derived for this deployment
    pub fn authority(&self) -> Pubkey {
        self.authority
    }

    /// Resolve the account filling `role`
    pub fn resolve(&self, role: AccountRole, terms: &SwapTerms) -> SdkResult<Pubkey> {
        let resolved = match role {
            AccountRole::Rent => Some(sysvar::rent::id()),
            AccountRole::TokenProgram => Some(spl_token::id()),
            AccountRole::SystemProgram => Some(system_program::id()),
            AccountRole::Authority => Some(self.authority),
            role => terms.account(role),
        };
        resolved.ok_or_else(|| SdkError::MissingAccountReference {
            role,
            detail: "not present in the swap terms".into(),
        })
    }

    /// Build the escrow instruction for `kind`
    pub fn instruction(&self, kind: InstructionKind, terms: &SwapTerms) -> SdkResult<Instruction> {
        let payload = EscrowInstruction::new(kind, terms.manifest()?);
        let schema = AccountSchema::for_payload(&payload);

        let mut builder = EscrowInstructionBuilder::new(self.program_id);
        for slot in schema.slots() {
            builder = builder.add_slot(self.resolve(slot.role, terms)?, slot);
        }
        let data = payload.pack();
        debug!("{:?} payload ({} bytes): {:?}", kind, data.len(), data);

        let ix = builder.with_data(data).build();
        for (position, (slot, meta)) in schema.slots().iter().zip(&ix.accounts).enumerate() {
            debug!("  [{}] {} {}", position, slot.role, meta.pubkey);
        }
        Ok(ix)
    }

    /// Build and sign the transaction for `kind`.
    ///
    /// `signers` must hold a keypair for every signer role of the instruction; the
    /// first signer role pays the fee.
    pub fn assemble(
        &self,
        kind: InstructionKind,
        terms: &SwapTerms,
        signers: &[&Keypair],
        recent_blockhash: Hash,
    ) -> SdkResult<Transaction> {
        let ix = self.instruction(kind, terms)?;
        let schema = AccountSchema::for_instruction(
            kind,
            terms.initiator_side.leg_count(),
            terms.counterparty_side.leg_count(),
        )?;

        let mut ordered: Vec<&Keypair> = Vec::new();
        for role in schema.signers() {
            let pubkey = self.resolve(role, terms)?;
            let keypair = signers
                .iter()
                .copied()
                .find(|keypair| keypair.pubkey() == pubkey)
                .ok_or(SdkError::MissingSigner { role, pubkey })?;
            ordered.push(keypair);
        }
        let payer = ordered
            .first()
            .map(|keypair| keypair.pubkey())
            .ok_or_else(|| SdkError::Configuration(format!("{kind:?} has no signer")))?;

        let mut tx = Transaction::new_with_payer(&[ix], Some(&payer));
        tx.try_sign(&ordered, recent_blockhash)?;
        Ok(tx)
    }
}
