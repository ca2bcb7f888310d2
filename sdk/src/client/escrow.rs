use barter_escrow::InstructionKind;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    transaction::Transaction,
};
use tracing::info;

use super::{Ledger, SubmitOptions};
use crate::{
    error::SdkResult, instructions::TransactionAssembler, terms::SwapTerms,
    validator::TermsValidator,
};

/// One-shot escrow flows: validate, assemble, sign, submit
pub struct EscrowClient<L: Ledger> {
    ledger: L,
    assembler: TransactionAssembler,
    options: SubmitOptions,
}

impl<L: Ledger> EscrowClient<L> {
    pub fn new(ledger: L, program_id: Pubkey, options: SubmitOptions) -> Self {
        Self {
            ledger,
            assembler: TransactionAssembler::new(program_id),
            options,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn assembler(&self) -> &TransactionAssembler {
        &self.assembler
    }

    pub fn validator(&self) -> TermsValidator<'_, L> {
        TermsValidator::new(&self.ledger, &self.assembler.program_id())
    }

    /// Run pre-flight checks and build the signed transaction without submitting it
    pub async fn prepare(
        &self,
        kind: InstructionKind,
        terms: &SwapTerms,
        signers: &[&Keypair],
    ) -> SdkResult<Transaction> {
        self.validator().validate(kind, terms).await?;
        let blockhash = self.ledger.latest_blockhash().await?;
        self.assembler.assemble(kind, terms, signers, blockhash)
    }

    /// Validate, assemble and submit
    pub async fn execute(
        &self,
        kind: InstructionKind,
        terms: &SwapTerms,
        signers: &[&Keypair],
    ) -> SdkResult<Signature> {
        let tx = self.prepare(kind, terms, signers).await?;
        info!("Sending {:?} transaction for escrow {}", kind, terms.escrow);
        self.ledger.submit(&tx, self.options).await
    }

    /// Open the escrow; signed by the initiator and the escrow state account
    pub async fn initialize(
        &self,
        terms: &SwapTerms,
        initiator: &Keypair,
        escrow: &Keypair,
    ) -> SdkResult<Signature> {
        self.execute(InstructionKind::Initialize, terms, &[initiator, escrow])
            .await
    }

    /// Complete the swap; signed by the counterparty
    pub async fn exchange(
        &self,
        terms: &SwapTerms,
        counterparty: &Keypair,
    ) -> SdkResult<Signature> {
        self.execute(InstructionKind::Exchange, terms, &[counterparty])
            .await
    }

    /// Refund the initiator; signed by the initiator
    pub async fn cancel(&self, terms: &SwapTerms, initiator: &Keypair) -> SdkResult<Signature> {
        self.execute(InstructionKind::Cancel, terms, &[initiator])
            .await
    }
}
