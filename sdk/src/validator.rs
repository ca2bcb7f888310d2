//! Pre-flight checks run before a transaction is assembled
//!
//! Nothing here mutates the ledger. Any failure stops the flow before submission.

use barter_escrow::{
    derive_authority, AccountRole, EscrowError, EscrowState, Field, InstructionKind, Side,
};
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info};

use crate::{
    client::Ledger,
    error::{SdkError, SdkResult},
    terms::SwapTerms,
};

pub struct TermsValidator<'a, L: Ledger + ?Sized> {
    ledger: &'a L,
    authority: Pubkey,
}

impl<'a, L: Ledger + ?Sized> TermsValidator<'a, L> {
    pub fn new(ledger: &'a L, program_id: &Pubkey) -> Self {
        let (authority, _) = derive_authority(program_id);
        Self { ledger, authority }
    }

    /// Custody authority derived from the program id
    pub fn authority(&self) -> Pubkey {
        self.authority
    }

    /// Run every check `kind` requires against live ledger state
    pub async fn validate(&self, kind: InstructionKind, terms: &SwapTerms) -> SdkResult<()> {
        terms.check()?;
        match kind {
            InstructionKind::Initialize => self.check_initialize(terms).await?,
            InstructionKind::Exchange | InstructionKind::Cancel => {
                self.check_settlement(kind, terms).await?
            }
        }
        info!("Pre-flight checks passed for {:?}", kind);
        Ok(())
    }

    async fn check_initialize(&self, terms: &SwapTerms) -> SdkResult<()> {
        // Initialize writes into a pre-allocated, record-sized account; it never creates one
        let data = self
            .ledger
            .account_data(&terms.escrow)
            .await?
            .ok_or(SdkError::AccountNotFound(terms.escrow))?;
        if EscrowState::decode(&data)?.is_active() {
            return Err(EscrowError::EscrowAlreadyActive.into());
        }

        for (leg, (holdings, amount)) in terms.initiator_side.legs().iter().enumerate() {
            let role = AccountRole::InitiatorHolding {
                side: Side::Initiator,
                leg,
            };
            self.check_holding(role, &holdings.initiator, *amount, None)
                .await?;

            // Custody is handed from the escrow signer to the derived authority
            let role = AccountRole::Custody { leg };
            let custody = holdings.custody.ok_or_else(|| SdkError::MissingAccountReference {
                role,
                detail: "initiator legs are moved through custody".into(),
            })?;
            self.check_holding(role, &custody, 0, Some(terms.escrow))
                .await?;
        }

        self.check_native(
            AccountRole::Initiator,
            &terms.initiator,
            terms.native.owed_by(Side::Initiator),
        )
        .await
    }

    async fn check_settlement(&self, kind: InstructionKind, terms: &SwapTerms) -> SdkResult<()> {
        let data = self
            .ledger
            .account_data(&terms.escrow)
            .await?
            .ok_or(SdkError::AccountNotFound(terms.escrow))?;
        let record = EscrowState::unpack_active(&data)?;

        if record.authority() != &self.authority {
            return Err(SdkError::AuthorityMismatch {
                field: Field::Account(AccountRole::Authority),
                expected: self.authority,
                found: *record.authority(),
            });
        }

        let expected = terms.expected_record(self.authority)?;
        if let Some(field) = record.first_mismatch(&expected) {
            return Err(SdkError::TermsMismatch { field });
        }
        debug!("Escrow record {} matches the submitted terms", terms.escrow);

        for (leg, recorded) in record.legs(Side::Initiator).iter().enumerate() {
            let role = AccountRole::Custody { leg };
            let custody = recorded.custody.ok_or_else(|| SdkError::MissingAccountReference {
                role,
                detail: "escrow record has no custody holding".into(),
            })?;
            self.check_holding(role, &custody, recorded.amount, Some(self.authority))
                .await?;
        }

        // Lamports owed by the initiator were parked on the escrow account at Initialize
        self.check_native(
            AccountRole::EscrowState,
            &terms.escrow,
            terms.native.owed_by(Side::Initiator),
        )
        .await?;

        if kind == InstructionKind::Exchange {
            for (leg, (holdings, amount)) in terms.counterparty_side.legs().iter().enumerate() {
                let role = AccountRole::CounterpartyHolding {
                    side: Side::Counterparty,
                    leg,
                };
                self.check_holding(role, &holdings.counterparty, *amount, None)
                    .await?;
            }
            self.check_native(
                AccountRole::Counterparty,
                &terms.counterparty,
                terms.native.owed_by(Side::Counterparty),
            )
            .await?;
        }
        Ok(())
    }

    async fn check_holding(
        &self,
        role: AccountRole,
        account: &Pubkey,
        required: u64,
        expected_owner: Option<Pubkey>,
    ) -> SdkResult<()> {
        let holding = self.ledger.holding(account).await?;
        if let Some(expected) = expected_owner {
            if holding.owner != expected {
                return Err(SdkError::AuthorityMismatch {
                    field: Field::Account(role),
                    expected,
                    found: holding.owner,
                });
            }
        }
        if holding.amount < required {
            return Err(SdkError::InsufficientFunds {
                role,
                account: *account,
                required,
                available: holding.amount,
            });
        }
        debug!("{} {} holds {} (needs {})", role, account, holding.amount, required);
        Ok(())
    }

    async fn check_native(
        &self,
        role: AccountRole,
        account: &Pubkey,
        required: u64,
    ) -> SdkResult<()> {
        if required == 0 {
            return Ok(());
        }
        let available = self.ledger.lamports(account).await?;
        if available < required {
            return Err(SdkError::InsufficientFunds {
                role,
                account: *account,
                required,
                available,
            });
        }
        Ok(())
    }
}
