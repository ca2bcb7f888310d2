//! Account-role schema
//!
//! The settlement program reads accounts by position. The schema is the one ordered
//! list of named roles both the client and the program derive positions from.

use std::fmt;

use crate::{
    constants::MAX_LEGS_PER_SIDE,
    error::{EscrowError, EscrowResult},
    instruction::{EscrowInstruction, InstructionKind},
    manifest::Side,
};

/// Logical role of one account in an instruction's account list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountRole {
    Initiator,
    Counterparty,
    EscrowState,
    Rent,
    TokenProgram,
    Authority,
    /// Initiator-owned holding of a leg: source for initiator legs, destination for counterparty legs
    InitiatorHolding { side: Side, leg: usize },
    /// Counterparty-owned holding of a leg: destination for initiator legs, source for counterparty legs
    CounterpartyHolding { side: Side, leg: usize },
    /// Escrow-custodied holding of an initiator leg
    Custody { leg: usize },
    SystemProgram,
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountRole::Initiator => write!(f, "initiator"),
            AccountRole::Counterparty => write!(f, "counterparty"),
            AccountRole::EscrowState => write!(f, "escrow state account"),
            AccountRole::Rent => write!(f, "rent sysvar"),
            AccountRole::TokenProgram => write!(f, "token program"),
            AccountRole::Authority => write!(f, "custody authority"),
            AccountRole::InitiatorHolding { side, leg } => {
                write!(f, "initiator holding for {side} leg {leg}")
            }
            AccountRole::CounterpartyHolding { side, leg } => {
                write!(f, "counterparty holding for {side} leg {leg}")
            }
            AccountRole::Custody { leg } => write!(f, "custody holding for initiator leg {leg}"),
            AccountRole::SystemProgram => write!(f, "system program"),
        }
    }
}

/// One position in the account list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSlot {
    pub role: AccountRole,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountSlot {
    fn new(role: AccountRole, is_signer: bool, is_writable: bool) -> Self {
        Self {
            role,
            is_signer,
            is_writable,
        }
    }
}

/// Ordered account list for one instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSchema {
    kind: InstructionKind,
    slots: Vec<AccountSlot>,
}

impl AccountSchema {
    pub fn for_instruction(
        kind: InstructionKind,
        initiator_legs: usize,
        counterparty_legs: usize,
    ) -> EscrowResult<Self> {
        for (side, count) in [
            (Side::Initiator, initiator_legs),
            (Side::Counterparty, counterparty_legs),
        ] {
            if count > MAX_LEGS_PER_SIDE {
                return Err(EscrowError::TooManyLegs {
                    side,
                    count,
                    max: MAX_LEGS_PER_SIDE,
                });
            }
        }
        Ok(Self::build(kind, initiator_legs, counterparty_legs))
    }

    /// Schema matching the leg counts an instruction carries
    pub fn for_payload(instruction: &EscrowInstruction) -> Self {
        let manifest = instruction.manifest();
        // Manifest leg counts are bounded at construction
        Self::build(
            instruction.kind(),
            manifest.leg_count(Side::Initiator),
            manifest.leg_count(Side::Counterparty),
        )
    }

    fn build(kind: InstructionKind, initiator_legs: usize, counterparty_legs: usize) -> Self {
        let initiator_signs = matches!(kind, InstructionKind::Initialize | InstructionKind::Cancel);
        let counterparty_signs = kind == InstructionKind::Exchange;
        let escrow_signs = kind == InstructionKind::Initialize;

        let mut slots = Vec::with_capacity(7 + 3 * initiator_legs + 2 * counterparty_legs);
        slots.push(AccountSlot::new(AccountRole::Initiator, initiator_signs, true));
        slots.push(AccountSlot::new(
            AccountRole::Counterparty,
            counterparty_signs,
            counterparty_signs,
        ));
        slots.push(AccountSlot::new(AccountRole::EscrowState, escrow_signs, true));
        slots.push(AccountSlot::new(AccountRole::Rent, false, false));
        slots.push(AccountSlot::new(AccountRole::TokenProgram, false, false));
        slots.push(AccountSlot::new(AccountRole::Authority, false, false));

        for leg in 0..initiator_legs {
            let side = Side::Initiator;
            slots.push(AccountSlot::new(AccountRole::InitiatorHolding { side, leg }, false, true));
            slots.push(AccountSlot::new(AccountRole::CounterpartyHolding { side, leg }, false, true));
            slots.push(AccountSlot::new(AccountRole::Custody { leg }, false, true));
        }
        for leg in 0..counterparty_legs {
            let side = Side::Counterparty;
            slots.push(AccountSlot::new(AccountRole::InitiatorHolding { side, leg }, false, true));
            slots.push(AccountSlot::new(AccountRole::CounterpartyHolding { side, leg }, false, true));
        }

        // Cancel refunds by closing the escrow account, no transfer through the system program
        if kind != InstructionKind::Cancel {
            slots.push(AccountSlot::new(AccountRole::SystemProgram, false, false));
        }

        Self { kind, slots }
    }

    pub fn kind(&self) -> InstructionKind {
        self.kind
    }

    pub fn slots(&self) -> &[AccountSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn position(&self, role: AccountRole) -> Option<usize> {
        self.slots.iter().position(|slot| slot.role == role)
    }

    pub fn signers(&self) -> impl Iterator<Item = AccountRole> + '_ {
        self.slots
            .iter()
            .filter(|slot| slot.is_signer)
            .map(|slot| slot.role)
    }

    /// Settlement-side check that the supplied account list agrees with the payload's leg counts
    pub fn check_account_count(&self, provided: usize) -> EscrowResult<()> {
        if provided != self.slots.len() {
            return Err(EscrowError::AccountCountMismatch {
                expected: self.slots.len(),
                provided,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_prefix() {
        let schema = AccountSchema::for_instruction(InstructionKind::Exchange, 0, 0).unwrap();
        let roles: Vec<AccountRole> = schema.slots().iter().map(|slot| slot.role).collect();
        assert_eq!(
            roles,
            vec![
                AccountRole::Initiator,
                AccountRole::Counterparty,
                AccountRole::EscrowState,
                AccountRole::Rent,
                AccountRole::TokenProgram,
                AccountRole::Authority,
                AccountRole::SystemProgram,
            ]
        );
    }

    #[test]
    fn test_cancel_has_no_system_program() {
        let schema = AccountSchema::for_instruction(InstructionKind::Cancel, 2, 1).unwrap();
        assert_eq!(schema.len(), 6 + 2 * 3 + 2);
        assert_eq!(schema.position(AccountRole::SystemProgram), None);
    }

    #[test]
    fn test_signers_per_instruction() {
        let signers = |kind| {
            AccountSchema::for_instruction(kind, 1, 1)
                .unwrap()
                .signers()
                .collect::<Vec<_>>()
        };
        assert_eq!(
            signers(InstructionKind::Initialize),
            vec![AccountRole::Initiator, AccountRole::EscrowState]
        );
        assert_eq!(signers(InstructionKind::Exchange), vec![AccountRole::Counterparty]);
        assert_eq!(signers(InstructionKind::Cancel), vec![AccountRole::Initiator]);
    }

    #[test]
    fn test_leg_accounts_follow_side_order() {
        let schema = AccountSchema::for_instruction(InstructionKind::Initialize, 2, 1).unwrap();
        assert_eq!(schema.position(AccountRole::Custody { leg: 0 }), Some(8));
        assert_eq!(
            schema.position(AccountRole::InitiatorHolding {
                side: Side::Initiator,
                leg: 1
            }),
            Some(9)
        );
        assert_eq!(
            schema.position(AccountRole::CounterpartyHolding {
                side: Side::Counterparty,
                leg: 0
            }),
            Some(13)
        );
        assert_eq!(schema.position(AccountRole::SystemProgram), Some(14));
    }

    #[test]
    fn test_account_count_check() {
        let schema = AccountSchema::for_instruction(InstructionKind::Exchange, 1, 0).unwrap();
        assert!(schema.check_account_count(10).is_ok());
        assert_eq!(
            schema.check_account_count(9),
            Err(EscrowError::AccountCountMismatch {
                expected: 10,
                provided: 9
            })
        );
    }

    #[test]
    fn test_leg_limit() {
        assert!(matches!(
            AccountSchema::for_instruction(InstructionKind::Exchange, 0, 5),
            Err(EscrowError::TooManyLegs {
                side: Side::Counterparty,
                ..
            })
        ));
    }
}
