//! Swap manifest: the amounts both parties agreed to move

use std::fmt;

use crate::{
    constants::MAX_LEGS_PER_SIDE,
    error::{EscrowError, EscrowResult, Field},
};

/// The two parties of a swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    /// Opens the escrow and funds custody
    Initiator,
    /// Completes the swap with an Exchange
    Counterparty,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Initiator, Side::Counterparty];
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Initiator => write!(f, "initiator"),
            Side::Counterparty => write!(f, "counterparty"),
        }
    }
}

/// Direction of the native-currency leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NativeDirection {
    #[default]
    CounterpartyToInitiator,
    InitiatorToCounterparty,
}

impl NativeDirection {
    pub fn from_byte(value: u8, field: Field) -> EscrowResult<Self> {
        match value {
            0 => Ok(NativeDirection::CounterpartyToInitiator),
            1 => Ok(NativeDirection::InitiatorToCounterparty),
            value => Err(EscrowError::InvalidDirection { field, value }),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            NativeDirection::CounterpartyToInitiator => 0,
            NativeDirection::InitiatorToCounterparty => 1,
        }
    }

    /// Side the lamports leave from
    pub fn payer(self) -> Side {
        match self {
            NativeDirection::CounterpartyToInitiator => Side::Counterparty,
            NativeDirection::InitiatorToCounterparty => Side::Initiator,
        }
    }
}

/// Native-currency leg. Zero lamports means the swap has no native leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NativeLeg {
    pub direction: NativeDirection,
    pub lamports: u64,
}

impl NativeLeg {
    pub fn new(direction: NativeDirection, lamports: u64) -> Self {
        Self {
            direction,
            lamports,
        }
    }

    /// Lamports `side` must pay
    pub fn owed_by(&self, side: Side) -> u64 {
        if self.direction.payer() == side {
            self.lamports
        } else {
            0
        }
    }
}

/// Amounts of a complete swap. Each side lists its leg amounts in account order:
/// NFT legs first (amount 1), then the fungible leg.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SwapManifest {
    native: NativeLeg,
    initiator_legs: Vec<u64>,
    counterparty_legs: Vec<u64>,
}

impl SwapManifest {
    pub fn new(
        native: NativeLeg,
        initiator_legs: Vec<u64>,
        counterparty_legs: Vec<u64>,
    ) -> EscrowResult<Self> {
        check_legs(Side::Initiator, &initiator_legs)?;
        check_legs(Side::Counterparty, &counterparty_legs)?;
        Ok(Self {
            native,
            initiator_legs,
            counterparty_legs,
        })
    }

    pub fn native(&self) -> NativeLeg {
        self.native
    }

    pub fn legs(&self, side: Side) -> &[u64] {
        match side {
            Side::Initiator => &self.initiator_legs,
            Side::Counterparty => &self.counterparty_legs,
        }
    }

    pub fn leg_count(&self, side: Side) -> usize {
        self.legs(side).len()
    }
}

/// Every counted leg must move something, and a side holds at most `MAX_LEGS_PER_SIDE` legs
pub(crate) fn check_legs(side: Side, legs: &[u64]) -> EscrowResult<()> {
    if legs.len() > MAX_LEGS_PER_SIDE {
        return Err(EscrowError::TooManyLegs {
            side,
            count: legs.len(),
            max: MAX_LEGS_PER_SIDE,
        });
    }
    let actual = legs.iter().filter(|amount| **amount != 0).count();
    if actual != legs.len() {
        return Err(EscrowError::LegCountMismatch {
            side,
            declared: legs.len(),
            actual,
        });
    }
    Ok(())
}
