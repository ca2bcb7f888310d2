//! Persisted escrow record
//!
//! Fixed-width layout, little-endian:
//!
//! | offset | size    | field                                               |
//! |--------|---------|-----------------------------------------------------|
//! | 0      | 1       | initialized flag (0 settled, 1 active)              |
//! | 1      | 1       | native direction                                    |
//! | 2      | 8       | native lamports                                     |
//! | 10     | 1       | initiator leg count                                 |
//! | 11     | 1       | counterparty leg count                              |
//! | 12     | 32      | initiator                                           |
//! | 44     | 32      | counterparty                                        |
//! | 76     | 32      | custody authority                                   |
//! | 108    | 18 × 32 | initiator-owned holdings (initiator slots, then counterparty slots) |
//! | 684    | 18 × 32 | counterparty-owned holdings, same slotting          |
//! | 1260   | 9 × 32  | custody holdings of initiator legs                  |
//! | 1548   | 18 × 8  | leg amounts, same slotting                          |
//!
//! Unused slots are zero. A settled record is zero from the first byte to the last.

use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use solana_program::{
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};

use crate::{
    accounts::AccountRole,
    constants::{AMOUNT_BYTES, LEG_SLOTS_PER_SIDE, PUBKEY_BYTES},
    error::{EscrowError, EscrowResult, Field},
    key::{is_zero_key, pack_key, unpack_key},
    manifest::{NativeDirection, NativeLeg, Side, SwapManifest},
};

pub const ESCROW_STATE_LEN: usize = 1692;

// Slot tables
const LEG_SLOTS: usize = 2 * LEG_SLOTS_PER_SIDE;
const HOLDINGS_BYTES: usize = LEG_SLOTS * PUBKEY_BYTES;
const CUSTODY_BYTES: usize = LEG_SLOTS_PER_SIDE * PUBKEY_BYTES;

/// One recorded leg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegRecord {
    pub initiator_holding: Pubkey,
    pub counterparty_holding: Pubkey,
    /// Set for initiator legs only
    pub custody: Option<Pubkey>,
    pub amount: u64,
}

impl LegRecord {
    /// Leg moved out of custody at settlement
    pub fn escrowed(
        initiator_holding: Pubkey,
        counterparty_holding: Pubkey,
        custody: Pubkey,
        amount: u64,
    ) -> Self {
        Self {
            initiator_holding,
            counterparty_holding,
            custody: Some(custody),
            amount,
        }
    }

    /// Leg moved straight from the counterparty at Exchange
    pub fn direct(initiator_holding: Pubkey, counterparty_holding: Pubkey, amount: u64) -> Self {
        Self {
            initiator_holding,
            counterparty_holding,
            custody: None,
            amount,
        }
    }
}

/// Decoded escrow record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EscrowState {
    is_initialized: bool,
    native: NativeLeg,
    initiator: Pubkey,
    counterparty: Pubkey,
    authority: Pubkey,
    initiator_legs: Vec<LegRecord>,
    counterparty_legs: Vec<LegRecord>,
}

impl EscrowState {
    /// Active record for a freshly opened escrow
    pub fn new(
        initiator: Pubkey,
        counterparty: Pubkey,
        authority: Pubkey,
        native: NativeLeg,
        initiator_legs: Vec<LegRecord>,
        counterparty_legs: Vec<LegRecord>,
    ) -> EscrowResult<Self> {
        check_leg_records(Side::Initiator, &initiator_legs)?;
        check_leg_records(Side::Counterparty, &counterparty_legs)?;
        Ok(Self {
            is_initialized: true,
            native,
            initiator,
            counterparty,
            authority,
            initiator_legs,
            counterparty_legs,
        })
    }

    /// Awaiting Exchange or Cancel
    pub fn is_active(&self) -> bool {
        self.is_initialized
    }

    pub fn native(&self) -> NativeLeg {
        self.native
    }

    pub fn initiator(&self) -> &Pubkey {
        &self.initiator
    }

    pub fn counterparty(&self) -> &Pubkey {
        &self.counterparty
    }

    pub fn authority(&self) -> &Pubkey {
        &self.authority
    }

    pub fn legs(&self, side: Side) -> &[LegRecord] {
        match side {
            Side::Initiator => &self.initiator_legs,
            Side::Counterparty => &self.counterparty_legs,
        }
    }

    /// Amounts of the recorded swap as an instruction manifest
    pub fn manifest(&self) -> EscrowResult<SwapManifest> {
        let amounts = |side| -> Vec<u64> { self.legs(side).iter().map(|leg| leg.amount).collect() };
        SwapManifest::new(
            self.native,
            amounts(Side::Initiator),
            amounts(Side::Counterparty),
        )
    }

    /// First field where this record departs from `expected`.
    /// The authority is not compared; it is checked against the derived address instead.
    pub fn first_mismatch(&self, expected: &Self) -> Option<Field> {
        if self.initiator != expected.initiator {
            return Some(Field::Account(AccountRole::Initiator));
        }
        if self.counterparty != expected.counterparty {
            return Some(Field::Account(AccountRole::Counterparty));
        }
        if self.native.direction != expected.native.direction {
            return Some(Field::NativeDirection);
        }
        if self.native.lamports != expected.native.lamports {
            return Some(Field::NativeAmount);
        }
        for side in Side::ALL {
            let (ours, theirs) = (self.legs(side), expected.legs(side));
            if ours.len() != theirs.len() {
                return Some(Field::LegCount(side));
            }
            for (leg, (ours, theirs)) in ours.iter().zip(theirs).enumerate() {
                if ours.amount != theirs.amount {
                    return Some(Field::LegAmount(side, leg));
                }
                if ours.initiator_holding != theirs.initiator_holding {
                    return Some(Field::Account(AccountRole::InitiatorHolding { side, leg }));
                }
                if ours.counterparty_holding != theirs.counterparty_holding {
                    return Some(Field::Account(AccountRole::CounterpartyHolding { side, leg }));
                }
                if ours.custody != theirs.custody {
                    return Some(Field::Account(AccountRole::Custody { leg }));
                }
            }
        }
        None
    }

    /// Decode a record, active or settled
    pub fn decode(src: &[u8]) -> EscrowResult<Self> {
        if src.len() != ESCROW_STATE_LEN {
            return Err(EscrowError::MalformedRecord {
                field: Field::RecordLength,
                reason: "account size differs from the escrow record",
            });
        }
        let src = array_ref![src, 0, ESCROW_STATE_LEN];
        #[rustfmt::skip]
        let (
            flag,
            direction,
            native,
            initiator_count,
            counterparty_count,
            initiator,
            counterparty,
            authority,
            initiator_holdings,
            counterparty_holdings,
            custody,
            amounts,
        ) = array_refs![src, 1, 1, 8, 1, 1, 32, 32, 32, 576, 576, 288, 144];

        match flag[0] {
            0 => {
                if src.iter().any(|b| *b != 0) {
                    return Err(EscrowError::MalformedRecord {
                        field: Field::InitializedFlag,
                        reason: "settled record is not zero-filled",
                    });
                }
                return Ok(Self::default());
            }
            1 => {}
            value => {
                return Err(EscrowError::InvalidFlag {
                    field: Field::InitializedFlag,
                    value,
                })
            }
        }

        let direction = NativeDirection::from_byte(direction[0], Field::NativeDirection)?;
        let amounts: Vec<u64> = amounts
            .chunks_exact(AMOUNT_BYTES)
            .map(|chunk| u64::from_le_bytes(*array_ref![chunk, 0, AMOUNT_BYTES]))
            .collect();
        let tables = SlotTables {
            initiator_holdings,
            counterparty_holdings,
            custody,
            amounts: &amounts,
        };

        Ok(Self {
            is_initialized: true,
            native: NativeLeg::new(direction, u64::from_le_bytes(*native)),
            initiator: unpack_key(initiator, Field::Account(AccountRole::Initiator))?,
            counterparty: unpack_key(counterparty, Field::Account(AccountRole::Counterparty))?,
            authority: unpack_key(authority, Field::Account(AccountRole::Authority))?,
            initiator_legs: tables.decode_side(Side::Initiator, initiator_count[0])?,
            counterparty_legs: tables.decode_side(Side::Counterparty, counterparty_count[0])?,
        })
    }

    /// Decode a record that must still be awaiting Exchange or Cancel
    pub fn unpack_active(src: &[u8]) -> EscrowResult<Self> {
        let state = Self::decode(src)?;
        if !state.is_initialized {
            return Err(EscrowError::EscrowNotActive);
        }
        Ok(state)
    }

    /// Write this record over an account that holds no active escrow
    pub fn initialize_into(&self, dst: &mut [u8]) -> EscrowResult<()> {
        if Self::decode(dst)?.is_initialized {
            return Err(EscrowError::EscrowAlreadyActive);
        }
        self.pack_into_slice(dst);
        Ok(())
    }

    /// Settle an active record: every field is cleared and the flag unset.
    /// Returns the record as it stood, so the caller knows which legs to move.
    pub fn settle(dst: &mut [u8]) -> EscrowResult<Self> {
        let state = Self::unpack_active(dst)?;
        dst.fill(0);
        Ok(state)
    }
}

fn check_leg_records(side: Side, legs: &[LegRecord]) -> EscrowResult<()> {
    if legs.len() > LEG_SLOTS_PER_SIDE {
        return Err(EscrowError::TooManyLegs {
            side,
            count: legs.len(),
            max: LEG_SLOTS_PER_SIDE,
        });
    }
    let actual = legs.iter().filter(|leg| leg.amount != 0).count();
    if actual != legs.len() {
        return Err(EscrowError::LegCountMismatch {
            side,
            declared: legs.len(),
            actual,
        });
    }
    for (leg, record) in legs.iter().enumerate() {
        match (side, record.custody) {
            (Side::Initiator, None) => {
                return Err(EscrowError::MalformedRecord {
                    field: Field::Account(AccountRole::Custody { leg }),
                    reason: "initiator leg has no custody holding",
                })
            }
            (Side::Counterparty, Some(_)) => {
                return Err(EscrowError::MalformedRecord {
                    field: Field::Account(AccountRole::CounterpartyHolding { side, leg }),
                    reason: "counterparty leg cannot be custodied",
                })
            }
            _ => {}
        }
    }
    Ok(())
}

fn slot_index(side: Side, leg: usize) -> usize {
    match side {
        Side::Initiator => leg,
        Side::Counterparty => LEG_SLOTS_PER_SIDE + leg,
    }
}

fn key_slot(table: &[u8], slot: usize) -> &[u8] {
    &table[slot * PUBKEY_BYTES..(slot + 1) * PUBKEY_BYTES]
}

struct SlotTables<'a> {
    initiator_holdings: &'a [u8; HOLDINGS_BYTES],
    counterparty_holdings: &'a [u8; HOLDINGS_BYTES],
    custody: &'a [u8; CUSTODY_BYTES],
    amounts: &'a [u64],
}

impl SlotTables<'_> {
    fn decode_side(&self, side: Side, declared: u8) -> EscrowResult<Vec<LegRecord>> {
        let declared = declared as usize;
        if declared > LEG_SLOTS_PER_SIDE {
            return Err(EscrowError::TooManyLegs {
                side,
                count: declared,
                max: LEG_SLOTS_PER_SIDE,
            });
        }

        // The amounts are authoritative: the count must cover exactly the leading non-zero slots
        let base = slot_index(side, 0);
        let amounts = &self.amounts[base..base + LEG_SLOTS_PER_SIDE];
        let actual = amounts.iter().filter(|amount| **amount != 0).count();
        if actual != declared || amounts[..declared].contains(&0) {
            return Err(EscrowError::LegCountMismatch {
                side,
                declared,
                actual,
            });
        }

        let mut legs = Vec::with_capacity(declared);
        for leg in 0..LEG_SLOTS_PER_SIDE {
            let slot = base + leg;
            let initiator_role = AccountRole::InitiatorHolding { side, leg };
            let counterparty_role = AccountRole::CounterpartyHolding { side, leg };
            let custody_role = AccountRole::Custody { leg };

            let mut keys = vec![
                (key_slot(self.initiator_holdings, slot), initiator_role),
                (key_slot(self.counterparty_holdings, slot), counterparty_role),
            ];
            if side == Side::Initiator {
                keys.push((key_slot(self.custody, leg), custody_role));
            }

            if leg >= declared {
                if let Some((_, role)) = keys.iter().find(|(bytes, _)| !is_zero_key(bytes)) {
                    return Err(EscrowError::MalformedRecord {
                        field: Field::Account(*role),
                        reason: "unused leg slot is not zero-filled",
                    });
                }
                continue;
            }

            let custody = match side {
                Side::Initiator => Some(unpack_key(
                    key_slot(self.custody, leg),
                    Field::Account(custody_role),
                )?),
                Side::Counterparty => None,
            };
            legs.push(LegRecord {
                initiator_holding: unpack_key(
                    key_slot(self.initiator_holdings, slot),
                    Field::Account(initiator_role),
                )?,
                counterparty_holding: unpack_key(
                    key_slot(self.counterparty_holdings, slot),
                    Field::Account(counterparty_role),
                )?,
                custody,
                amount: amounts[leg],
            });
        }
        Ok(legs)
    }
}

impl Sealed for EscrowState {}

impl IsInitialized for EscrowState {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for EscrowState {
    const LEN: usize = ESCROW_STATE_LEN;

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, ESCROW_STATE_LEN];
        dst.fill(0);
        if !self.is_initialized {
            return;
        }

        #[rustfmt::skip]
        let (
            flag_dst,
            direction_dst,
            native_dst,
            initiator_count_dst,
            counterparty_count_dst,
            initiator_dst,
            counterparty_dst,
            authority_dst,
            initiator_holdings_dst,
            counterparty_holdings_dst,
            custody_dst,
            amounts_dst,
        ) = mut_array_refs![dst, 1, 1, 8, 1, 1, 32, 32, 32, 576, 576, 288, 144];

        flag_dst[0] = 1;
        direction_dst[0] = self.native.direction.to_byte();
        *native_dst = self.native.lamports.to_le_bytes();
        // Leg counts are bounded by LEG_SLOTS_PER_SIDE at construction
        initiator_count_dst[0] = self.initiator_legs.len() as u8;
        counterparty_count_dst[0] = self.counterparty_legs.len() as u8;
        pack_key(&self.initiator, initiator_dst);
        pack_key(&self.counterparty, counterparty_dst);
        pack_key(&self.authority, authority_dst);

        for side in Side::ALL {
            for (leg, record) in self.legs(side).iter().enumerate() {
                let slot = slot_index(side, leg);
                let key_at = slot * PUBKEY_BYTES;
                pack_key(
                    &record.initiator_holding,
                    array_mut_ref![initiator_holdings_dst, key_at, PUBKEY_BYTES],
                );
                pack_key(
                    &record.counterparty_holding,
                    array_mut_ref![counterparty_holdings_dst, key_at, PUBKEY_BYTES],
                );
                if let Some(custody) = record.custody {
                    pack_key(
                        &custody,
                        array_mut_ref![custody_dst, leg * PUBKEY_BYTES, PUBKEY_BYTES],
                    );
                }
                *array_mut_ref![amounts_dst, slot * AMOUNT_BYTES, AMOUNT_BYTES] =
                    record.amount.to_le_bytes();
            }
        }
    }

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        Ok(Self::decode(src)?)
    }
}
