//! Instruction payload codec
//!
//! Layout after the discriminant byte, shared by all three instructions:
//!
//! | size  | field                                          |
//! |-------|------------------------------------------------|
//! | 1     | native direction (0 = to initiator, 1 = to counterparty) |
//! | 8     | native lamports, little-endian                 |
//! | 1     | initiator leg count N (0..=4)                  |
//! | N × 8 | initiator leg amounts, little-endian           |
//! | 1     | counterparty leg count M (0..=4)               |
//! | M × 8 | counterparty leg amounts, little-endian        |

use crate::{
    constants::{AMOUNT_BYTES, MAX_LEGS_PER_SIDE},
    error::{EscrowError, EscrowResult, Field},
    manifest::{check_legs, NativeDirection, NativeLeg, Side, SwapManifest},
};

/// Instruction discriminants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InstructionKind {
    Initialize = 0,
    Exchange = 1,
    Cancel = 2,
}

impl InstructionKind {
    pub const ALL: [InstructionKind; 3] = [
        InstructionKind::Initialize,
        InstructionKind::Exchange,
        InstructionKind::Cancel,
    ];

    pub fn from_byte(value: u8) -> EscrowResult<Self> {
        match value {
            0 => Ok(InstructionKind::Initialize),
            1 => Ok(InstructionKind::Exchange),
            2 => Ok(InstructionKind::Cancel),
            other => Err(EscrowError::UnknownInstruction(other)),
        }
    }
}

/// Instructions understood by the settlement program
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscrowInstruction {
    /// Opens an escrow and moves the initiator's legs into custody.
    ///
    /// Accounts expected:
    ///
    /// 0. `[signer, writable]` Initiator
    /// 1. `[]` Counterparty
    /// 2. `[signer, writable]` Escrow state account, not yet active
    /// 3. `[]` Rent sysvar
    /// 4. `[]` Token program
    /// 5. `[]` Custody authority (program-derived)
    /// 6. For each initiator leg:
    ///    `[writable]` initiator source, `[writable]` counterparty destination, `[writable]` custody holding
    /// 7. For each counterparty leg:
    ///    `[writable]` initiator destination, `[writable]` counterparty source
    /// 8. `[]` System program
    Initialize(SwapManifest),

    /// Completes the swap: custody goes to the counterparty, counterparty legs go to
    /// the initiator, the native leg moves, and the escrow is settled.
    ///
    /// Accounts expected: as for `Initialize`, except that the counterparty signs
    /// and the initiator and escrow state account do not.
    Exchange(SwapManifest),

    /// Refunds custody to the initiator and settles the escrow.
    ///
    /// Accounts expected: as for `Initialize` with the initiator signing, minus the
    /// trailing system program.
    Cancel(SwapManifest),
}

impl EscrowInstruction {
    pub fn new(kind: InstructionKind, manifest: SwapManifest) -> Self {
        match kind {
            InstructionKind::Initialize => EscrowInstruction::Initialize(manifest),
            InstructionKind::Exchange => EscrowInstruction::Exchange(manifest),
            InstructionKind::Cancel => EscrowInstruction::Cancel(manifest),
        }
    }

    pub fn kind(&self) -> InstructionKind {
        match self {
            EscrowInstruction::Initialize(_) => InstructionKind::Initialize,
            EscrowInstruction::Exchange(_) => InstructionKind::Exchange,
            EscrowInstruction::Cancel(_) => InstructionKind::Cancel,
        }
    }

    pub fn manifest(&self) -> &SwapManifest {
        match self {
            EscrowInstruction::Initialize(manifest)
            | EscrowInstruction::Exchange(manifest)
            | EscrowInstruction::Cancel(manifest) => manifest,
        }
    }

    /// Number of payload bytes `pack` produces
    pub fn packed_len(&self) -> usize {
        let manifest = self.manifest();
        1 + 1
            + AMOUNT_BYTES
            + Side::ALL
                .iter()
                .map(|side| 1 + manifest.leg_count(*side) * AMOUNT_BYTES)
                .sum::<usize>()
    }

    pub fn pack(&self) -> Vec<u8> {
        let manifest = self.manifest();
        let native = manifest.native();

        let mut buf = Vec::with_capacity(self.packed_len());
        buf.push(self.kind() as u8);
        buf.push(native.direction.to_byte());
        buf.extend_from_slice(&native.lamports.to_le_bytes());
        for side in Side::ALL {
            let legs = manifest.legs(side);
            // Bounded by MAX_LEGS_PER_SIDE at construction
            buf.push(legs.len() as u8);
            for amount in legs {
                buf.extend_from_slice(&amount.to_le_bytes());
            }
        }
        buf
    }

    pub fn unpack(input: &[u8]) -> EscrowResult<Self> {
        let mut reader = PayloadReader::new(input);

        let kind = InstructionKind::from_byte(reader.read_u8(Field::Discriminant)?)?;
        let direction = NativeDirection::from_byte(
            reader.read_u8(Field::NativeDirection)?,
            Field::NativeDirection,
        )?;
        let lamports = reader.read_u64(Field::NativeAmount)?;
        let initiator_legs = reader.read_legs(Side::Initiator)?;
        let counterparty_legs = reader.read_legs(Side::Counterparty)?;
        reader.finish()?;

        let manifest = SwapManifest::new(
            NativeLeg::new(direction, lamports),
            initiator_legs,
            counterparty_legs,
        )?;
        Ok(EscrowInstruction::new(kind, manifest))
    }
}

/// Cursor over an instruction payload that names the field it fails on
struct PayloadReader<'a> {
    input: &'a [u8],
}

impl<'a> PayloadReader<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input }
    }

    fn take(&mut self, needed: usize, field: Field) -> EscrowResult<&'a [u8]> {
        if self.input.len() < needed {
            return Err(EscrowError::TruncatedInstruction {
                field,
                needed,
                available: self.input.len(),
            });
        }
        let (head, rest) = self.input.split_at(needed);
        self.input = rest;
        Ok(head)
    }

    fn read_u8(&mut self, field: Field) -> EscrowResult<u8> {
        Ok(self.take(1, field)?[0])
    }

    fn read_u64(&mut self, field: Field) -> EscrowResult<u64> {
        let bytes = self.take(AMOUNT_BYTES, field)?;
        let mut amount = [0u8; AMOUNT_BYTES];
        amount.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(amount))
    }

    fn read_legs(&mut self, side: Side) -> EscrowResult<Vec<u64>> {
        let count = self.read_u8(Field::LegCount(side))? as usize;
        if count > MAX_LEGS_PER_SIDE {
            return Err(EscrowError::TooManyLegs {
                side,
                count,
                max: MAX_LEGS_PER_SIDE,
            });
        }
        let legs = (0..count)
            .map(|leg| self.read_u64(Field::LegAmount(side, leg)))
            .collect::<EscrowResult<Vec<_>>>()?;
        check_legs(side, &legs)?;
        Ok(legs)
    }

    fn finish(self) -> EscrowResult<()> {
        if self.input.is_empty() {
            Ok(())
        } else {
            Err(EscrowError::TrailingBytes {
                count: self.input.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> SwapManifest {
        SwapManifest::new(
            NativeLeg::new(NativeDirection::CounterpartyToInitiator, 500),
            vec![1, 1],
            vec![42],
        )
        .unwrap()
    }

    #[test]
    fn test_packed_len_matches_pack() {
        for kind in InstructionKind::ALL {
            let ix = EscrowInstruction::new(kind, manifest());
            assert_eq!(ix.pack().len(), ix.packed_len());
            assert_eq!(ix.pack()[0], kind as u8);
        }
    }

    #[test]
    fn test_unknown_discriminant() {
        let mut data = EscrowInstruction::Cancel(manifest()).pack();
        data[0] = 3;
        assert_eq!(
            EscrowInstruction::unpack(&data),
            Err(EscrowError::UnknownInstruction(3))
        );
    }

    #[test]
    fn test_empty_payload_is_truncated() {
        assert_eq!(
            EscrowInstruction::unpack(&[]),
            Err(EscrowError::TruncatedInstruction {
                field: Field::Discriminant,
                needed: 1,
                available: 0
            })
        );
    }

    #[test]
    fn test_invalid_direction() {
        let mut data = EscrowInstruction::Exchange(manifest()).pack();
        data[1] = 2;
        assert_eq!(
            EscrowInstruction::unpack(&data),
            Err(EscrowError::InvalidDirection {
                field: Field::NativeDirection,
                value: 2
            })
        );
    }

    #[test]
    fn test_count_above_limit() {
        let mut data = EscrowInstruction::Exchange(manifest()).pack();
        // initiator count byte
        data[10] = 5;
        assert_eq!(
            EscrowInstruction::unpack(&data),
            Err(EscrowError::TooManyLegs {
                side: Side::Initiator,
                count: 5,
                max: MAX_LEGS_PER_SIDE
            })
        );
    }

    #[test]
    fn test_zero_amount_inside_count() {
        let mut data = EscrowInstruction::Exchange(manifest()).pack();
        // counterparty leg 0 amount follows both initiator legs and the counterparty count
        let offset = 11 + 2 * AMOUNT_BYTES + 1;
        data[offset..offset + AMOUNT_BYTES].copy_from_slice(&0u64.to_le_bytes());
        assert_eq!(
            EscrowInstruction::unpack(&data),
            Err(EscrowError::LegCountMismatch {
                side: Side::Counterparty,
                declared: 1,
                actual: 0
            })
        );
    }

    #[test]
    fn test_trailing_bytes() {
        let mut data = EscrowInstruction::Initialize(manifest()).pack();
        data.extend_from_slice(&[0, 0]);
        assert_eq!(
            EscrowInstruction::unpack(&data),
            Err(EscrowError::TrailingBytes { count: 2 })
        );
    }
}
