//! Instruction payload contract between client and settlement program

use barter_escrow::{
    AccountSchema, EscrowError, EscrowInstruction, InstructionKind, NativeDirection, NativeLeg,
    Side, SwapManifest,
};
use proptest::prelude::*;

fn le(amount: u64) -> [u8; 8] {
    amount.to_le_bytes()
}

#[test]
fn test_initialize_one_nft_each_way() {
    let manifest = SwapManifest::new(
        NativeLeg::new(NativeDirection::InitiatorToCounterparty, 2_000_000_000),
        vec![1],
        vec![1],
    )
    .unwrap();
    let ix = EscrowInstruction::Initialize(manifest.clone());
    let data = ix.pack();

    let mut expected = vec![0u8, 1];
    expected.extend_from_slice(&le(2_000_000_000));
    expected.push(1);
    expected.extend_from_slice(&le(1));
    expected.push(1);
    expected.extend_from_slice(&le(1));
    assert_eq!(data, expected);

    let decoded = EscrowInstruction::unpack(&data).unwrap();
    assert_eq!(decoded, ix);
    assert_eq!(decoded.manifest(), &manifest);
}

#[test]
fn test_exchange_full_bundle_bytes() {
    let mut data = vec![1u8, 1];
    data.extend_from_slice(&le(2_000_000_000));
    data.push(4);
    for amount in [1u64, 1, 1, 2_000_000_000] {
        data.extend_from_slice(&le(amount));
    }
    data.push(3);
    for amount in [1u64, 1, 3_000_000_000] {
        data.extend_from_slice(&le(amount));
    }

    let ix = EscrowInstruction::unpack(&data).unwrap();
    assert_eq!(ix.kind(), InstructionKind::Exchange);

    let manifest = ix.manifest();
    assert_eq!(
        manifest.native(),
        NativeLeg::new(NativeDirection::InitiatorToCounterparty, 2_000_000_000)
    );
    assert_eq!(manifest.legs(Side::Initiator), &[1, 1, 1, 2_000_000_000]);
    assert_eq!(manifest.legs(Side::Counterparty), &[1, 1, 3_000_000_000]);

    assert_eq!(ix.pack(), data);
}

#[test]
fn test_schema_follows_payload_counts() {
    let manifest = SwapManifest::new(NativeLeg::default(), vec![1, 1, 50], vec![9]).unwrap();
    let ix = EscrowInstruction::Exchange(manifest);
    let schema = AccountSchema::for_payload(&ix);

    assert_eq!(schema.len(), 6 + 3 * 3 + 2 + 1);
    assert!(schema.check_account_count(schema.len()).is_ok());
    assert!(matches!(
        schema.check_account_count(schema.len() - 2),
        Err(EscrowError::AccountCountMismatch { .. })
    ));
}

// ============================================================================
// Strategies
// ============================================================================

fn side_legs() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(1u64..=u64::MAX, 0..=4)
}

fn manifests() -> impl Strategy<Value = SwapManifest> {
    (any::<bool>(), any::<u64>(), side_legs(), side_legs()).prop_map(
        |(to_counterparty, lamports, initiator, counterparty)| {
            let direction = if to_counterparty {
                NativeDirection::InitiatorToCounterparty
            } else {
                NativeDirection::CounterpartyToInitiator
            };
            SwapManifest::new(NativeLeg::new(direction, lamports), initiator, counterparty)
                .unwrap()
        },
    )
}

fn instructions() -> impl Strategy<Value = EscrowInstruction> {
    (0u8..3, manifests()).prop_map(|(kind, manifest)| {
        EscrowInstruction::new(InstructionKind::from_byte(kind).unwrap(), manifest)
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_round_trip_is_byte_exact(ix in instructions()) {
        let data = ix.pack();
        let decoded = EscrowInstruction::unpack(&data).unwrap();
        prop_assert_eq!(&decoded, &ix);
        prop_assert_eq!(decoded.pack(), data);
    }

    #[test]
    fn prop_count_byte_matches_encoded_legs(ix in instructions()) {
        let data = ix.pack();
        let initiator_count = data[10] as usize;
        prop_assert_eq!(initiator_count, ix.manifest().leg_count(Side::Initiator));
        let counterparty_count = data[11 + initiator_count * 8] as usize;
        prop_assert_eq!(counterparty_count, ix.manifest().leg_count(Side::Counterparty));
    }

    #[test]
    fn prop_truncation_always_detected(ix in instructions(), cut in any::<prop::sample::Index>()) {
        let data = ix.pack();
        let len = cut.index(data.len());
        let result = EscrowInstruction::unpack(&data[..len]);
        prop_assert!(
            matches!(result, Err(EscrowError::TruncatedInstruction { .. })),
            "payload cut at {} decoded as {:?}",
            len,
            result
        );
    }

    #[test]
    fn prop_extension_always_detected(ix in instructions(), extra in prop::collection::vec(any::<u8>(), 1..16)) {
        let mut data = ix.pack();
        data.extend_from_slice(&extra);
        prop_assert_eq!(
            EscrowInstruction::unpack(&data),
            Err(EscrowError::TrailingBytes { count: extra.len() })
        );
    }
}
