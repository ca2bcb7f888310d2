//! Configuration loading and key store resolution

use std::path::Path;

use barter_escrow::{AccountRole, NativeDirection, Side};
use barter_sdk::{
    config::LegKind, testing::MemoryKeyStore, ClientConfig, FileKeyStore, KeyStore, SdkError,
};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{write_keypair_file, Keypair, Signer},
};
use tempfile::TempDir;

const SWAP_TOML: &str = r#"
[network]
rpc_url = "http://localhost:8899"

[keys]
dir = "keys"

[terms.native]
direction = "counterparty_to_initiator"
amount = "1.5"

[[terms.initiator.legs]]
kind = "fungible"
initiator = "alice_usdc"
counterparty = "bob_usdc"
custody = "escrow_usdc"
amount = "25"
decimals = 6

[[terms.initiator.legs]]
kind = "nft"
initiator = "alice_x"
counterparty = "bob_x"
custody = "escrow_x"

[[terms.counterparty.legs]]
kind = "nft"
initiator = "alice_y"
counterparty = "bob_y"
"#;

const HOLDINGS: [&str; 8] = [
    "alice_usdc",
    "bob_usdc",
    "escrow_usdc",
    "alice_x",
    "bob_x",
    "escrow_x",
    "alice_y",
    "bob_y",
];

fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("barter.toml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_config_file() {
    let dir = TempDir::new().unwrap();
    let config = ClientConfig::from_file(write_config(dir.path(), SWAP_TOML)).unwrap();

    assert_eq!(config.network.rpc_url, "http://localhost:8899");
    assert_eq!(config.network.commitment, "confirmed");
    assert_eq!(config.keys.initiator, "alice");
    assert_eq!(config.terms.initiator.legs.len(), 2);
    assert_eq!(config.terms.initiator.legs[0].kind, LegKind::Fungible);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let config = ClientConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.network.rpc_url, "https://api.devnet.solana.com");
    assert!(config.terms.initiator.legs.is_empty());
}

#[test]
fn test_counterparty_leg_with_custody_rejected() {
    let dir = TempDir::new().unwrap();
    let content = format!("{SWAP_TOML}custody = \"escrow_y\"\n");
    let result = ClientConfig::from_file(write_config(dir.path(), &content));
    assert!(matches!(result, Err(SdkError::Configuration(_))));
}

#[test]
fn test_malformed_toml_rejected() {
    let dir = TempDir::new().unwrap();
    let result = ClientConfig::from_file(write_config(dir.path(), "[network\nrpc_url = 1"));
    assert!(matches!(result, Err(SdkError::Configuration(_))));
}

#[test]
fn test_resolve_terms_through_key_store() {
    let config: ClientConfig = toml::from_str(SWAP_TOML).unwrap();
    let mut store = MemoryKeyStore::new();
    let alice = store.generate("alice");
    let bob = store.generate("bob");
    store.generate("escrow");
    let holdings: Vec<Pubkey> = HOLDINGS
        .iter()
        .map(|name| {
            let key = Pubkey::new_unique();
            store.insert_public(name, key);
            key
        })
        .collect();

    let terms = config.terms.resolve(&config.keys, &store).unwrap();

    assert_eq!(terms.initiator, alice);
    assert_eq!(terms.counterparty, bob);
    assert_eq!(terms.native.direction, NativeDirection::CounterpartyToInitiator);
    assert_eq!(terms.native.lamports, 1_500_000_000);

    // The NFT leg is placed ahead of the fungible leg whatever the file order
    let manifest = terms.manifest().unwrap();
    assert_eq!(manifest.legs(Side::Initiator), &[1, 25_000_000]);
    assert_eq!(manifest.legs(Side::Counterparty), &[1]);
    assert_eq!(terms.initiator_side.nfts[0].initiator, holdings[3]);
    assert_eq!(terms.initiator_side.nfts[0].custody, Some(holdings[5]));
    let fungible = terms.initiator_side.fungible.unwrap();
    assert_eq!(fungible.holdings.counterparty, holdings[1]);
    assert_eq!(terms.counterparty_side.nfts[0].custody, None);
}

#[test]
fn test_unknown_holding_names_role() {
    let config: ClientConfig = toml::from_str(SWAP_TOML).unwrap();
    let mut store = MemoryKeyStore::new();
    for name in ["alice", "bob", "escrow"] {
        store.generate(name);
    }
    for name in HOLDINGS.iter().filter(|name| **name != "bob_y") {
        store.insert_public(name, Pubkey::new_unique());
    }

    let err = config.terms.resolve(&config.keys, &store).unwrap_err();
    assert!(matches!(
        err,
        SdkError::MissingAccountReference {
            role: AccountRole::CounterpartyHolding {
                side: Side::Counterparty,
                leg: 0
            },
            ..
        }
    ));
}

#[test]
fn test_file_key_store_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = FileKeyStore::new(dir.path().join("keys"));
    let key = Pubkey::new_unique();

    store.save_public(&key, "alice_x").unwrap();
    assert_eq!(store.load_public("alice_x").unwrap(), key);

    let content = std::fs::read_to_string(dir.path().join("keys/alice_x_pub.json")).unwrap();
    assert_eq!(content, format!("\"{key}\""));
}

#[test]
fn test_file_key_store_loads_keypair() {
    let dir = TempDir::new().unwrap();
    let store = FileKeyStore::new(dir.path());
    let alice = Keypair::new();
    write_keypair_file(&alice, dir.path().join("alice.json")).unwrap();

    assert_eq!(store.load("alice").unwrap().pubkey(), alice.pubkey());
    // No public file yet: derived from the secret key
    assert_eq!(store.load_public("alice").unwrap(), alice.pubkey());

    store.save_public(&alice.pubkey(), "alice").unwrap();
    assert_eq!(store.load("alice").unwrap().pubkey(), alice.pubkey());
}

#[test]
fn test_file_key_store_detects_mismatched_pair() {
    let dir = TempDir::new().unwrap();
    let store = FileKeyStore::new(dir.path());
    write_keypair_file(&Keypair::new(), dir.path().join("bob.json")).unwrap();
    store.save_public(&Pubkey::new_unique(), "bob").unwrap();

    assert!(matches!(
        store.load("bob"),
        Err(SdkError::CredentialUnavailable { name, .. }) if name == "bob"
    ));
}

#[test]
fn test_file_key_store_missing_key() {
    let dir = TempDir::new().unwrap();
    let store = FileKeyStore::new(dir.path());
    assert!(matches!(
        store.load_public("nobody"),
        Err(SdkError::CredentialUnavailable { .. })
    ));
}
