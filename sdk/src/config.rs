//! Client configuration
//!
//! Network selection, key names and the agreed swap terms, loaded from TOML.

use std::path::{Path, PathBuf};

use barter_escrow::{
    constants::{MAX_FUNGIBLE_LEGS, MAX_NFT_LEGS},
    NativeDirection,
};
use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use tracing::warn;

use crate::{
    client::SubmitOptions,
    error::{SdkError, SdkResult},
    utils::parse_commitment,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub network: NetworkConfig,
    pub keys: KeysConfig,
    pub terms: TermsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub rpc_url: String,
    /// `processed`, `confirmed` or `finalized`
    pub commitment: String,
    pub skip_preflight: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// Directory holding `<name>.json` secret keys and `<name>_pub.json` public keys
    pub dir: PathBuf,
    pub program: String,
    pub initiator: String,
    pub counterparty: String,
    pub escrow: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TermsConfig {
    pub native: NativeConfig,
    pub initiator: SideConfig,
    pub counterparty: SideConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionConfig {
    InitiatorToCounterparty,
    CounterpartyToInitiator,
}

impl From<DirectionConfig> for NativeDirection {
    fn from(direction: DirectionConfig) -> Self {
        match direction {
            DirectionConfig::InitiatorToCounterparty => NativeDirection::InitiatorToCounterparty,
            DirectionConfig::CounterpartyToInitiator => NativeDirection::CounterpartyToInitiator,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeConfig {
    pub direction: DirectionConfig,
    /// Decimal SOL amount; "0" means no native leg
    pub amount: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SideConfig {
    pub legs: Vec<LegConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegKind {
    Nft,
    Fungible,
}

/// One leg, by key names in the key store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegConfig {
    pub kind: LegKind,
    /// Initiator-owned holding
    pub initiator: String,
    /// Counterparty-owned holding
    pub counterparty: String,
    /// Escrow-custodied holding, initiator legs only
    pub custody: Option<String>,
    /// Decimal amount, fungible legs only
    pub amount: Option<String>,
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::devnet()
    }
}

impl NetworkConfig {
    pub fn localnet() -> Self {
        Self {
            rpc_url: "http://localhost:8899".to_string(),
            commitment: "confirmed".to_string(),
            skip_preflight: false,
        }
    }

    pub fn devnet() -> Self {
        Self {
            rpc_url: "https://api.devnet.solana.com".to_string(),
            commitment: "confirmed".to_string(),
            skip_preflight: false,
        }
    }

    pub fn mainnet() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            commitment: "finalized".to_string(),
            skip_preflight: false,
        }
    }

    pub fn commitment_level(&self) -> SdkResult<CommitmentLevel> {
        parse_commitment(&self.commitment)
    }

    pub fn commitment_config(&self) -> SdkResult<CommitmentConfig> {
        Ok(CommitmentConfig {
            commitment: self.commitment_level()?,
        })
    }

    pub fn submit_options(&self) -> SdkResult<SubmitOptions> {
        Ok(SubmitOptions {
            skip_preflight: self.skip_preflight,
            preflight_commitment: self.commitment_level()?,
        })
    }
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./keys"),
            program: "program".to_string(),
            initiator: "alice".to_string(),
            counterparty: "bob".to_string(),
            escrow: "escrow".to_string(),
        }
    }
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            direction: DirectionConfig::InitiatorToCounterparty,
            amount: "0".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn localnet() -> Self {
        Self::default().with_network(NetworkConfig::localnet())
    }

    pub fn devnet() -> Self {
        Self::default().with_network(NetworkConfig::devnet())
    }

    pub fn mainnet() -> Self {
        Self::default().with_network(NetworkConfig::mainnet())
    }

    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        self.network = network;
        self
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SdkError::Configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            SdkError::Configuration(format!("failed to parse {}: {e}", path.display()))
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            warn!("Config file not found, using defaults: {}", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> SdkResult<()> {
        if self.network.rpc_url.is_empty() {
            return Err(SdkError::Configuration("RPC URL cannot be empty".into()));
        }
        self.network.commitment_level()?;

        for (label, name) in [
            ("program", &self.keys.program),
            ("initiator", &self.keys.initiator),
            ("counterparty", &self.keys.counterparty),
            ("escrow", &self.keys.escrow),
        ] {
            if name.is_empty() {
                return Err(SdkError::Configuration(format!(
                    "{label} key name cannot be empty"
                )));
            }
        }

        self.terms.initiator.validate("initiator", true)?;
        self.terms.counterparty.validate("counterparty", false)?;
        Ok(())
    }
}

impl SideConfig {
    fn validate(&self, label: &str, custodied: bool) -> SdkResult<()> {
        let nfts = self.legs.iter().filter(|leg| leg.kind == LegKind::Nft).count();
        let fungible = self.legs.len() - nfts;
        if nfts > MAX_NFT_LEGS {
            return Err(SdkError::Configuration(format!(
                "{label} side lists {nfts} NFT legs, at most {MAX_NFT_LEGS} allowed"
            )));
        }
        if fungible > MAX_FUNGIBLE_LEGS {
            return Err(SdkError::Configuration(format!(
                "{label} side lists {fungible} fungible legs, at most {MAX_FUNGIBLE_LEGS} allowed"
            )));
        }

        for (index, leg) in self.legs.iter().enumerate() {
            if leg.initiator.is_empty() || leg.counterparty.is_empty() {
                return Err(SdkError::Configuration(format!(
                    "{label} leg {index} must name both holdings"
                )));
            }
            match (custodied, &leg.custody) {
                (true, None) => {
                    return Err(SdkError::Configuration(format!(
                        "{label} leg {index} needs a custody holding"
                    )))
                }
                (false, Some(_)) => {
                    return Err(SdkError::Configuration(format!(
                        "{label} leg {index} cannot be custodied"
                    )))
                }
                _ => {}
            }
            match (leg.kind, &leg.amount) {
                (LegKind::Fungible, None) => {
                    return Err(SdkError::Configuration(format!(
                        "{label} fungible leg needs an amount"
                    )))
                }
                (LegKind::Nft, Some(_)) => {
                    return Err(SdkError::Configuration(format!(
                        "{label} leg {index} is an NFT and moves exactly one unit"
                    )))
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(ClientConfig::localnet().network.rpc_url, "http://localhost:8899");
        assert_eq!(ClientConfig::devnet().network.rpc_url, "https://api.devnet.solana.com");
        assert_eq!(
            ClientConfig::mainnet().network.commitment_level().unwrap(),
            CommitmentLevel::Finalized
        );
    }

    #[test]
    fn test_default_is_valid() {
        ClientConfig::default().validate().unwrap();
    }

    #[test]
    fn test_unknown_commitment_rejected() {
        let mut config = ClientConfig::localnet();
        config.network.commitment = "max".into();
        assert!(matches!(config.validate(), Err(SdkError::Configuration(_))));
    }

    #[test]
    fn test_too_many_nft_legs_rejected() {
        let mut config = ClientConfig::default();
        config.terms.counterparty.legs = (0..4)
            .map(|i| LegConfig {
                kind: LegKind::Nft,
                initiator: format!("alice_y{i}"),
                counterparty: format!("bob_y{i}"),
                custody: None,
                amount: None,
                decimals: None,
            })
            .collect();
        assert!(matches!(config.validate(), Err(SdkError::Configuration(_))));
    }
}
