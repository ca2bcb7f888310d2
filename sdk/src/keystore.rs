//! Key and credential storage
//!
//! Keys live in one directory: `<name>.json` holds the 64-byte secret key as a JSON
//! array, `<name>_pub.json` holds the base58 public key as a JSON string.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use solana_sdk::{
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair},
    signer::Signer,
};
use tracing::debug;

use crate::error::{SdkError, SdkResult};

/// Named key material
pub trait KeyStore {
    /// Load a keypair
    fn load(&self, name: &str) -> SdkResult<Keypair>;

    /// Load a public key
    fn load_public(&self, name: &str) -> SdkResult<Pubkey>;

    /// Store a public key under `name`
    fn save_public(&self, key: &Pubkey, name: &str) -> SdkResult<()>;
}

/// Key store backed by a directory of JSON files
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    dir: PathBuf,
}

impl FileKeyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn secret_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    fn public_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}_pub.json"))
    }

    fn read_public(&self, name: &str, path: &Path) -> SdkResult<Pubkey> {
        let unavailable = |reason: String| SdkError::CredentialUnavailable {
            name: name.to_string(),
            reason,
        };
        let content = std::fs::read_to_string(path)
            .map_err(|e| unavailable(format!("{}: {e}", path.display())))?;
        let encoded: String = serde_json::from_str(&content)
            .map_err(|e| unavailable(format!("{}: {e}", path.display())))?;
        Pubkey::from_str(&encoded).map_err(|e| unavailable(format!("{}: {e}", path.display())))
    }
}

impl KeyStore for FileKeyStore {
    fn load(&self, name: &str) -> SdkResult<Keypair> {
        let path = self.secret_path(name);
        let keypair = read_keypair_file(&path).map_err(|e| SdkError::CredentialUnavailable {
            name: name.to_string(),
            reason: format!("{}: {e}", path.display()),
        })?;

        let public_path = self.public_path(name);
        if public_path.exists() {
            let recorded = self.read_public(name, &public_path)?;
            if recorded != keypair.pubkey() {
                return Err(SdkError::CredentialUnavailable {
                    name: name.to_string(),
                    reason: format!(
                        "public key {recorded} does not match secret key {}",
                        keypair.pubkey()
                    ),
                });
            }
        }

        debug!("Loaded keypair {} ({})", name, keypair.pubkey());
        Ok(keypair)
    }

    fn load_public(&self, name: &str) -> SdkResult<Pubkey> {
        let path = self.public_path(name);
        if !path.exists() && self.secret_path(name).exists() {
            return Ok(self.load(name)?.pubkey());
        }
        self.read_public(name, &path)
    }

    fn save_public(&self, key: &Pubkey, name: &str) -> SdkResult<()> {
        let unavailable = |e: std::io::Error| SdkError::CredentialUnavailable {
            name: name.to_string(),
            reason: e.to_string(),
        };
        std::fs::create_dir_all(&self.dir).map_err(unavailable)?;
        let encoded = serde_json::to_string(&key.to_string()).map_err(|e| {
            SdkError::CredentialUnavailable {
                name: name.to_string(),
                reason: e.to_string(),
            }
        })?;
        std::fs::write(self.public_path(name), encoded).map_err(unavailable)
    }
}
