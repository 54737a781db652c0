use crate::error::{ConfigError, WalletError};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{error, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// secp256k1 group order; a valid secret lies in `1..ORDER`.
const SECP256K1_ORDER: &str = "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141";

/// A private key exactly as it was read, wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct RawKey(String);

impl RawKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawKey(***REDACTED***)")
    }
}

#[derive(Debug)]
pub struct WalletManager {
    keys: Vec<RawKey>,
}

impl WalletManager {
    pub const ENV_PREFIX: &'static str = "PRIVATE_KEY";
    pub const PV_FILE: &'static str = "pv.txt";

    /// Collects keys from `PRIVATE_KEY*` environment variables, falling back
    /// to `key_file` when none are set. Malformed keys are logged and
    /// skipped; ending up with no key at all is a configuration error.
    pub fn load(key_file: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_from(std::env::vars(), key_file)
    }

    /// `load` over an explicit variable set.
    pub fn load_from<I>(vars: I, key_file: impl AsRef<Path>) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let key_file = key_file.as_ref();
        let mut candidates = Self::keys_from_vars(vars, Self::ENV_PREFIX);

        if candidates.is_empty() {
            info!(
                "[WalletManager] No {}* variables set, checking {}",
                Self::ENV_PREFIX,
                key_file.display()
            );
            candidates = Self::keys_from_file(key_file)?;
        }

        let manager = Self::from_candidates(candidates);
        if manager.keys.is_empty() {
            return Err(ConfigError::NoCredentials {
                path: key_file.display().to_string(),
            });
        }

        info!("[WalletManager] {} valid keys loaded", manager.count());
        Ok(manager)
    }

    /// Keeps only well-formed keys, in order, without duplicates.
    pub fn from_candidates(candidates: Vec<RawKey>) -> Self {
        let mut keys: Vec<RawKey> = Vec::with_capacity(candidates.len());
        for (i, key) in candidates.into_iter().enumerate() {
            if let Err(e) = Self::validate_key(key.expose()) {
                error!("[WalletManager] Skipping key {}: {}", i + 1, e);
                continue;
            }
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        Self { keys }
    }

    /// Values of every variable starting with `prefix`, ordered by name so
    /// `PRIVATE_KEY_1`, `PRIVATE_KEY_2`, ... keep their numbering.
    pub fn keys_from_vars<I>(vars: I, prefix: &str) -> Vec<RawKey>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut matching: Vec<(String, String)> = vars
            .into_iter()
            .filter(|(name, value)| name.starts_with(prefix) && !value.trim().is_empty())
            .collect();
        matching.sort_by(|a, b| a.0.cmp(&b.0));
        matching
            .into_iter()
            .map(|(_, mut value)| {
                let key = RawKey::new(value.trim());
                value.zeroize();
                key
            })
            .collect()
    }

    pub fn keys_from_file(path: &Path) -> Result<Vec<RawKey>, ConfigError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            msg: e.to_string(),
        })?;

        let keys = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(RawKey::new)
            .collect();
        content.zeroize();
        Ok(keys)
    }

    /// 32-byte hex secret, `0x` prefix optional, that a secp256k1 signer
    /// accepts (non-zero and below the group order).
    pub fn validate_key(key: &str) -> Result<(), WalletError> {
        let hex_part = key
            .strip_prefix("0x")
            .or_else(|| key.strip_prefix("0X"))
            .unwrap_or(key);
        if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(WalletError::InvalidKeyFormat);
        }
        if hex_part.len() != 64 {
            return Err(WalletError::InvalidKeyLength {
                length: hex_part.len(),
            });
        }
        // equal-length hex strings compare like the numbers they encode
        let scalar = hex_part.to_ascii_lowercase();
        if scalar.bytes().all(|b| b == b'0') {
            return Err(WalletError::InvalidKey {
                reason: "zero scalar".to_string(),
            });
        }
        if scalar.as_str() >= SECP256K1_ORDER {
            return Err(WalletError::InvalidKey {
                reason: "scalar not below the curve order".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the number of available wallets
    pub fn count(&self) -> usize {
        self.keys.len()
    }

    pub fn keys(&self) -> &[RawKey] {
        &self.keys
    }
}
