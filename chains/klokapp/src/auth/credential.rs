use crate::error::AuthError;
use core_logic::{RawKey, WalletError};
use ethers::prelude::*;
use ethers::utils::to_checksum;
use std::fmt;

/// An Ethereum key pair used to sign in. The private half never leaves the
/// wallet and never shows up in `Debug` output.
#[derive(Clone)]
pub struct Credential {
    wallet: LocalWallet,
}

impl Credential {
    pub fn from_raw(key: &RawKey) -> Result<Self, WalletError> {
        Self::from_hex(key.expose())
    }

    pub fn from_hex(key: &str) -> Result<Self, WalletError> {
        let trimmed = key.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let wallet = body
            .parse::<LocalWallet>()
            .map_err(|e| WalletError::InvalidKey {
                reason: e.to_string(),
            })?;
        Ok(Self { wallet })
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// EIP-55 mixed-case form, as it appears in the sign-in message.
    pub fn checksum_address(&self) -> String {
        to_checksum(&self.wallet.address(), None)
    }

    /// Personal-message signature (`0x` + 130 hex chars) over `message`.
    pub async fn sign(&self, message: &str) -> Result<String, AuthError> {
        let signature = self
            .wallet
            .sign_message(message)
            .await
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        Ok(format!("0x{}", signature))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("address", &self.checksum_address())
            .finish_non_exhaustive()
    }
}
