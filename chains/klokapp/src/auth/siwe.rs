use super::credential::Credential;
use crate::error::AuthError;
use chrono::{DateTime, SecondsFormat, Utc};
use ethers::types::{Address, Signature};
use rand::RngCore;
use std::fmt;
use std::str::FromStr;

/// Random bytes behind each nonce. Hex-encoded this gives 96 characters.
pub const NONCE_BYTES: usize = 48;

/// The fixed part of the sign-in message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInTemplate {
    pub domain: String,
    pub uri: String,
    pub version: String,
    pub chain_id: u64,
}

impl Default for SignInTemplate {
    fn default() -> Self {
        Self {
            domain: "klokapp.ai".to_string(),
            uri: "https://klokapp.ai/".to_string(),
            version: "1".to_string(),
            chain_id: 1,
        }
    }
}

impl SignInTemplate {
    pub fn message_for(&self, address: &str) -> SignInMessage {
        self.message_at(address, generate_nonce(), Utc::now())
    }

    pub fn message_at(
        &self,
        address: &str,
        nonce: String,
        issued_at: DateTime<Utc>,
    ) -> SignInMessage {
        SignInMessage {
            domain: self.domain.clone(),
            address: address.to_string(),
            uri: self.uri.clone(),
            version: self.version.clone(),
            chain_id: self.chain_id,
            nonce,
            issued_at,
        }
    }

    /// Builds a fresh message for `credential` and signs it.
    pub async fn sign_in(&self, credential: &Credential) -> Result<SignedLogin, AuthError> {
        let message = self.message_for(&credential.checksum_address()).to_string();
        let signature = credential.sign(&message).await?;
        Ok(SignedLogin { message, signature })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInMessage {
    pub domain: String,
    pub address: String,
    pub uri: String,
    pub version: String,
    pub chain_id: u64,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
}

impl fmt::Display for SignInMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = [
            format!("{} wants you to sign in with your Ethereum account:", self.domain),
            self.address.clone(),
            String::new(),
            String::new(),
            format!("URI: {}", self.uri),
            format!("Version: {}", self.version),
            format!("Chain ID: {}", self.chain_id),
            format!("Nonce: {}", self.nonce),
            format!(
                "Issued At: {}",
                self.issued_at.to_rfc3339_opts(SecondsFormat::Millis, true)
            ),
        ];
        f.write_str(&lines.join("\n"))
    }
}

pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// The exact message text and its signature, ready for `/verify`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedLogin {
    pub message: String,
    pub signature: String,
}

/// Address that produced `signature` over `message`.
pub fn recover_signer(message: &str, signature: &str) -> Result<Address, AuthError> {
    let signature =
        Signature::from_str(signature).map_err(|e| AuthError::Signing(e.to_string()))?;
    signature
        .recover(message)
        .map_err(|e| AuthError::Signing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn nonce_is_96_lowercase_hex_chars() {
        let nonce = generate_nonce();
        assert_eq!(nonce.len(), 96);
        assert!(nonce
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_ne!(nonce, generate_nonce());
    }

    #[test]
    fn message_layout_is_exact() {
        let issued_at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let message = SignInTemplate::default().message_at(
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            "ab".repeat(48),
            issued_at,
        );
        let expected = format!(
            "klokapp.ai wants you to sign in with your Ethereum account:\n\
             0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266\n\
             \n\
             \n\
             URI: https://klokapp.ai/\n\
             Version: 1\n\
             Chain ID: 1\n\
             Nonce: {}\n\
             Issued At: 2025-03-01T12:00:00.000Z",
            "ab".repeat(48)
        );
        assert_eq!(message.to_string(), expected);
    }
}
