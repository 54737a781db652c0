//! Wallet credentials and the Sign-In-With-Ethereum style login message.

pub mod credential;
pub mod siwe;

pub use credential::Credential;
pub use siwe::{generate_nonce, recover_signer, SignInMessage, SignInTemplate, SignedLogin};
