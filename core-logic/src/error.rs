//! # Core Error Types
//!
//! Centralized error definitions for the core-logic crate.
//! All errors implement `std::error::Error` and `std::fmt::Display`.

use thiserror::Error;

/// Configuration-related errors.
///
/// Anything in this enum is fatal at startup: the binary logs it and exits.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: '{field}'")]
    MissingField { field: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("I/O error reading {path}: {msg}")]
    IoError { path: String, msg: String },

    #[error("Invalid proxy '{line}': {reason}")]
    InvalidProxy { line: String, reason: String },

    #[error("No private keys found (checked PRIVATE_KEY* env vars and {path})")]
    NoCredentials { path: String },
}

/// Wallet and key-material errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Invalid private key format: expected hex string")]
    InvalidKeyFormat,

    #[error("Private key too short: expected 64 hex chars, got {length}")]
    InvalidKeyLength { length: usize },

    #[error("Private key rejected by signer: {reason}")]
    InvalidKey { reason: String },
}
