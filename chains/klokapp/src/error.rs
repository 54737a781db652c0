//! Error taxonomy of the Klokapp session.
//!
//! Every error that reaches the session loop maps to one named transition:
//! authentication problems reset the session, quota and send problems either
//! reset it (401/403) or idle with the retry backoff.

use core_logic::{ConfigError, WalletError};
use thiserror::Error;

/// Bodies longer than this are cut in `Display` output. The full body stays
/// on the error value.
pub const BODY_PREVIEW_CHARS: usize = 200;

pub fn preview(body: &str) -> String {
    if body.chars().count() > BODY_PREVIEW_CHARS {
        let truncated: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
        format!("{}...", truncated)
    } else {
        body.to_string()
    }
}

/// CAPTCHA acquisition failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptchaError {
    /// The solver reported failure or refused the task.
    #[error("captcha solver failed: {0}")]
    Solve(String),

    /// The solver never reached a terminal state.
    #[error("captcha not solved after {attempts} polls")]
    Timeout { attempts: u32 },

    #[error("browser captcha failed: {0}")]
    Browser(String),

    #[error("captcha service unreachable: {0}")]
    Transport(String),
}

/// Failures of the sign-in / verify exchange.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("verify rejected with status {status}: {}", preview(.body))]
    Rejected { status: u16, body: String },

    #[error("verify returned a non-JSON body (status {status}): {}", preview(.body))]
    InvalidResponse { status: u16, body: String },

    #[error("verify response has no session_token (status {status}): {}", preview(.body))]
    MissingToken { status: u16, body: String },

    #[error("failed to sign login message: {0}")]
    Signing(String),

    #[error(transparent)]
    Captcha(#[from] CaptchaError),

    #[error("verify request failed: {0}")]
    Transport(String),
}

#[derive(Error, Debug)]
pub enum KlokError {
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),

    #[error("rate-limit query failed with status {status}: {}", preview(.body))]
    Quota { status: u16, body: String },

    #[error("send message failed with status {status}: {}", preview(.body))]
    SendMessage { status: u16, body: String },

    #[error("{endpoint} request failed: {reason}")]
    Network {
        endpoint: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Wallet(#[from] WalletError),
}

impl KlokError {
    /// HTTP status attached to the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            KlokError::Quota { status, .. } | KlokError::SendMessage { status, .. } => {
                Some(*status)
            }
            KlokError::Authentication(
                AuthError::Rejected { status, .. }
                | AuthError::InvalidResponse { status, .. }
                | AuthError::MissingToken { status, .. },
            ) => Some(*status),
            _ => None,
        }
    }

    /// The server no longer accepts our session token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            KlokError::Quota { status: 401 | 403, .. }
                | KlokError::SendMessage { status: 401 | 403, .. }
        )
    }
}
