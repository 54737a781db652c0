//! Klokapp web API: the request/response shapes and the HTTP client.

pub mod client;
pub mod models;
pub mod quota;

pub use client::{ApiSettings, KlokClient, SESSION_HEADER};
pub use models::{CaptchaToken, ChatReply, ChatRequest, ChatResponse};
pub use quota::{Quota, RateLimitResponse};

use crate::auth::SignedLogin;
use crate::error::KlokError;
use async_trait::async_trait;
use uuid::Uuid;

/// The three calls a session makes. Tests swap in scripted fakes.
#[async_trait]
pub trait KlokApi: Send + Sync {
    /// Exchanges a signed login (and optional CAPTCHA token) for a session token.
    async fn verify(
        &self,
        login: &SignedLogin,
        captcha: Option<&CaptchaToken>,
    ) -> Result<String, KlokError>;

    async fn rate_limit(&self, token: &str) -> Result<Quota, KlokError>;

    /// Posts `question` as the first message of thread `thread_id`.
    async fn chat(
        &self,
        token: &str,
        thread_id: Uuid,
        question: &str,
    ) -> Result<ChatReply, KlokError>;
}
