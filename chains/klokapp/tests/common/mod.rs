#![allow(dead_code)]

use async_trait::async_trait;
use klokapp_bot::api::{CaptchaToken, ChatReply, KlokApi, Quota};
use klokapp_bot::auth::{Credential, SignedLogin};
use klokapp_bot::captcha::CaptchaProvider;
use klokapp_bot::error::{AuthError, CaptchaError, KlokError};
use klokapp_bot::questions::QuestionSource;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

pub const KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub fn credential() -> Credential {
    Credential::from_hex(KEY).unwrap()
}

/// Scripted stand-in for the Klokapp service.
#[derive(Default)]
pub struct FakeApi {
    pub initial_remaining: u64,
    pub limit: u64,
    /// Quota reads 0 once this many messages went through.
    pub exhaust_after: Option<usize>,
    pub reject_verify: bool,
    /// Status codes returned by the next chat calls, in order.
    pub chat_failures: Mutex<VecDeque<u16>>,
    /// Status codes returned by the next quota calls, in order.
    pub quota_failures: Mutex<VecDeque<u16>>,

    pub verify_calls: AtomicUsize,
    pub rate_limit_calls: AtomicUsize,
    pub chat_calls: AtomicUsize,
    pub sent: AtomicUsize,
    pub logins: Mutex<Vec<SignedLogin>>,
    pub captchas: Mutex<Vec<Option<String>>>,
    pub threads: Mutex<Vec<Uuid>>,
    pub tokens_seen: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn with_quota(remaining: u64) -> Self {
        Self {
            initial_remaining: remaining,
            limit: 10,
            ..Self::default()
        }
    }

    pub fn exhausting_after(mut self, k: usize) -> Self {
        self.exhaust_after = Some(k);
        self
    }

    pub fn failing_chats(self, statuses: &[u16]) -> Self {
        *self.chat_failures.lock().unwrap() = statuses.iter().copied().collect();
        self
    }

    pub fn failing_quota(self, statuses: &[u16]) -> Self {
        *self.quota_failures.lock().unwrap() = statuses.iter().copied().collect();
        self
    }

    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }

    pub fn verifies(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn chats(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KlokApi for FakeApi {
    async fn verify(
        &self,
        login: &SignedLogin,
        captcha: Option<&CaptchaToken>,
    ) -> Result<String, KlokError> {
        let n = self.verify_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.logins.lock().unwrap().push(login.clone());
        self.captchas
            .lock()
            .unwrap()
            .push(captcha.map(|c| c.as_str().to_string()));
        if self.reject_verify {
            return Err(AuthError::Rejected {
                status: 400,
                body: "bad signature".to_string(),
            }
            .into());
        }
        Ok(format!("token-{}", n))
    }

    async fn rate_limit(&self, token: &str) -> Result<Quota, KlokError> {
        self.rate_limit_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen.lock().unwrap().push(token.to_string());
        if let Some(status) = self.quota_failures.lock().unwrap().pop_front() {
            return Err(KlokError::Quota {
                status,
                body: "{}".to_string(),
            });
        }
        let sent = self.sent();
        let remaining = match self.exhaust_after {
            Some(k) if sent >= k => 0,
            _ => self.initial_remaining.saturating_sub(sent as u64),
        };
        Ok(Quota {
            remaining,
            limit: self.limit,
            reset_at: None,
        })
    }

    async fn chat(
        &self,
        token: &str,
        thread_id: Uuid,
        question: &str,
    ) -> Result<ChatReply, KlokError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen.lock().unwrap().push(token.to_string());
        if let Some(status) = self.chat_failures.lock().unwrap().pop_front() {
            return Err(KlokError::SendMessage {
                status,
                body: "unauthorized".to_string(),
            });
        }
        self.threads.lock().unwrap().push(thread_id);
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(ChatReply {
            content: format!("answer to {}", question),
        })
    }
}

pub struct FixedQuestion(pub &'static str);

#[async_trait]
impl QuestionSource for FixedQuestion {
    async fn next_question(&self) -> String {
        self.0.to_string()
    }
}

/// Hands out numbered tokens, or fails when `fail` is set.
#[derive(Default)]
pub struct FakeCaptcha {
    pub fail: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl CaptchaProvider for FakeCaptcha {
    fn name(&self) -> &str {
        "fake"
    }

    async fn acquire(&self) -> Result<CaptchaToken, CaptchaError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail {
            return Err(CaptchaError::Timeout { attempts: 30 });
        }
        Ok(CaptchaToken::new(format!("captcha-{}", n)))
    }
}
