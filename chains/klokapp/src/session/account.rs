use super::state::{LoopSettings, Session, SessionState};
use crate::api::{KlokApi, Quota};
use crate::auth::{Credential, SignInTemplate};
use crate::captcha::CaptchaProvider;
use crate::error::KlokError;
use crate::questions::QuestionSource;
use anyhow::Result;
use async_trait::async_trait;
use core_logic::{format_duration, sleep_or_cancel, Worker, WorkerStats};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Characters of each reply shown in the log.
pub const REPLY_PREVIEW_CHARS: usize = 100;

/// Drives one credential through authenticate, quota, spend and idle.
pub struct AccountSession {
    label: String,
    prefix: String,
    credential: Credential,
    signin: SignInTemplate,
    api: Arc<dyn KlokApi>,
    captcha: Option<Arc<dyn CaptchaProvider>>,
    questions: Arc<dyn QuestionSource>,
    settings: LoopSettings,
    session: Session,
    rejected: bool,
    cycle_started: Instant,
    stats: WorkerStats,
}

impl AccountSession {
    /// `wallet_index` is zero-based; labels are one-based and zero-padded.
    pub fn new(
        wallet_index: usize,
        credential: Credential,
        api: Arc<dyn KlokApi>,
        questions: Arc<dyn QuestionSource>,
        settings: LoopSettings,
    ) -> Self {
        let label = format!("{:03}", wallet_index + 1);
        Self {
            prefix: format!("[WL:{}][P:000]", label),
            label,
            credential,
            signin: SignInTemplate::default(),
            api,
            captcha: None,
            questions,
            settings,
            session: Session::default(),
            rejected: false,
            cycle_started: Instant::now(),
            stats: WorkerStats::default(),
        }
    }

    /// Tags log lines with the proxy slot the account's client was built with.
    pub fn with_proxy_index(mut self, proxy_index: usize) -> Self {
        self.prefix = format!("[WL:{}][P:{:03}]", self.label, proxy_index + 1);
        self
    }

    pub fn with_captcha(mut self, provider: Arc<dyn CaptchaProvider>) -> Self {
        self.captcha = Some(provider);
        self
    }

    pub fn with_signin(mut self, template: SignInTemplate) -> Self {
        self.signin = template;
        self
    }

    pub fn log_prefix(&self) -> &str {
        &self.prefix
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Totals since the session was created.
    pub fn stats(&self) -> WorkerStats {
        self.stats
    }

    /// Performs the work of `state` and returns the state that follows.
    pub async fn step(&mut self, state: SessionState, cancel: &CancellationToken) -> SessionState {
        match state {
            SessionState::Unauthenticated => self.authenticate().await,
            SessionState::Authenticated => self.check_quota().await,
            SessionState::Spending(quota) => self.spend(quota, cancel).await,
            SessionState::Idle(duration) => self.idle(duration, cancel).await,
        }
    }

    async fn authenticate(&mut self) -> SessionState {
        info!(
            "{} 🔑 Connecting wallet {}",
            self.prefix,
            self.credential.checksum_address()
        );

        match self.login().await {
            Ok(token) => {
                self.session.set_token(token);
                info!("{} Success: wallet connected", self.prefix);
                SessionState::Authenticated
            }
            Err(e) => {
                error!("{} Failed: {}", self.prefix, e);
                self.backoff()
            }
        }
    }

    async fn login(&self) -> Result<String, KlokError> {
        let captcha = match &self.captcha {
            Some(provider) => {
                info!("{} 🧩 Requesting captcha via {}", self.prefix, provider.name());
                Some(provider.acquire().await.map_err(crate::error::AuthError::from)?)
            }
            None => None,
        };
        let login = self.signin.sign_in(&self.credential).await?;
        self.api.verify(&login, captcha.as_ref()).await
    }

    async fn check_quota(&mut self) -> SessionState {
        let Some(token) = self.session.token().map(str::to_string) else {
            return SessionState::Unauthenticated;
        };

        match self.api.rate_limit(&token).await {
            Ok(quota) => {
                self.log_quota(&quota);
                if quota.remaining > 0 {
                    SessionState::Spending(quota)
                } else {
                    match quota.reset_at {
                        Some(at) => info!("{} ⏳ No messages left, resets at {}", self.prefix, at),
                        None => info!("{} ⏳ No messages left", self.prefix),
                    }
                    self.rest()
                }
            }
            Err(e) => self.recover(e),
        }
    }

    async fn spend(&mut self, quota: Quota, cancel: &CancellationToken) -> SessionState {
        let Some(token) = self.session.token().map(str::to_string) else {
            return SessionState::Unauthenticated;
        };

        let planned = u64::from(self.settings.messages_per_cycle).min(quota.remaining);
        info!("{} 📝 Sending up to {} messages", self.prefix, planned);

        for i in 0..planned {
            if cancel.is_cancelled() {
                break;
            }
            if i > 0 {
                if !sleep_or_cancel(self.settings.message_delay, cancel).await {
                    break;
                }
                match self.api.rate_limit(&token).await {
                    Ok(current) if current.remaining == 0 => {
                        info!("{} ⏳ Quota exhausted after {} messages", self.prefix, i);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => return self.recover(e),
                }
            }

            let question = self.questions.next_question().await;
            let thread_id = Uuid::new_v4();
            info!("{} 💬 [{}/{}] {}", self.prefix, i + 1, planned, question);

            match self.api.chat(&token, thread_id, &question).await {
                Ok(reply) => {
                    self.stats.success += 1;
                    self.rejected = false;
                    info!(
                        "{} Success: {}",
                        self.prefix,
                        reply.preview(REPLY_PREVIEW_CHARS)
                    );
                }
                Err(e) => {
                    self.stats.failed += 1;
                    return self.recover(e);
                }
            }
        }

        match self.api.rate_limit(&token).await {
            Ok(left) => self.log_quota(&left),
            Err(e) => warn!("{} Could not read final quota: {}", self.prefix, e),
        }
        self.rest()
    }

    async fn idle(&mut self, duration: Duration, cancel: &CancellationToken) -> SessionState {
        if !duration.is_zero() {
            info!("{} 😴 Sleeping {}", self.prefix, format_duration(duration));
        }
        sleep_or_cancel(duration, cancel).await;
        self.session.invalidate();
        self.rejected = false;
        self.cycle_started = Instant::now();
        SessionState::Unauthenticated
    }

    /// Maps an error raised while authenticated to the next state.
    fn recover(&mut self, err: KlokError) -> SessionState {
        if err.is_unauthorized() {
            self.session.invalidate();
            if !self.rejected {
                self.rejected = true;
                warn!("{} Session rejected ({}), re-authenticating", self.prefix, err);
                return SessionState::Unauthenticated;
            }
            error!(
                "{} Failed: session rejected again right after login ({})",
                self.prefix, err
            );
            return self.backoff();
        }
        error!("{} Failed: {}", self.prefix, err);
        self.backoff()
    }

    fn backoff(&self) -> SessionState {
        info!(
            "{} Retrying in {}",
            self.prefix,
            format_duration(self.settings.retry_backoff)
        );
        SessionState::Idle(self.settings.retry_backoff)
    }

    fn rest(&self) -> SessionState {
        SessionState::Idle(self.settings.idle.idle_for(self.cycle_started.elapsed()))
    }

    fn log_quota(&self, quota: &Quota) {
        info!(
            "{} 📊 Quota {}/{} ({})",
            self.prefix,
            quota.remaining,
            quota.limit,
            if quota.is_premium() { "premium" } else { "free" }
        );
    }
}

#[async_trait]
impl Worker for AccountSession {
    fn label(&self) -> &str {
        &self.label
    }

    async fn run(&mut self, cancellation_token: CancellationToken) -> Result<WorkerStats> {
        let before = self.stats;
        self.cycle_started = Instant::now();
        let mut state = SessionState::Unauthenticated;

        while !cancellation_token.is_cancelled() {
            state = self.step(state, &cancellation_token).await;
        }

        info!("{} 🛑 Stopped", self.prefix);
        Ok(since(before, self.stats))
    }

    /// Runs until the session would go idle; the caller owns the pause.
    async fn run_cycle(&mut self, cancellation_token: CancellationToken) -> Result<WorkerStats> {
        let before = self.stats;
        self.cycle_started = Instant::now();
        self.rejected = false;
        let mut state = SessionState::Unauthenticated;

        while !cancellation_token.is_cancelled() {
            if let SessionState::Idle(_) = state {
                break;
            }
            state = self.step(state, &cancellation_token).await;
        }

        self.session.invalidate();
        Ok(since(before, self.stats))
    }
}

fn since(before: WorkerStats, now: WorkerStats) -> WorkerStats {
    WorkerStats {
        success: now.success - before.success,
        failed: now.failed - before.failed,
    }
}
