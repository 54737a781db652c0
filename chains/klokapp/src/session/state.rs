use crate::api::Quota;
use core_logic::cycle_sleep;
use std::time::Duration;

/// Per-account login state. Lives only in memory; the proxy is owned by
/// the account's HTTP client.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub(crate) fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn invalidate(&mut self) {
        self.token = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    Spending(Quota),
    Idle(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdlePolicy {
    /// Same pause after every cycle.
    Fixed(Duration),
    /// Pause until `target` has passed since the cycle started.
    Daily(Duration),
}

impl IdlePolicy {
    pub fn idle_for(&self, cycle_elapsed: Duration) -> Duration {
        match *self {
            IdlePolicy::Fixed(d) => d,
            IdlePolicy::Daily(target) => cycle_sleep(target, cycle_elapsed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    pub messages_per_cycle: u32,
    pub message_delay: Duration,
    pub retry_backoff: Duration,
    pub idle: IdlePolicy,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            messages_per_cycle: 10,
            message_delay: Duration::from_secs(5),
            retry_backoff: Duration::from_secs(60),
            idle: IdlePolicy::Fixed(Duration::from_secs(5 * 60)),
        }
    }
}
