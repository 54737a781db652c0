use anyhow::Result;
use async_trait::async_trait;
use std::ops::AddAssign;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub success: u64,
    pub failed: u64,
}

impl AddAssign for WorkerStats {
    fn add_assign(&mut self, other: Self) {
        self.success += other.success;
        self.failed += other.failed;
    }
}

/// One independently driven account.
///
/// A worker owns all of its mutable state, so the runner can move it into
/// its own task or drive several of them one after another.
#[async_trait]
pub trait Worker: Send {
    /// Short identifier used in log lines (e.g. `001`).
    fn label(&self) -> &str;

    /// Runs until the token is cancelled.
    async fn run(&mut self, cancellation_token: CancellationToken) -> Result<WorkerStats>;

    /// Runs exactly one cycle and returns what that cycle did.
    async fn run_cycle(&mut self, cancellation_token: CancellationToken) -> Result<WorkerStats>;
}
