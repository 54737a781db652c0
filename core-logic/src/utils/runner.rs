use crate::traits::{Worker, WorkerStats};
use crate::utils::schedule::{cycle_sleep, format_duration, sleep_or_cancel};
use anyhow::Result;
use std::time::Duration;
use tokio::signal;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Instrument};

/// Timing of the one-wallet-after-another mode.
#[derive(Debug, Clone, Copy)]
pub struct SequentialSchedule {
    /// Pause between two wallets of the same cycle.
    pub inter_worker_delay: Duration,
    /// Length of a full cycle over all wallets, measured from its start.
    pub cycle_target: Duration,
}

pub struct WorkerRunner;

impl WorkerRunner {
    /// Token that gets cancelled on Ctrl+C.
    pub fn shutdown_token() -> CancellationToken {
        let token = CancellationToken::new();
        let cloned_token = token.clone();

        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("🛑 Received Ctrl+C. Initiating graceful shutdown...");
                    cloned_token.cancel();
                }
                Err(err) => {
                    error!("Unable to listen for shutdown signal: {}", err);
                }
            }
        });

        token
    }

    /// Spawns every worker as its own task and waits for all of them.
    pub async fn run_concurrent(
        workers: Vec<Box<dyn Worker>>,
        token: CancellationToken,
    ) -> Result<WorkerStats> {
        let mut set = JoinSet::new();
        let start_time = Instant::now();
        info!("Starting {} workers concurrently...", workers.len());

        for mut worker in workers {
            let span = tracing::info_span!("worker", wallet_id = worker.label().to_string());
            let child_token = token.child_token();

            set.spawn(
                async move {
                    let label = worker.label().to_string();
                    match worker.run(child_token).await {
                        Ok(stats) => Ok(stats),
                        Err(e) => {
                            error!("Worker {} failed: {:?}", label, e);
                            Err(e)
                        }
                    }
                }
                .instrument(span),
            );
        }

        let mut total = WorkerStats::default();
        while let Some(res) = set.join_next().await {
            match res {
                Ok(Ok(stats)) => total += stats,
                Ok(Err(_)) => {
                    // Already logged in the task
                }
                Err(e) => {
                    error!("A worker task panicked or failed to join: {:?}", e);
                }
            }
        }

        Self::log_summary(start_time, total);
        Ok(total)
    }

    /// Drives the workers one cycle at a time, in order, then sleeps until
    /// the cycle target has passed. Repeats until cancelled, or stops after
    /// the first cycle when `once` is set.
    pub async fn run_sequential(
        workers: &mut [Box<dyn Worker>],
        token: CancellationToken,
        schedule: SequentialSchedule,
        once: bool,
    ) -> Result<WorkerStats> {
        let start_time = Instant::now();
        let mut total = WorkerStats::default();

        'cycles: loop {
            let cycle_start = Instant::now();
            info!(
                "🌟 New cycle started at {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
            );

            let count = workers.len();
            for (i, worker) in workers.iter_mut().enumerate() {
                if token.is_cancelled() {
                    break 'cycles;
                }
                info!(
                    "🔄 Processing wallet {} of {} ({})",
                    i + 1,
                    count,
                    worker.label()
                );

                match worker.run_cycle(token.clone()).await {
                    Ok(stats) => total += stats,
                    Err(e) => {
                        error!("Worker {} failed: {:?}", worker.label(), e);
                        total.failed += 1;
                    }
                }

                if i + 1 < count {
                    info!(
                        "😴 Sleeping {} before next wallet...",
                        format_duration(schedule.inter_worker_delay)
                    );
                    if !sleep_or_cancel(schedule.inter_worker_delay, &token).await {
                        break 'cycles;
                    }
                }
            }

            if once {
                break;
            }

            let wait = cycle_sleep(schedule.cycle_target, cycle_start.elapsed());
            if wait.is_zero() {
                info!("⚡ Cycle took longer than its target. Starting next cycle immediately.");
            } else {
                info!("⏰ Waiting {} until next cycle...", format_duration(wait));
            }
            if !sleep_or_cancel(wait, &token).await {
                break;
            }
        }

        Self::log_summary(start_time, total);
        Ok(total)
    }

    fn log_summary(start_time: Instant, total: WorkerStats) {
        let attempts = total.success + total.failed;
        let rate = if attempts > 0 {
            (total.success as f64 / attempts as f64) * 100.0
        } else {
            0.0
        };

        info!("🛑 Shutdown Complete.");
        info!(
            "Total Time: {:.1}s | Messages Sent: {} | Failures: {} | Success Rate: {:.2}%",
            start_time.elapsed().as_secs_f64(),
            total.success,
            total.failed,
            rate
        );
    }
}
