use anyhow::Result;
use async_trait::async_trait;
use core_logic::{SequentialSchedule, Worker, WorkerRunner, WorkerStats};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

struct CountingWorker {
    label: String,
    log: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

#[async_trait]
impl Worker for CountingWorker {
    fn label(&self) -> &str {
        &self.label
    }

    async fn run(&mut self, cancellation_token: CancellationToken) -> Result<WorkerStats> {
        let mut stats = WorkerStats::default();
        while !cancellation_token.is_cancelled() {
            stats += self.run_cycle(cancellation_token.clone()).await?;
            tokio::time::sleep(Duration::from_secs(10)).await;
        }
        Ok(stats)
    }

    async fn run_cycle(&mut self, _token: CancellationToken) -> Result<WorkerStats> {
        self.log.lock().unwrap().push(self.label.clone());
        if self.fail {
            anyhow::bail!("boom");
        }
        Ok(WorkerStats {
            success: 2,
            failed: 0,
        })
    }
}

fn workers(log: &Arc<Mutex<Vec<String>>>, failing: &[bool]) -> Vec<Box<dyn Worker>> {
    failing
        .iter()
        .enumerate()
        .map(|(i, fail)| {
            Box::new(CountingWorker {
                label: format!("{:03}", i + 1),
                log: log.clone(),
                fail: *fail,
            }) as Box<dyn Worker>
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_sequential_once_visits_each_worker_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut list = workers(&log, &[false, true, false]);
    let schedule = SequentialSchedule {
        inter_worker_delay: Duration::from_secs(30),
        cycle_target: Duration::from_secs(24 * 3600),
    };

    let start = Instant::now();
    let stats =
        WorkerRunner::run_sequential(&mut list, CancellationToken::new(), schedule, true)
            .await
            .unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["001", "002", "003"]);
    assert_eq!(stats, WorkerStats { success: 4, failed: 1 });
    // two inter-wallet pauses, no end-of-cycle wait
    assert!(start.elapsed() >= Duration::from_secs(60));
    assert!(start.elapsed() < Duration::from_secs(61));
}

#[tokio::test(start_paused = true)]
async fn test_sequential_waits_for_cycle_target_then_repeats() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut list = workers(&log, &[false]);
    let schedule = SequentialSchedule {
        inter_worker_delay: Duration::from_secs(30),
        cycle_target: Duration::from_secs(3600),
    };
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        // inside the third cycle
        tokio::time::sleep(Duration::from_secs(2 * 3600 + 10)).await;
        canceller.cancel();
    });

    let stats = WorkerRunner::run_sequential(&mut list, token, schedule, false)
        .await
        .unwrap();

    assert_eq!(log.lock().unwrap().len(), 3);
    assert_eq!(stats.success, 6);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_runs_all_until_cancelled() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let list = workers(&log, &[false, false]);
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(15)).await;
        canceller.cancel();
    });

    let stats = WorkerRunner::run_concurrent(list, token).await.unwrap();

    let seen = log.lock().unwrap().clone();
    assert!(seen.contains(&"001".to_string()));
    assert!(seen.contains(&"002".to_string()));
    assert_eq!(stats.success, 2 * seen.len() as u64);
}
