use core_logic::{cycle_sleep, sleep_or_cancel};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[test]
fn test_cycle_sleep_is_target_minus_elapsed() {
    let elapsed = Duration::from_secs(3 * 60 * 60);
    assert_eq!(cycle_sleep(DAY, elapsed), Duration::from_secs(21 * 60 * 60));
}

#[test]
fn test_cycle_sleep_never_negative() {
    assert_eq!(cycle_sleep(DAY, DAY), Duration::ZERO);
    assert_eq!(cycle_sleep(DAY, DAY * 2), Duration::ZERO);
}

#[test]
fn test_cycle_sleep_full_target_when_nothing_elapsed() {
    assert_eq!(cycle_sleep(DAY, Duration::ZERO), DAY);
}

#[tokio::test(start_paused = true)]
async fn test_sleep_completes_without_cancellation() {
    let token = CancellationToken::new();
    let start = Instant::now();

    assert!(sleep_or_cancel(Duration::from_secs(300), &token).await);
    assert!(start.elapsed() >= Duration::from_secs(300));
}

#[tokio::test(start_paused = true)]
async fn test_sleep_interrupted_by_cancellation() {
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        canceller.cancel();
    });

    let start = Instant::now();
    assert!(!sleep_or_cancel(DAY, &token).await);
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_sleep_on_cancelled_token_returns_immediately() {
    let token = CancellationToken::new();
    token.cancel();
    assert!(!sleep_or_cancel(DAY, &token).await);
}
