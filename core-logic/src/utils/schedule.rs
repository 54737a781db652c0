use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Sleeps for `duration` unless the token fires first.
///
/// Returns `true` when the full duration elapsed and `false` when the sleep
/// was cut short by cancellation.
pub async fn sleep_or_cancel(duration: Duration, token: &CancellationToken) -> bool {
    if token.is_cancelled() {
        return false;
    }
    if duration.is_zero() {
        return true;
    }
    tokio::select! {
        _ = token.cancelled() => false,
        _ = sleep(duration) => true,
    }
}

/// Time left in a cycle of length `target` after `elapsed` has been spent.
/// Never negative: an overrun cycle yields zero and the next one starts now.
pub fn cycle_sleep(target: Duration, elapsed: Duration) -> Duration {
    target.saturating_sub(elapsed)
}

/// `1h 02m 03s` style rendering for log lines.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(Duration::from_secs(5)), "5s");
        assert_eq!(format_duration(Duration::from_secs(300)), "5m 00s");
        assert_eq!(format_duration(Duration::from_secs(3723)), "1h 02m 03s");
    }
}
