use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Accounts with a larger daily limit than this are on a paid plan.
pub const FREE_TIER_LIMIT: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub remaining: u64,
    pub limit: u64,
    pub reset_at: Option<DateTime<Utc>>,
}

impl Quota {
    pub fn is_premium(&self) -> bool {
        self.limit > FREE_TIER_LIMIT
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Timezone-less layouts the service has used for `reset_time`, read as UTC.
const NAIVE_RESET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Raw `/rate-limit` body. Fields are left untyped because the service has
/// been seen sending numbers, numeric strings and nulls for all of them.
#[derive(Debug, Default, Deserialize)]
pub struct RateLimitResponse {
    #[serde(default)]
    pub remaining: Value,
    #[serde(default)]
    pub limit: Value,
    #[serde(default)]
    pub reset_time: Value,
}

impl RateLimitResponse {
    pub fn normalize(&self, now: DateTime<Utc>) -> Quota {
        Quota {
            remaining: count(&self.remaining),
            limit: count(&self.limit),
            reset_at: reset_at(&self.reset_time, now),
        }
    }
}

fn count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    }
}

fn reset_at(value: &Value, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_f64().and_then(|secs| after(now, secs)),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if let Ok(secs) = s.parse::<f64>() {
                return after(now, secs);
            }
            if let Ok(t) = DateTime::parse_from_rfc3339(s) {
                return Some(t.with_timezone(&Utc));
            }
            NAIVE_RESET_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|t| t.and_utc())
        }
        _ => None,
    }
}

/// `None` when the offset does not fit a timestamp.
fn after(now: DateTime<Utc>, secs: f64) -> Option<DateTime<Utc>> {
    // float-to-int casts saturate, so huge values land on i64::MAX
    let millis = (secs.max(0.0) * 1000.0) as i64;
    now.checked_add_signed(ChronoDuration::try_milliseconds(millis)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn parse(body: Value) -> Quota {
        serde_json::from_value::<RateLimitResponse>(body)
            .unwrap()
            .normalize(now())
    }

    #[test]
    fn numeric_fields() {
        let quota = parse(json!({"remaining": 7, "limit": 10, "reset_time": 3600}));
        assert_eq!(quota.remaining, 7);
        assert_eq!(quota.limit, 10);
        assert_eq!(quota.reset_at, Some(now() + ChronoDuration::hours(1)));
        assert!(!quota.is_premium());
    }

    #[test]
    fn hostile_values_become_zero() {
        let quota = parse(json!({"remaining": -3, "limit": "lots", "reset_time": null}));
        assert_eq!(quota.remaining, 0);
        assert_eq!(quota.limit, 0);
        assert_eq!(quota.reset_at, None);
        assert!(quota.is_exhausted());
    }

    #[test]
    fn missing_fields_become_zero() {
        let quota = parse(json!({}));
        assert_eq!(
            quota,
            Quota {
                remaining: 0,
                limit: 0,
                reset_at: None
            }
        );
    }

    #[test]
    fn timestamp_and_numeric_string_resets() {
        let quota = parse(json!({
            "remaining": "5",
            "limit": 50,
            "reset_time": "2025-01-02T00:00:00Z"
        }));
        assert_eq!(quota.remaining, 5);
        assert!(quota.is_premium());
        assert_eq!(
            quota.reset_at,
            Some(Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap())
        );

        let quota = parse(json!({"remaining": 1, "limit": 10, "reset_time": "60"}));
        assert_eq!(quota.reset_at, Some(now() + ChronoDuration::seconds(60)));
    }

    #[test]
    fn timezone_less_resets_are_utc() {
        let expected = Some(Utc.with_ymd_and_hms(2025, 1, 2, 6, 30, 0).unwrap());
        for raw in ["2025-01-02 06:30:00", "2025-01-02T06:30:00", "2025-01-02T06:30:00.000"] {
            let quota = parse(json!({"remaining": 1, "limit": 10, "reset_time": raw}));
            assert_eq!(quota.reset_at, expected, "{}", raw);
        }

        let quota = parse(json!({"remaining": 1, "limit": 10, "reset_time": "tomorrow"}));
        assert_eq!(quota.reset_at, None);
    }

    #[test]
    fn out_of_range_reset_is_dropped() {
        for body in [
            json!({"remaining": 5, "limit": 10, "reset_time": 1e13}),
            json!({"remaining": 5, "limit": 10, "reset_time": 1e300}),
            json!({"remaining": 5, "limit": 10, "reset_time": "1e300"}),
            json!({"remaining": 5, "limit": 10, "reset_time": "inf"}),
        ] {
            let quota = parse(body);
            assert_eq!(quota.remaining, 5);
            assert_eq!(quota.reset_at, None);
        }
    }
}
