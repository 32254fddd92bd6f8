//! Time utilities for walksched
//!
//! All scheduling is done against wall-clock UTC instants: walks are
//! scheduled for a calendar time supplied by a client, not for an offset
//! from process start.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `WALKSCHED_MOCK_TIME` environment variable can be set
//! to override the system time for all time-sensitive operations. This is useful
//! for exercising late-request clamping against fixed client payloads.
//!
//! Format: RFC 3339 (e.g., `2025-12-25T14:30:00Z`)
//!
//! Example:
//! ```bash
//! WALKSCHED_MOCK_TIME="2025-12-25T14:30:00Z" cargo run -p walkschedd
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use std::sync::OnceLock;
use std::time::Duration;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "WALKSCHED_MOCK_TIME";

/// Cached mock time offset from the real time when the process started.
/// This allows mock time to advance naturally.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

/// Initialize the mock time offset based on the environment variable.
/// Returns the offset between mock time and real time at process start.
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                match parse_instant(&mock_time_str) {
                    Ok(mock_dt) => {
                        let offset = mock_dt.signed_duration_since(Utc::now());
                        tracing::info!(
                            mock_time = %mock_time_str,
                            offset_secs = offset.num_seconds(),
                            "Mock time enabled"
                        );
                        return Some(offset);
                    }
                    Err(e) => {
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            error = %e,
                            "Invalid mock time format"
                        );
                    }
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current UTC time, respecting mock time settings in debug builds.
///
/// In release builds, this always returns the real system time.
/// In debug builds, if `WALKSCHED_MOCK_TIME` is set, this returns a time
/// that advances from the mock time at the same rate as real time.
pub fn now() -> DateTime<Utc> {
    let real_now = Utc::now();

    if let Some(offset) = get_mock_time_offset() {
        real_now + offset
    } else {
        real_now
    }
}

/// Errors from parsing a client-supplied instant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid ISO-8601 instant '{value}': {reason}")]
pub struct InstantParseError {
    pub value: String,
    pub reason: String,
}

/// Parse an ISO-8601 / RFC 3339 instant into UTC.
///
/// Offsets are honoured (`2025-06-01T10:00:00+02:00` is 08:00 UTC). A
/// timestamp without an offset is read as UTC.
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>, InstantParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(InstantParseError {
            value: value.to_string(),
            reason: "empty".into(),
        });
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(InstantParseError {
        value: value.to_string(),
        reason: "expected a timestamp like 2025-06-01T10:00:00Z".into(),
    })
}

/// Move a requested instant forward when it is already in the past.
///
/// A request that arrives late still gets a near-immediate activation at
/// `now + lead` instead of being rejected. Instants at or after `now` are
/// returned untouched.
pub fn clamp_to_future(
    requested: DateTime<Utc>,
    now: DateTime<Utc>,
    lead: Duration,
) -> DateTime<Utc> {
    if requested < now {
        now + to_chrono(lead)
    } else {
        requested
    }
}

/// Time left until `at`, or zero if `at` is not in the future
pub fn saturating_duration_until(at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (at - now).to_std().unwrap_or(Duration::ZERO)
}

/// Convert a std duration to a chrono duration, saturating at chrono's maximum
pub fn to_chrono(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}

/// Helper to format durations in human-readable form
pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    #[test]
    fn test_now_returns_time() {
        let t = now();
        assert!(t.year() >= 2020);
        assert!(t.year() <= 2100);
    }

    #[test]
    fn test_mock_time_env_var_name() {
        assert_eq!(MOCK_TIME_ENV_VAR, "WALKSCHED_MOCK_TIME");
    }

    #[test]
    fn test_parse_instant_with_offsets() {
        let utc = parse_instant("2025-06-01T10:00:00Z").unwrap();
        assert_eq!(utc, Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap());

        let shifted = parse_instant("2025-06-01T10:00:00+02:00").unwrap();
        assert_eq!(shifted, Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap());

        let fractional = parse_instant("2025-06-01T10:00:00.250Z").unwrap();
        assert_eq!(fractional.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_parse_instant_without_offset_is_utc() {
        let naive = parse_instant("2025-06-01T10:00:00").unwrap();
        assert_eq!(naive, Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap());

        let minutes_only = parse_instant("2025-06-01T10:00").unwrap();
        assert_eq!(minutes_only, naive);
    }

    #[test]
    fn test_parse_instant_rejects_garbage() {
        let invalid = [
            "",
            "   ",
            "not a date",
            "2025-06-01",
            "14:30:00",
            "2025/06/01 10:00:00",
            "2025-13-01T10:00:00Z",
        ];

        for value in &invalid {
            assert!(
                parse_instant(value).is_err(),
                "Expected '{}' to fail parsing",
                value
            );
        }
    }

    #[test]
    fn test_clamp_past_instant() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        let ten_minutes_ago = now - chrono::Duration::minutes(10);

        let clamped = clamp_to_future(ten_minutes_ago, now, Duration::from_secs(60));
        assert_eq!(clamped, now + chrono::Duration::minutes(1));
    }

    #[test]
    fn test_clamp_keeps_future_instant() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        let later = now + chrono::Duration::seconds(30);

        assert_eq!(clamp_to_future(later, now, Duration::from_secs(60)), later);
        assert_eq!(clamp_to_future(now, now, Duration::from_secs(60)), now);
    }

    #[test]
    fn test_saturating_duration_until() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();

        assert_eq!(
            saturating_duration_until(now + chrono::Duration::seconds(90), now),
            Duration::from_secs(90)
        );
        assert_eq!(
            saturating_duration_until(now - chrono::Duration::seconds(90), now),
            Duration::ZERO
        );
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(300)), "5m 0s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m 1s");
    }

    #[test]
    fn test_mock_time_offset_calculation() {
        let mock_dt = parse_instant("2025-12-25T14:30:00Z").unwrap();
        let real_now = Utc::now();

        let offset = mock_dt.signed_duration_since(real_now);
        let simulated_now = real_now + offset;

        let diff = (simulated_now - mock_dt).num_seconds().abs();
        assert!(
            diff <= 1,
            "Expected simulated time to be within 1 second of mock time, got {} seconds difference",
            diff
        );
    }
}
