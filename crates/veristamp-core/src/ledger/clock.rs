//! Ledger-assigned certification timestamps

use chrono::{DateTime, TimeZone, Utc};

/// Timestamp for the next certificate a ledger creates.
///
/// Millisecond precision, strictly after `last` even when the wall clock
/// stalls or steps backwards.
pub fn next_certified_at(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    let now_ms = now.timestamp_millis();
    let ms = match last {
        Some(prev) if prev.timestamp_millis() >= now_ms => prev.timestamp_millis() + 1,
        _ => now_ms,
    };
    Utc.timestamp_millis_opt(ms).single().unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_timestamp_is_now_truncated_to_millis() {
        let now = Utc.timestamp_nanos(1_700_000_000_123_456_789);
        let t = next_certified_at(None, now);
        assert_eq!(t.timestamp_millis(), 1_700_000_000_123);
    }

    #[test]
    fn test_stalled_clock_still_advances() {
        let now = Utc.timestamp_millis_opt(5_000).unwrap();
        let first = next_certified_at(None, now);
        let second = next_certified_at(Some(first), now);
        assert!(second > first);
    }

    #[test]
    fn test_clock_stepping_backwards_still_advances() {
        let last = Utc.timestamp_millis_opt(10_000).unwrap();
        let earlier = Utc.timestamp_millis_opt(9_000).unwrap();
        assert_eq!(next_certified_at(Some(last), earlier).timestamp_millis(), 10_001);
    }
}
