//! Engine timing windows (normative defaults).

use serde::{Deserialize, Serialize};

use crate::time::{HOUR_MS, MINUTE_MS, Timestamp};

/// Timing windows used by classification and the active table.
///
/// Values are in milliseconds to match `Timestamp`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Windows {
    /// A closing record whose end lies within this distance of the issue
    /// time expires (EXP) rather than being cancelled.
    pub expiration_ms: i64,
    /// A record stays in play until its end plus this window.
    pub purge_ms: i64,
    /// NEW starts in the past are clipped to the issue time; one older than
    /// this is logged as stale first.
    pub pending_ms: i64,
}

impl Default for Windows {
    fn default() -> Self {
        Self {
            expiration_ms: 30 * MINUTE_MS,
            purge_ms: 3 * HOUR_MS,
            pending_ms: 30 * MINUTE_MS,
        }
    }
}

impl Windows {
    /// True while a record ending at `end` is still part of the in-play state.
    pub fn in_play(&self, end: Timestamp, at: Timestamp) -> bool {
        at < end.saturating_add_ms(self.purge_ms)
    }

    /// True when `end` is close enough to `at` for a closure to be EXP.
    pub fn expires(&self, end: Timestamp, at: Timestamp) -> bool {
        !end.is_ufn() && end.distance_ms(at) <= self.expiration_ms
    }

    /// True when a proposed `start` lies further in the past than the pending window.
    pub fn stale_start(&self, start: Timestamp, at: Timestamp) -> bool {
        start < at && at.millis().saturating_sub(start.millis()) > self.pending_ms
    }

    /// True when `end` passed so long ago that no closure is emitted at all.
    pub fn long_gone(&self, end: Timestamp, at: Timestamp) -> bool {
        end < at && at.millis().saturating_sub(end.millis()) > self.expiration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_operational_windows() {
        let w = Windows::default();
        assert_eq!(w.expiration_ms, 30 * MINUTE_MS);
        assert_eq!(w.purge_ms, 3 * HOUR_MS);
    }

    #[test]
    fn expiration_is_symmetric_around_issue_time() {
        let w = Windows::default();
        let at = Timestamp::from_millis(10 * HOUR_MS);
        assert!(w.expires(at.saturating_add_ms(30 * MINUTE_MS), at));
        assert!(w.expires(at.saturating_sub_ms(30 * MINUTE_MS), at));
        assert!(!w.expires(at.saturating_add_ms(31 * MINUTE_MS), at));
        assert!(!w.expires(Timestamp::MAX, at));
        assert!(w.long_gone(at.saturating_sub_ms(31 * MINUTE_MS), at));
        assert!(!w.long_gone(at.saturating_sub_ms(30 * MINUTE_MS), at));
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let w: Windows = serde_json::from_str(r#"{"purge_ms": 60000}"#).unwrap();
        assert_eq!(w.purge_ms, 60_000);
        assert_eq!(w.expiration_ms, 30 * MINUTE_MS);
    }
}
