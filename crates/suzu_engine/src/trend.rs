//! Trend word detection
//!
//! Counts occurrences of configured tokens inside a sliding TTL window and
//! fires once when a token crosses the threshold. After firing, the counter
//! is parked at a large negative sentinel so the rest of the burst cannot
//! re-fire; the window's expiry resets the count naturally.
//!
//! Detection never sends anything. The caller routes fired tokens through
//! the cooldown gate, which keeps this independently testable.

use crate::expiring::ExpiringMap;
use std::time::{Duration, Instant};

/// Counter value after a fire. Far enough below any sane threshold that the
/// token stays quiet until its window expires, and far enough from i64::MIN
/// that further increments cannot overflow.
const RESET_SENTINEL: i64 = i64::MIN / 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Token occurred somewhere inside the message.
    Substring,
    /// Message was exactly the token.
    Exact,
}

/// A token whose counter crossed the threshold on this message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired {
    pub token: String,
    pub kind: MatchKind,
}

pub struct TrendDetector {
    substring_tokens: Vec<String>,
    exact_tokens: Vec<String>,
    threshold: i64,
    counters: ExpiringMap<i64>,
}

impl TrendDetector {
    pub fn new(
        substring_tokens: Vec<String>,
        exact_tokens: Vec<String>,
        window: Duration,
        threshold: i64,
    ) -> Self {
        Self {
            substring_tokens,
            exact_tokens,
            threshold,
            counters: ExpiringMap::new(window),
        }
    }

    pub fn classify(&self, message: &str) -> Vec<Fired> {
        self.classify_at(message, Instant::now())
    }

    /// Count `message` against every configured token and return the tokens
    /// that crossed the threshold right now.
    ///
    /// Substring and exact counters are keyed disjointly, so a message that
    /// satisfies both rules for the same literal counts (and fires) twice.
    pub fn classify_at(&self, message: &str, now: Instant) -> Vec<Fired> {
        let mut fired = Vec::new();

        for token in &self.substring_tokens {
            if message.contains(token.as_str()) {
                let key = format!("sub:{token}");
                if self.bump(&key, token, now) {
                    fired.push(Fired {
                        token: token.clone(),
                        kind: MatchKind::Substring,
                    });
                }
            }
        }

        for token in &self.exact_tokens {
            if message == token.as_str() {
                let key = format!("exact:{token}");
                if self.bump(&key, token, now) {
                    fired.push(Fired {
                        token: token.clone(),
                        kind: MatchKind::Exact,
                    });
                }
            }
        }

        fired
    }

    /// Increment one counter; on reaching the threshold, park it at the
    /// sentinel and report the fire.
    fn bump(&self, key: &str, token: &str, now: Instant) -> bool {
        let count = self.counters.increment_at(key, now);
        tracing::debug!(token, count, "trend counter");
        if count >= self.threshold {
            self.counters.put_at(key, RESET_SENTINEL, now);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(15);

    fn detector() -> TrendDetector {
        TrendDetector::new(
            vec!["LUL".to_string()],
            vec!["777".to_string()],
            WINDOW,
            3,
        )
    }

    #[test]
    fn test_burst_fires_exactly_once() {
        let d = detector();
        let now = Instant::now();
        let mut fires = 0;
        for _ in 0..10 {
            fires += d.classify_at("LUL", now).len();
        }
        assert_eq!(fires, 1);
    }

    #[test]
    fn test_no_immediate_refire_after_reset() {
        let d = detector();
        let now = Instant::now();
        d.classify_at("LUL", now);
        d.classify_at("LUL", now);
        assert_eq!(d.classify_at("LUL", now).len(), 1);
        // Sentinel holds the counter far below threshold
        assert!(d.classify_at("LUL", now).is_empty());
        assert!(d.classify_at("LUL", now).is_empty());
    }

    #[test]
    fn test_window_expiry_rearms() {
        let d = detector();
        let now = Instant::now();
        for _ in 0..3 {
            d.classify_at("LUL", now);
        }
        // After the window the sentinel evaporates and a fresh burst fires
        let later = now + Duration::from_secs(16);
        assert!(d.classify_at("LUL", later).is_empty());
        assert!(d.classify_at("LUL", later).is_empty());
        assert_eq!(d.classify_at("LUL", later).len(), 1);
    }

    #[test]
    fn test_trickle_within_window_fires() {
        let d = detector();
        let now = Instant::now();
        assert!(d.classify_at("LUL", now).is_empty());
        assert!(d.classify_at("LUL", now + Duration::from_secs(10)).is_empty());
        // Each occurrence slides the 15s window, so the third occurrence at
        // +20 still lands inside it and crosses the threshold.
        assert_eq!(d.classify_at("LUL", now + Duration::from_secs(20)).len(), 1);
    }

    #[test]
    fn test_trickle_slower_than_window_never_fires() {
        let d = detector();
        let mut now = Instant::now();
        // Gaps longer than the window: every occurrence restarts at 1
        for _ in 0..10 {
            assert!(d.classify_at("LUL", now).is_empty());
            now += Duration::from_secs(16);
        }
    }

    #[test]
    fn test_substring_matches_inside_message() {
        let d = detector();
        let now = Instant::now();
        d.classify_at("that was LUL worthy", now);
        d.classify_at("LULW", now);
        let fired = d.classify_at("LUL", now);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].kind, MatchKind::Substring);
    }

    #[test]
    fn test_exact_requires_whole_message() {
        let d = detector();
        let now = Instant::now();
        for _ in 0..5 {
            // "777" appears inside, but exact matching wants the whole text
            assert!(d.classify_at("hit 777 again", now).is_empty());
        }
        d.classify_at("777", now);
        d.classify_at("777", now);
        let fired = d.classify_at("777", now);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].kind, MatchKind::Exact);
    }

    #[test]
    fn test_same_literal_fires_both_rules_independently() {
        let d = TrendDetector::new(
            vec!["777".to_string()],
            vec!["777".to_string()],
            WINDOW,
            3,
        );
        let now = Instant::now();
        d.classify_at("777", now);
        d.classify_at("777", now);
        let fired = d.classify_at("777", now);
        assert_eq!(fired.len(), 2);
        assert!(fired.iter().any(|f| f.kind == MatchKind::Substring));
        assert!(fired.iter().any(|f| f.kind == MatchKind::Exact));
    }
}
