//! Phrase callout
//!
//! A single configured phrase that earns a fixed reply, at most once per
//! channel per TTL. Unlike the trend detector there is no counting: the
//! first sighting fires, then the channel goes quiet for the TTL.

use crate::expiring::ExpiringMap;
use std::time::{Duration, Instant};

pub struct PhraseCallout {
    phrase: String,
    reply: String,
    recent: ExpiringMap<()>,
}

impl PhraseCallout {
    pub fn new(phrase: String, reply: String, ttl: Duration) -> Self {
        Self {
            phrase,
            reply,
            recent: ExpiringMap::new(ttl),
        }
    }

    pub fn observe(&self, channel: &str, message: &str) -> Option<&str> {
        self.observe_at(channel, message, Instant::now())
    }

    /// Return the reply when `message` is exactly the phrase and the channel
    /// hasn't heard it within the TTL.
    pub fn observe_at(&self, channel: &str, message: &str, now: Instant) -> Option<&str> {
        if message != self.phrase {
            return None;
        }
        if self.recent.contains_at(channel, now) {
            tracing::debug!(channel, "callout still cooling down");
            return None;
        }
        self.recent.put_at(channel, (), now);
        Some(&self.reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn callout() -> PhraseCallout {
        PhraseCallout::new(
            "馬娘".to_string(),
            "うまぴょい".to_string(),
            Duration::from_secs(600),
        )
    }

    #[test]
    fn test_fires_once_per_ttl() {
        let c = callout();
        let now = Instant::now();
        assert_eq!(c.observe_at("chan", "馬娘", now), Some("うまぴょい"));
        assert_eq!(c.observe_at("chan", "馬娘", now), None);
        let later = now + Duration::from_secs(601);
        assert_eq!(c.observe_at("chan", "馬娘", later), Some("うまぴょい"));
    }

    #[test]
    fn test_requires_exact_phrase() {
        let c = callout();
        let now = Instant::now();
        assert_eq!(c.observe_at("chan", "馬娘!", now), None);
        assert_eq!(c.observe_at("chan", "馬", now), None);
    }

    #[test]
    fn test_channels_independent() {
        let c = callout();
        let now = Instant::now();
        assert!(c.observe_at("a", "馬娘", now).is_some());
        assert!(c.observe_at("b", "馬娘", now).is_some());
    }
}
