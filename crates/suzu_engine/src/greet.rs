//! Greeting dedupe
//!
//! Two independent suppression gates: a channel flag so the bot greets at
//! most once per channel window, and a user flag so a returning user is not
//! re-greeted within a day. Either flag alone suppresses.

use crate::expiring::ExpiringMap;
use std::time::{Duration, Instant};

pub struct GreetingDeduper {
    channels: ExpiringMap<()>,
    users: ExpiringMap<()>,
}

impl GreetingDeduper {
    pub fn new(channel_ttl: Duration, user_ttl: Duration, user_capacity: usize) -> Self {
        Self {
            channels: ExpiringMap::new(channel_ttl),
            users: ExpiringMap::with_max_len(user_ttl, user_capacity),
        }
    }

    pub fn should_greet(&self, channel: &str, user_id: &str) -> bool {
        self.should_greet_at(channel, user_id, Instant::now())
    }

    pub fn should_greet_at(&self, channel: &str, user_id: &str, now: Instant) -> bool {
        !self.channels.contains_at(channel, now) && !self.users.contains_at(user_id, now)
    }

    /// Record a greeting. Callers must invoke this after a positive
    /// `should_greet`, or the next message greets again.
    pub fn mark_greeted(&self, channel: &str, user_id: &str) {
        self.mark_greeted_at(channel, user_id, Instant::now());
    }

    pub fn mark_greeted_at(&self, channel: &str, user_id: &str, now: Instant) {
        self.channels.put_at(channel, (), now);
        self.users.put_at(user_id, (), now);
    }
}
