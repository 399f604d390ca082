//! Global output cooldown
//!
//! One slot, one interval: whoever acquires the slot first gets to speak,
//! everyone else stays quiet until the interval elapses. The check-then-set
//! runs under a mutex so two racing callers can never both observe "free"
//! and both send.
//!
//! The slot is consumed by acquisition, not by a successful send: a transport
//! failure after `try_acquire` does not refund the interval.

use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct CooldownGate {
    last_sent: Mutex<Option<Instant>>,
    interval: Duration,
}

impl CooldownGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            last_sent: Mutex::new(None),
            interval,
        }
    }

    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Claim the slot if it is free. Returns false while a previous
    /// acquisition is still inside the interval.
    pub fn try_acquire_at(&self, now: Instant) -> bool {
        let mut last = self.last_sent.lock().unwrap();
        match *last {
            Some(t) if now.duration_since(t) < self.interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// Run `emit` only when the slot can be claimed; report whether it ran.
    pub fn try_send<F: FnOnce()>(&self, emit: F) -> bool {
        if self.try_acquire() {
            emit();
            true
        } else {
            tracing::debug!("cooldown active, suppressing send");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_second_attempt_within_interval_blocked() {
        let gate = CooldownGate::new(Duration::from_secs(60));
        let now = Instant::now();
        assert!(gate.try_acquire_at(now));
        assert!(!gate.try_acquire_at(now));
        assert!(!gate.try_acquire_at(now + Duration::from_secs(59)));
    }

    #[test]
    fn test_reopens_after_interval() {
        let gate = CooldownGate::new(Duration::from_secs(60));
        let now = Instant::now();
        assert!(gate.try_acquire_at(now));
        assert!(gate.try_acquire_at(now + Duration::from_secs(60)));
    }

    #[test]
    fn test_try_send_runs_closure_only_when_open() {
        let gate = CooldownGate::new(Duration::from_secs(60));
        let count = AtomicUsize::new(0);
        assert!(gate.try_send(|| {
            count.fetch_add(1, Ordering::SeqCst);
        }));
        assert!(!gate.try_send(|| {
            count.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_callers_one_winner() {
        let gate = Arc::new(CooldownGate::new(Duration::from_secs(60)));
        let passed = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let gate = Arc::clone(&gate);
            let passed = Arc::clone(&passed);
            handles.push(std::thread::spawn(move || {
                if gate.try_acquire() {
                    passed.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(passed.load(Ordering::SeqCst), 1);
    }
}
