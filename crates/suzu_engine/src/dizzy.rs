//! The dizzy mini-game
//!
//! A four-beat crowd game: the owner opens a boarding window, viewers join,
//! the game randomly flags a slice of the crowd, and the flagged users spend
//! the penalty window getting muted whenever they speak. Everything is driven
//! by two commands and a once-per-second tick.
//!
//! The machine is pure over explicit unix-second timestamps and returns
//! [`GameEvent`]s instead of performing I/O, so tests drive it without a
//! clock and the channel task decides how events reach chat.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Boarding,
    Penalty,
}

/// Emitted on a phase transition; the caller turns these into chat output
/// and target bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// Boarding opened; joins accepted until `until`.
    BoardingOpened { until: i64 },
    /// Boarding closed with nobody aboard.
    BoardingFailed,
    /// Targets picked; penalty runs until `until`.
    TargetsSelected { targets: Vec<String>, until: i64 },
    /// Penalty window over, targets unflagged.
    Released,
}

/// Participant-count cutoff below which exactly one target is picked.
const PROPORTIONAL_CUTOFF: usize = 20;

pub struct DizzyGame {
    boarding_period: i64,
    ban_period: i64,
    phase: Phase,
    /// 0 iff Idle.
    boarding_start: i64,
    penalty_end: i64,
    /// End of the most recent penalty; a new game cannot start before it
    /// has passed.
    last_penalty_end: i64,
    /// Join order preserved so selection indexes a stable list.
    participants: Vec<String>,
    ban_targets: HashSet<String>,
    rng: StdRng,
}

impl DizzyGame {
    pub fn new(boarding_period: u64, ban_period: u64) -> Self {
        Self::with_rng(boarding_period, ban_period, StdRng::from_entropy())
    }

    /// Deterministic variant for tests.
    pub fn with_rng(boarding_period: u64, ban_period: u64, rng: StdRng) -> Self {
        Self {
            boarding_period: boarding_period as i64,
            ban_period: ban_period as i64,
            phase: Phase::Idle,
            boarding_start: 0,
            penalty_end: 0,
            last_penalty_end: 0,
            participants: Vec::new(),
            ban_targets: HashSet::new(),
            rng,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn is_target(&self, user_id: &str) -> bool {
        self.ban_targets.contains(user_id)
    }

    /// Owner opens a boarding window. Anything but (owner, Idle, previous
    /// penalty fully elapsed) is a silent no-op: concurrent users racing the
    /// state machine are expected, not errors.
    pub fn start(&mut self, by_user: &str, is_owner: bool, now: i64) -> Option<GameEvent> {
        if !is_owner {
            tracing::debug!(by_user, "dizzy start rejected: not the channel owner");
            return None;
        }
        if self.phase != Phase::Idle {
            tracing::debug!(phase = ?self.phase, "dizzy start rejected: game already running");
            return None;
        }
        if now <= self.last_penalty_end {
            tracing::debug!("dizzy start rejected: previous penalty not yet elapsed");
            return None;
        }
        self.phase = Phase::Boarding;
        self.boarding_start = now;
        self.penalty_end = 0;
        self.participants.clear();
        self.ban_targets.clear();
        let until = now + self.boarding_period;
        tracing::info!(until, "dizzy boarding opened");
        Some(GameEvent::BoardingOpened { until })
    }

    /// Register a participant. Rejected (no state change) outside the
    /// boarding window or on a duplicate join.
    pub fn join(&mut self, user_id: &str, now: i64) -> bool {
        if self.phase != Phase::Boarding {
            return false;
        }
        if now > self.boarding_start + self.boarding_period {
            tracing::debug!(user_id, "dizzy join rejected: boarding window closed");
            return false;
        }
        if self.participants.iter().any(|p| p == user_id) {
            return false;
        }
        self.participants.push(user_id.to_string());
        true
    }

    /// Advance the game on the external one-second clock.
    pub fn tick(&mut self, now: i64) -> Option<GameEvent> {
        match self.phase {
            Phase::Idle => None,
            Phase::Boarding => {
                if now <= self.boarding_start + self.boarding_period {
                    return None;
                }
                if self.participants.is_empty() {
                    tracing::info!("dizzy boarding closed with no participants");
                    self.reset();
                    return Some(GameEvent::BoardingFailed);
                }
                let targets = self.select_targets();
                self.penalty_end = self.boarding_start + self.boarding_period + self.ban_period;
                self.phase = Phase::Penalty;
                self.ban_targets = targets.iter().cloned().collect();
                tracing::info!(?targets, until = self.penalty_end, "dizzy targets selected");
                Some(GameEvent::TargetsSelected {
                    targets,
                    until: self.penalty_end,
                })
            }
            Phase::Penalty => {
                if now <= self.penalty_end {
                    return None;
                }
                tracing::info!("dizzy penalty elapsed, releasing targets");
                self.last_penalty_end = self.penalty_end;
                self.reset();
                Some(GameEvent::Released)
            }
        }
    }

    /// Uniform sampling without replacement: one target for a small crowd,
    /// ceil(5%) once the crowd reaches the cutoff. Partial Fisher-Yates over
    /// an index list so the participant set itself stays ordered.
    fn select_targets(&mut self) -> Vec<String> {
        let n = self.participants.len();
        assert!(n > 0, "target selection entered with no participants");
        let count = if n < PROPORTIONAL_CUTOFF {
            1
        } else {
            // ceil(n * 0.05)
            (n + 19) / 20
        };
        let mut indices: Vec<usize> = (0..n).collect();
        for i in 0..count {
            let j = self.rng.gen_range(i..n);
            indices.swap(i, j);
        }
        indices[..count]
            .iter()
            .map(|&i| self.participants[i].clone())
            .collect()
    }

    fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.boarding_start = 0;
        self.penalty_end = 0;
        self.participants.clear();
        self.ban_targets.clear();
    }
}
