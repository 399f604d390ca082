//! Per-channel engine context
//!
//! One `ChannelContext` per channel, mutated from exactly two sources: the
//! inbound message queue and the once-per-second tick. [`ChannelHandle::spawn`]
//! runs both in a single task with a `biased` select so every queued message
//! is handled before a tick fires — a join racing the boarding deadline lands
//! before the phase flips.
//!
//! All chat-visible output leaves through [`ChannelContext::emit`]; component
//! responses are cooldown-gated, game announcements go out immediately (see
//! DESIGN.md on the bypass choice).

use crate::callout::PhraseCallout;
use crate::cooldown::CooldownGate;
use crate::dizzy::{DizzyGame, GameEvent};
use crate::expiring::ExpiringMap;
use crate::greet::GreetingDeduper;
use crate::normalize::normalize;
use crate::trend::TrendDetector;
use std::sync::Arc;
use std::time::Duration;
use suzu_core::{capability, ChatMessage, ChatSink, FeatureToggle, SuzuConfig};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const START_COMMAND: &str = "!dizzy";
const JOIN_COMMAND: &str = "!join";

/// Extra seconds the recent-target set outlives the penalty window, beyond
/// the mute delay, so a deferred mute scheduled at the very last second of
/// the penalty still finds its entry.
const RECENT_TARGET_SLACK_SECS: u64 = 5;

/// Whether a send waits its turn behind the global cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Gated,
    Immediate,
}

pub struct ChannelContext {
    channel: String,
    owner: String,
    toggle: FeatureToggle,
    sink: Arc<dyn ChatSink>,
    gate: Arc<CooldownGate>,
    trend: TrendDetector,
    greeter: GreetingDeduper,
    callout: PhraseCallout,
    game: DizzyGame,
    /// Users flagged by the most recent selection. Its TTL covers the full
    /// penalty window plus the mute delay, so a mute scheduled moments
    /// before release still lands after the game has reset; the penalty is
    /// about the utterance, not the game phase.
    recent_targets: Arc<ExpiringMap<()>>,
    greeting_reply: String,
    mute_delay: Duration,
    mute_duration: u64,
}

impl ChannelContext {
    pub fn new(cfg: &SuzuConfig, sink: Arc<dyn ChatSink>) -> Self {
        Self::with_game(
            cfg,
            sink,
            DizzyGame::new(cfg.dizzy.boarding_period_secs, cfg.dizzy.ban_period_secs),
        )
    }

    /// Inject a pre-seeded game, used by tests for deterministic selection.
    pub fn with_game(cfg: &SuzuConfig, sink: Arc<dyn ChatSink>, game: DizzyGame) -> Self {
        Self {
            channel: cfg.bot.channel.clone(),
            owner: cfg.bot.owner.clone(),
            toggle: FeatureToggle::new(cfg.features.clone()),
            sink,
            gate: Arc::new(CooldownGate::new(Duration::from_secs(
                cfg.cooldown.interval_secs,
            ))),
            trend: TrendDetector::new(
                cfg.trend.substring_tokens.clone(),
                cfg.trend.exact_tokens.clone(),
                Duration::from_secs(cfg.trend.window_secs),
                cfg.trend.threshold,
            ),
            greeter: GreetingDeduper::new(
                Duration::from_secs(cfg.greeting.channel_ttl_secs),
                Duration::from_secs(cfg.greeting.user_ttl_secs),
                cfg.greeting.user_capacity,
            ),
            callout: PhraseCallout::new(
                cfg.callout.phrase.clone(),
                cfg.callout.reply.clone(),
                Duration::from_secs(cfg.callout.ttl_secs),
            ),
            game,
            recent_targets: Arc::new(ExpiringMap::new(Duration::from_secs(
                cfg.dizzy.ban_period_secs
                    + cfg.dizzy.mute_delay_secs
                    + RECENT_TARGET_SLACK_SECS,
            ))),
            greeting_reply: cfg.greeting.reply.clone(),
            mute_delay: Duration::from_secs(cfg.dizzy.mute_delay_secs),
            mute_duration: cfg.dizzy.mute_duration_secs,
        }
    }

    #[cfg(test)]
    fn recent_target_ttl(&self) -> Duration {
        self.recent_targets.ttl()
    }

    /// Handle one inbound chat message at unix time `now`.
    pub async fn handle_message(&mut self, msg: &ChatMessage, now: i64) {
        let text = normalize(&msg.text);

        if self.toggle.is_enabled(capability::DIZZY, &self.channel) {
            match text.as_ref() {
                START_COMMAND => {
                    let is_owner = msg.user_id == self.owner;
                    if let Some(ev) = self.game.start(&msg.user_id, is_owner, now) {
                        self.publish_game_event(ev).await;
                    }
                    return;
                }
                JOIN_COMMAND => {
                    self.game.join(&msg.user_id, now);
                    return;
                }
                _ => {}
            }
            if self.game.is_target(&msg.user_id) {
                self.schedule_mute(&msg.user_id);
            }
        }

        if self.toggle.is_enabled(capability::GREETING, &self.channel)
            && self.greeter.should_greet(&self.channel, &msg.user_id)
        {
            self.greeter.mark_greeted(&self.channel, &msg.user_id);
            let greeting = format!("@{} {}", msg.display_name, self.greeting_reply);
            self.emit(&greeting, Urgency::Gated).await;
        }

        if self.toggle.is_enabled(capability::TREND, &self.channel) {
            for fired in self.trend.classify(&text) {
                // Echo the trending token back, like the crowd does
                self.emit(&fired.token, Urgency::Gated).await;
            }
        }

        if self.toggle.is_enabled(capability::CALLOUT, &self.channel) {
            if let Some(reply) = self.callout.observe(&self.channel, &text) {
                let reply = format!("@{} {}", msg.display_name, reply);
                self.emit(&reply, Urgency::Gated).await;
            }
        }
    }

    /// Advance the game clock. Called once per second by the channel task.
    pub async fn tick(&mut self, now: i64) {
        if !self.toggle.is_enabled(capability::DIZZY, &self.channel) {
            return;
        }
        if let Some(ev) = self.game.tick(now) {
            self.publish_game_event(ev).await;
        }
    }

    async fn publish_game_event(&self, ev: GameEvent) {
        let text = match ev {
            GameEvent::BoardingOpened { until } => {
                format!("dizzy time! type {JOIN_COMMAND} to board (until {until})")
            }
            GameEvent::BoardingFailed => "nobody boarded, dizzy is cancelled BibleThump".to_string(),
            GameEvent::TargetsSelected { ref targets, until } => {
                for t in targets {
                    self.recent_targets.put(t, ());
                }
                let names: Vec<String> = targets.iter().map(|t| format!("@{t}")).collect();
                format!("{} got dizzy! quiet time until {until} MrDestructoid", names.join(" "))
            }
            GameEvent::Released => "dizzy is over, everyone is free again".to_string(),
        };
        self.emit(&text, Urgency::Immediate).await;
    }

    /// Issue a timed mute for a flagged user after a short delay, without
    /// blocking the message loop. The deferred task re-checks the
    /// recent-target set when it wakes, so a user unflagged longer than the
    /// ban period ago is spared.
    fn schedule_mute(&self, user_id: &str) {
        let sink = Arc::clone(&self.sink);
        let targets = Arc::clone(&self.recent_targets);
        let channel = self.channel.clone();
        let user_id = user_id.to_string();
        let delay = self.mute_delay;
        let duration = self.mute_duration;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !targets.contains(&user_id) {
                return;
            }
            if let Err(e) = sink.mute(&channel, &user_id, duration).await {
                tracing::warn!(user_id, error = %e, "mute failed");
            }
        });
    }

    async fn emit(&self, text: &str, urgency: Urgency) {
        if urgency == Urgency::Gated && !self.gate.try_acquire() {
            tracing::debug!("cooldown active, dropping response");
            return;
        }
        // The cooldown slot is spent either way; a transport failure does
        // not refund it.
        if let Err(e) = self.sink.send(&self.channel, text).await {
            tracing::warn!(error = %e, "send failed");
        }
    }
}

/// Running channel task: feed it messages, it does the rest.
pub struct ChannelHandle {
    tx: mpsc::Sender<ChatMessage>,
    task: JoinHandle<()>,
}

impl ChannelHandle {
    /// Spawn the channel loop: an mpsc message queue plus a one-second game
    /// tick, serialized in one task.
    pub fn spawn(cfg: &SuzuConfig, sink: Arc<dyn ChatSink>) -> Self {
        let mut ctx = ChannelContext::new(cfg, sink);
        let (tx, mut rx) = mpsc::channel::<ChatMessage>(64);
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                tokio::select! {
                    biased;

                    maybe = rx.recv() => match maybe {
                        Some(msg) => {
                            let now = chrono::Utc::now().timestamp();
                            ctx.handle_message(&msg, now).await;
                        }
                        None => break,
                    },
                    _ = interval.tick() => {
                        ctx.tick(chrono::Utc::now().timestamp()).await;
                    }
                }
            }
            tracing::info!("channel task shutting down");
        });
        Self { tx, task }
    }

    pub async fn deliver(&self, msg: ChatMessage) -> anyhow::Result<()> {
        self.tx
            .send(msg)
            .await
            .map_err(|e| anyhow::anyhow!("channel task gone: {}", e))
    }

    pub fn shutdown(self) {
        drop(self.tx);
        self.task.abort();
    }
}
