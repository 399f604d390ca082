use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SuzuConfig {
    pub bot: BotConfig,
    pub trend: TrendConfig,
    pub cooldown: CooldownConfig,
    pub greeting: GreetingConfig,
    pub callout: CalloutConfig,
    pub dizzy: DizzyConfig,
    /// Capability name -> channels it is enabled for. `"*"` enables a
    /// capability everywhere.
    pub features: HashMap<String, Vec<String>>,
}

impl SuzuConfig {
    /// Load config from a TOML file, falling back to defaults for missing
    /// fields. After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: SuzuConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if the file doesn't exist, return defaults with
    /// env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SUZU_CHANNEL") {
            self.bot.channel = v;
        }
        if let Ok(v) = std::env::var("SUZU_OWNER") {
            self.bot.owner = v;
        }
        if let Ok(v) = std::env::var("SUZU_COOLDOWN_SECS") {
            if let Ok(n) = v.parse() {
                self.cooldown.interval_secs = n;
            }
        }
        if let Ok(v) = std::env::var("SUZU_TREND_THRESHOLD") {
            if let Ok(n) = v.parse() {
                self.trend.threshold = n;
            }
        }
    }

    /// Check that a parsed config can actually drive the engine.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.bot.channel.is_empty() {
            return Err(ConfigError::MissingChannel);
        }
        if self.bot.owner.is_empty() {
            return Err(ConfigError::MissingOwner);
        }
        if self.trend.threshold < 1 {
            return Err(ConfigError::BadThreshold(self.trend.threshold));
        }
        for (field, value) in [
            ("trend.window_secs", self.trend.window_secs),
            ("cooldown.interval_secs", self.cooldown.interval_secs),
            ("dizzy.boarding_period_secs", self.dizzy.boarding_period_secs),
            ("dizzy.ban_period_secs", self.dizzy.ban_period_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroDuration { field });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Channel this instance serves. Each channel runs its own engine state.
    pub channel: String,
    /// User id allowed to start the dizzy game.
    pub owner: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            channel: "suzu_dev".to_string(),
            owner: "suzu_dev".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Tokens counted whenever they occur anywhere in a message.
    pub substring_tokens: Vec<String>,
    /// Tokens counted only when the whole message equals them.
    pub exact_tokens: Vec<String>,
    /// Window within which occurrences accumulate.
    pub window_secs: u64,
    /// Occurrences within the window needed to fire a response.
    pub threshold: i64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            substring_tokens: vec!["LUL".to_string(), "KEKW".to_string()],
            exact_tokens: vec!["777".to_string(), "888".to_string(), "555".to_string()],
            window_secs: 15,
            threshold: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    /// Minimum seconds between any two gated outbound messages.
    pub interval_secs: u64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GreetingConfig {
    /// Suppress all greetings in a channel for this long after any greeting.
    pub channel_ttl_secs: u64,
    /// Suppress re-greeting the same user for this long.
    pub user_ttl_secs: u64,
    /// How many recently greeted users to remember.
    pub user_capacity: usize,
    /// Appended after the `@name` mention.
    pub reply: String,
}

impl Default for GreetingConfig {
    fn default() -> Self {
        Self {
            channel_ttl_secs: 1800,
            user_ttl_secs: 86_400,
            user_capacity: 4096,
            reply: "安安 PokPikachu".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalloutConfig {
    /// Exact phrase that triggers the callout.
    pub phrase: String,
    pub reply: String,
    /// Per-channel suppression after a callout fires.
    pub ttl_secs: u64,
}

impl Default for CalloutConfig {
    fn default() -> Self {
        Self {
            phrase: "馬娘".to_string(),
            reply: "MrDestructoid SingsMic うまぴょい うまぴょい ShowOfHands".to_string(),
            ttl_secs: 600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DizzyConfig {
    /// How long the boarding window stays open.
    pub boarding_period_secs: u64,
    /// How long selected targets stay flagged.
    pub ban_period_secs: u64,
    /// Delay between a target's message and the mute it earns.
    pub mute_delay_secs: u64,
    /// Duration of each issued mute.
    pub mute_duration_secs: u64,
}

impl Default for DizzyConfig {
    fn default() -> Self {
        Self {
            boarding_period_secs: 60,
            ban_period_secs: 300,
            mute_delay_secs: 3,
            mute_duration_secs: 60,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
