use std::collections::HashMap;

/// Capability names consulted by the engine. Kept as constants so config
/// files and guard calls can't drift apart silently.
pub mod capability {
    pub const GREETING: &str = "greeting";
    pub const TREND: &str = "trend";
    pub const CALLOUT: &str = "callout";
    pub const DIZZY: &str = "dizzy";
}

/// Per-capability, per-channel feature gate.
///
/// Every optional behavior checks `is_enabled` explicitly at its entry point,
/// with the channel id passed as an ordinary argument. A capability name
/// missing from the configuration is a configuration error: it is logged and
/// the behavior is skipped, never raised.
#[derive(Debug, Clone, Default)]
pub struct FeatureToggle {
    capabilities: HashMap<String, Vec<String>>,
}

impl FeatureToggle {
    pub fn new(capabilities: HashMap<String, Vec<String>>) -> Self {
        Self { capabilities }
    }

    pub fn is_enabled(&self, capability: &str, channel: &str) -> bool {
        match self.capabilities.get(capability) {
            Some(channels) => {
                channels.iter().any(|c| c == "*" || c == channel)
            }
            None => {
                tracing::warn!(capability, "capability not present in feature config, skipping");
                false
            }
        }
    }
}
