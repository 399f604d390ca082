pub mod config;
pub mod error;
pub mod message;
pub mod sink;
pub mod toggle;

pub use config::SuzuConfig;
pub use error::ConfigError;
pub use message::{ChatMessage, OutboundAction};
pub use sink::ChatSink;
pub use toggle::{capability, FeatureToggle};
