use thiserror::Error;

/// Validation failures for a loaded [`crate::SuzuConfig`].
///
/// File-not-found and TOML parse problems surface as `anyhow` errors from
/// `SuzuConfig::load`; this type covers configurations that parse fine but
/// cannot drive the engine.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("bot.channel must not be empty")]
    MissingChannel,

    #[error("bot.owner must not be empty")]
    MissingOwner,

    #[error("trend.threshold must be at least 1 (got {0})")]
    BadThreshold(i64),

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
}
