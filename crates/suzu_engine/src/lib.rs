//! The suzu decision engine.
//!
//! Everything here is a pure in-process component: messages come in through
//! [`channel::ChannelHandle`], chat-visible output leaves through the
//! [`suzu_core::ChatSink`] the caller injects. Each channel owns its own
//! instances of every component; nothing in this crate is a global.

pub mod callout;
pub mod channel;
pub mod cooldown;
pub mod dizzy;
pub mod expiring;
pub mod greet;
pub mod normalize;
pub mod trend;

pub use callout::PhraseCallout;
pub use channel::{ChannelContext, ChannelHandle};
pub use cooldown::CooldownGate;
pub use dizzy::{DizzyGame, GameEvent, Phase};
pub use expiring::ExpiringMap;
pub use greet::GreetingDeduper;
pub use normalize::normalize;
pub use trend::{Fired, MatchKind, TrendDetector};
