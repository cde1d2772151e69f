//! Voice command relay for the Pocketa expense tracker shell.
//! Delivers OS-triggered voice commands to the embedded app exactly once.

pub mod bridge;
pub mod config;
pub mod logging;
pub mod model;
pub mod relay;

pub use bridge::outbox::{AckMode, OutboundCommand, OutboxBridge};
pub use bridge::{ApplicationBridge, BridgeError, BridgeResult, InvokeOutcome, MethodCall};
pub use config::{ConfigError, RelayConfig, CHANNEL_ENV_VAR, DEFAULT_CHANNEL};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::envelope::{
    CommandEnvelope, CommandPayload, DeliveryKind, EnvelopeId, PayloadValue,
};
pub use model::launch_event::LaunchEvent;
pub use relay::error::RelayError;
pub use relay::report::{LogReporter, RelayEvent, RelayReporter};
pub use relay::{Completion, DispatchOutcome, IntentRelay, RelayPhase, RelayStatus};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
