//! Loopback bridge backed by an in-process outbox.
//!
//! The embedded UI engine cannot be called into directly from native code in
//! this build, so invocations are queued here and drained by the engine on
//! its own schedule.
//!
//! # Invariants
//! - Outbox order equals invocation order (FIFO).
//! - A rejected invocation is never enqueued.

use crate::bridge::{ApplicationBridge, BridgeError, BridgeResult, InvokeOutcome, MethodCall};
use crate::config::RelayConfig;
use crate::model::envelope::{CommandPayload, DeliveryKind, EnvelopeId};
use std::collections::{BTreeSet, VecDeque};

/// When the outbox acknowledges an enqueued invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckMode {
    /// Enqueue counts as completion.
    Immediate,
    /// Engine confirms later via `IntentRelay::on_delivery_complete`.
    Deferred,
}

/// Command waiting in the outbox for the embedded engine.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundCommand {
    pub channel: String,
    pub method: String,
    pub arguments: CommandPayload,
    pub envelope_id: EnvelopeId,
    pub delivery_kind: DeliveryKind,
}

/// In-process `ApplicationBridge` implementation.
#[derive(Debug)]
pub struct OutboxBridge {
    channel: String,
    ack_mode: AckMode,
    allowed_methods: Option<BTreeSet<String>>,
    outbox: VecDeque<OutboundCommand>,
}

impl OutboxBridge {
    pub fn new(channel: impl Into<String>, ack_mode: AckMode) -> Self {
        Self {
            channel: channel.into(),
            ack_mode,
            allowed_methods: None,
            outbox: VecDeque::new(),
        }
    }

    /// Outbox tagged with the configured platform channel.
    pub fn from_config(config: &RelayConfig, ack_mode: AckMode) -> Self {
        Self::new(config.channel.clone(), ack_mode)
    }

    /// Restricts accepted method names; other methods are rejected.
    pub fn allow_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_methods = Some(methods.into_iter().map(Into::into).collect());
        self
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn ack_mode(&self) -> AckMode {
        self.ack_mode
    }

    pub fn len(&self) -> usize {
        self.outbox.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outbox.is_empty()
    }

    /// Removes and returns all queued commands in invocation order.
    pub fn drain(&mut self) -> Vec<OutboundCommand> {
        self.outbox.drain(..).collect()
    }
}

impl ApplicationBridge for OutboxBridge {
    fn invoke(&mut self, call: MethodCall<'_>) -> BridgeResult<InvokeOutcome> {
        if let Some(allowed) = &self.allowed_methods {
            if !allowed.contains(call.method) {
                return Err(BridgeError::rejected(format!(
                    "method `{}` is not handled on channel `{}`",
                    call.method, self.channel
                )));
            }
        }

        self.outbox.push_back(OutboundCommand {
            channel: self.channel.clone(),
            method: call.method.to_string(),
            arguments: call.arguments.clone(),
            envelope_id: call.envelope_id,
            delivery_kind: call.delivery_kind,
        });

        Ok(match self.ack_mode {
            AckMode::Immediate => InvokeOutcome::Completed(None),
            AckMode::Deferred => InvokeOutcome::Accepted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AckMode, OutboxBridge};
    use crate::bridge::{ApplicationBridge, BridgeError, InvokeOutcome, MethodCall};
    use crate::config::RelayConfig;
    use crate::model::envelope::{CommandEnvelope, CommandPayload, DeliveryKind, PayloadValue};

    fn envelope(action: &str) -> CommandEnvelope {
        let mut payload = CommandPayload::new();
        payload.insert("amount".to_string(), PayloadValue::Float(3.0));
        CommandEnvelope::new(action, payload, DeliveryKind::WarmStart)
    }

    #[test]
    fn immediate_mode_completes_and_queues_in_order() {
        let mut bridge = OutboxBridge::new("voice", AckMode::Immediate);
        let first = envelope("log-expense");
        let second = envelope("show-summary");

        let outcome = bridge
            .invoke(MethodCall::from(&first))
            .expect("first invoke should succeed");
        assert_eq!(outcome, InvokeOutcome::Completed(None));
        bridge
            .invoke(MethodCall::from(&second))
            .expect("second invoke should succeed");

        let drained = bridge.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].method, "log-expense");
        assert_eq!(drained[0].channel, "voice");
        assert_eq!(drained[0].envelope_id, first.id);
        assert_eq!(drained[1].method, "show-summary");
        assert!(bridge.is_empty());
    }

    #[test]
    fn deferred_mode_reports_accepted() {
        let mut bridge = OutboxBridge::new("voice", AckMode::Deferred);
        let outcome = bridge
            .invoke(MethodCall::from(&envelope("log-expense")))
            .expect("invoke should succeed");
        assert_eq!(outcome, InvokeOutcome::Accepted);
        assert_eq!(bridge.len(), 1);
    }

    #[test]
    fn allow_list_rejects_unknown_methods_without_queueing() {
        let mut bridge =
            OutboxBridge::new("voice", AckMode::Immediate).allow_methods(["log-expense"]);
        let err = bridge
            .invoke(MethodCall::from(&envelope("delete-everything")))
            .expect_err("unknown method must be rejected");
        assert!(matches!(err, BridgeError::Rejected { .. }));
        assert!(bridge.is_empty());
    }

    #[test]
    fn from_config_uses_configured_channel() {
        let config = RelayConfig {
            channel: "com.example.pocketa/assistant".to_string(),
        };
        let mut bridge = OutboxBridge::from_config(&config, AckMode::Deferred);
        assert_eq!(bridge.channel(), config.channel);
        assert_eq!(bridge.ack_mode(), AckMode::Deferred);

        bridge
            .invoke(MethodCall::from(&envelope("log-expense")))
            .expect("invoke should succeed");
        assert_eq!(bridge.drain()[0].channel, config.channel);
    }
}
