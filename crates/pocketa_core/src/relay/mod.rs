//! Intent relay: lifecycle hooks to application bridge.
//!
//! # Responsibility
//! - Extract voice commands from shell launch/resume events.
//! - Hand each command to the bridge exactly once, never before the bridge
//!   signalled readiness.
//!
//! # Invariants
//! - At most one pending envelope; a newer one replaces it and the
//!   replacement is reported as `CommandSuperseded`.
//! - At most one delivery in flight.
//! - `pending` is always empty while the relay is `Idle`.
//! - Failures are terminal for their command and never propagate to the
//!   shell as errors or panics.
//!
//! All operations take `&mut self`; the relay lives on the shell's lifecycle
//! thread and holds no locks.

use crate::bridge::{ApplicationBridge, BridgeResult, InvokeOutcome, MethodCall};
use crate::config::RelayConfig;
use crate::model::envelope::{CommandEnvelope, DeliveryKind, EnvelopeId, PayloadValue};
use crate::model::launch_event::LaunchEvent;
use log::warn;

pub mod error;
pub mod report;

use error::RelayError;
use report::{LogReporter, RelayEvent, RelayReporter};

/// Relay state machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayPhase {
    /// Bridge has not signalled readiness yet.
    AwaitingBridge,
    /// Bridge ready, nothing in flight.
    Idle,
    /// One command handed to the bridge and not yet acknowledged.
    Delivering { envelope_id: EnvelopeId },
}

/// What happened to the command extracted by one relay call.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// No usable action; nothing was extracted.
    Ignored,
    /// Parked in the pending slot, possibly replacing an older envelope.
    Buffered {
        envelope_id: EnvelopeId,
        superseded: Option<EnvelopeId>,
    },
    /// Bridge handled the command within the call.
    Delivered {
        envelope_id: EnvelopeId,
        result: Option<PayloadValue>,
    },
    /// Bridge accepted the command; acknowledgement pending.
    InFlight { envelope_id: EnvelopeId },
    /// Bridge reported an error; the command is dropped.
    Failed(RelayError),
}

impl DispatchOutcome {
    /// Envelope this outcome refers to, if one was extracted.
    pub fn envelope_id(&self) -> Option<EnvelopeId> {
        match self {
            Self::Ignored => None,
            Self::Buffered { envelope_id, .. }
            | Self::Delivered { envelope_id, .. }
            | Self::InFlight { envelope_id } => Some(*envelope_id),
            Self::Failed(error) => Some(error.envelope_id()),
        }
    }
}

/// Result of acknowledging an in-flight delivery.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    /// Final outcome of the acknowledged command; `None` for stale ids.
    pub settled: Option<DispatchOutcome>,
    /// Delivery of the command that was buffered behind it, if any.
    pub follow_up: Option<DispatchOutcome>,
}

/// Snapshot of relay state for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayStatus {
    pub phase: RelayPhase,
    pub bridge_ready: bool,
    pub pending: Option<EnvelopeId>,
    pub pending_action: Option<String>,
}

/// Single-slot relay between shell lifecycle hooks and the bridge.
pub struct IntentRelay<B, R = LogReporter> {
    bridge: B,
    reporter: R,
    phase: RelayPhase,
    bridge_ready: bool,
    pending: Option<CommandEnvelope>,
    in_flight: Option<CommandEnvelope>,
}

impl<B: ApplicationBridge> IntentRelay<B, LogReporter> {
    /// Creates a relay reporting through the log facade.
    pub fn new(config: &RelayConfig, bridge: B) -> Self {
        Self::with_reporter(bridge, LogReporter::new(config.channel.clone()))
    }
}

impl<B: ApplicationBridge, R: RelayReporter> IntentRelay<B, R> {
    pub fn with_reporter(bridge: B, reporter: R) -> Self {
        Self {
            bridge,
            reporter,
            phase: RelayPhase::AwaitingBridge,
            bridge_ready: false,
            pending: None,
            in_flight: None,
        }
    }

    /// Shell instance was created (cold start).
    ///
    /// Buffers the command while the bridge is not ready, else delivers it
    /// immediately.
    pub fn on_shell_created(&mut self, event: &LaunchEvent) -> DispatchOutcome {
        self.accept(event, DeliveryKind::ColdStart)
    }

    /// Running shell received a new command (warm start).
    ///
    /// Delivery is immediate when the bridge is idle. A resume before the
    /// readiness signal or during an in-flight delivery is buffered instead.
    pub fn on_shell_resumed(&mut self, event: &LaunchEvent) -> DispatchOutcome {
        if !self.bridge_ready && event.normalized_action().is_some() {
            warn!("event=resume_before_ready module=relay status=ok action=buffer");
        }
        self.accept(event, DeliveryKind::WarmStart)
    }

    /// Embedded logic finished initializing.
    ///
    /// Only the first call has an effect. Returns the delivery outcome of the
    /// pending envelope, if one was buffered.
    pub fn on_bridge_ready(&mut self) -> Option<DispatchOutcome> {
        if self.bridge_ready {
            self.reporter.report(&RelayEvent::DuplicateBridgeReady);
            return None;
        }

        self.bridge_ready = true;
        self.phase = RelayPhase::Idle;
        self.reporter.report(&RelayEvent::BridgeReady {
            pending: self.pending.is_some(),
        });

        let envelope = self.pending.take()?;
        Some(self.deliver(envelope))
    }

    /// Bridge owner acknowledges an `Accepted` invocation.
    ///
    /// A completion for any envelope other than the one in flight is ignored.
    pub fn on_delivery_complete(
        &mut self,
        envelope_id: EnvelopeId,
        result: BridgeResult<Option<PayloadValue>>,
    ) -> Completion {
        let Some(envelope) = self
            .in_flight
            .take_if(|envelope| envelope.id == envelope_id)
        else {
            self.reporter
                .report(&RelayEvent::StaleCompletion { envelope_id });
            return Completion::default();
        };

        self.phase = RelayPhase::Idle;
        let settled = match result {
            Ok(value) => self.settle_delivered(&envelope, value),
            Err(err) => self.settle_failed(RelayError::from_bridge(&envelope, err)),
        };
        let follow_up = self.pending.take().map(|next| self.deliver(next));

        Completion {
            settled: Some(settled),
            follow_up,
        }
    }

    pub fn phase(&self) -> RelayPhase {
        self.phase
    }

    pub fn is_bridge_ready(&self) -> bool {
        self.bridge_ready
    }

    pub fn pending(&self) -> Option<&CommandEnvelope> {
        self.pending.as_ref()
    }

    pub fn status(&self) -> RelayStatus {
        RelayStatus {
            phase: self.phase,
            bridge_ready: self.bridge_ready,
            pending: self.pending.as_ref().map(|envelope| envelope.id),
            pending_action: self.pending.as_ref().map(|envelope| envelope.action.clone()),
        }
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut B {
        &mut self.bridge
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    fn accept(&mut self, event: &LaunchEvent, delivery_kind: DeliveryKind) -> DispatchOutcome {
        let Some(envelope) = event.extract(delivery_kind) else {
            self.reporter.report(&RelayEvent::Ignored { delivery_kind });
            return DispatchOutcome::Ignored;
        };

        match self.phase {
            RelayPhase::Idle => self.deliver(envelope),
            RelayPhase::AwaitingBridge | RelayPhase::Delivering { .. } => self.buffer(envelope),
        }
    }

    fn buffer(&mut self, envelope: CommandEnvelope) -> DispatchOutcome {
        let envelope_id = envelope.id;
        self.reporter.report(&RelayEvent::Buffered {
            envelope_id,
            action: envelope.action.clone(),
            delivery_kind: envelope.delivery_kind,
            payload_keys: envelope.payload_keys(),
        });

        let superseded = self.pending.replace(envelope).map(|dropped| {
            self.reporter.report(&RelayEvent::CommandSuperseded {
                dropped: dropped.id,
                dropped_action: dropped.action,
                replacement: envelope_id,
            });
            dropped.id
        });

        DispatchOutcome::Buffered {
            envelope_id,
            superseded,
        }
    }

    fn deliver(&mut self, envelope: CommandEnvelope) -> DispatchOutcome {
        self.phase = RelayPhase::Delivering {
            envelope_id: envelope.id,
        };

        match self.bridge.invoke(MethodCall::from(&envelope)) {
            Ok(InvokeOutcome::Completed(result)) => {
                self.phase = RelayPhase::Idle;
                self.settle_delivered(&envelope, result)
            }
            Ok(InvokeOutcome::Accepted) => {
                let envelope_id = envelope.id;
                self.reporter.report(&RelayEvent::InFlight {
                    envelope_id,
                    action: envelope.action.clone(),
                });
                self.in_flight = Some(envelope);
                DispatchOutcome::InFlight { envelope_id }
            }
            Err(err) => {
                self.phase = RelayPhase::Idle;
                self.settle_failed(RelayError::from_bridge(&envelope, err))
            }
        }
    }

    fn settle_delivered(
        &mut self,
        envelope: &CommandEnvelope,
        result: Option<PayloadValue>,
    ) -> DispatchOutcome {
        self.reporter.report(&RelayEvent::Delivered {
            envelope_id: envelope.id,
            action: envelope.action.clone(),
            delivery_kind: envelope.delivery_kind,
        });
        DispatchOutcome::Delivered {
            envelope_id: envelope.id,
            result,
        }
    }

    fn settle_failed(&mut self, error: RelayError) -> DispatchOutcome {
        self.reporter.report(&RelayEvent::DeliveryFailed {
            error: error.clone(),
        });
        DispatchOutcome::Failed(error)
    }
}

#[cfg(test)]
mod tests {
    use super::{DispatchOutcome, IntentRelay, RelayPhase};
    use crate::bridge::{ApplicationBridge, BridgeResult, InvokeOutcome, MethodCall};
    use crate::config::RelayConfig;
    use crate::model::launch_event::LaunchEvent;

    #[derive(Default)]
    struct CountingBridge {
        calls: usize,
    }

    impl ApplicationBridge for CountingBridge {
        fn invoke(&mut self, _call: MethodCall<'_>) -> BridgeResult<InvokeOutcome> {
            self.calls += 1;
            Ok(InvokeOutcome::Completed(None))
        }
    }

    #[test]
    fn starts_awaiting_bridge_with_nothing_pending() {
        let relay = IntentRelay::new(&RelayConfig::default(), CountingBridge::default());
        assert_eq!(relay.phase(), RelayPhase::AwaitingBridge);
        assert!(!relay.is_bridge_ready());
        assert!(relay.pending().is_none());
    }

    #[test]
    fn ignored_event_keeps_phase() {
        let mut relay = IntentRelay::new(&RelayConfig::default(), CountingBridge::default());
        let outcome = relay.on_shell_created(&LaunchEvent::empty());
        assert_eq!(outcome, DispatchOutcome::Ignored);
        assert_eq!(outcome.envelope_id(), None);
        assert_eq!(relay.phase(), RelayPhase::AwaitingBridge);
    }

    #[test]
    fn resume_before_ready_is_buffered_not_delivered() {
        let mut relay = IntentRelay::new(&RelayConfig::default(), CountingBridge::default());
        let outcome = relay.on_shell_resumed(&LaunchEvent::with_action("log-expense"));
        assert!(matches!(outcome, DispatchOutcome::Buffered { superseded: None, .. }));
        assert_eq!(relay.bridge().calls, 0);

        relay.on_bridge_ready();
        assert_eq!(relay.bridge().calls, 1);
        assert_eq!(relay.phase(), RelayPhase::Idle);
    }

    #[test]
    fn status_exposes_pending_action() {
        let mut relay = IntentRelay::new(&RelayConfig::default(), CountingBridge::default());
        relay.on_shell_created(&LaunchEvent::with_action("log-expense"));
        let status = relay.status();
        assert_eq!(status.phase, RelayPhase::AwaitingBridge);
        assert_eq!(status.pending_action.as_deref(), Some("log-expense"));
        assert!(status.pending.is_some());
    }
}
