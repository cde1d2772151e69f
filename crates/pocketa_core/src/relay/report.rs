//! Observable relay events and reporting sinks.
//!
//! # Invariants
//! - Reports are metadata-only: payload values never reach a log line.
//! - Reporting never fails and never affects relay state.

use crate::model::envelope::{DeliveryKind, EnvelopeId};
use crate::relay::error::RelayError;
use log::{debug, info, warn};

/// Everything the relay makes visible to telemetry.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    /// Lifecycle event carried no usable action.
    Ignored { delivery_kind: DeliveryKind },
    /// Envelope parked until the bridge can take it.
    Buffered {
        envelope_id: EnvelopeId,
        action: String,
        delivery_kind: DeliveryKind,
        payload_keys: String,
    },
    /// Pending envelope replaced by a newer one before delivery.
    CommandSuperseded {
        dropped: EnvelopeId,
        dropped_action: String,
        replacement: EnvelopeId,
    },
    /// Bridge finished handling the command.
    Delivered {
        envelope_id: EnvelopeId,
        action: String,
        delivery_kind: DeliveryKind,
    },
    /// Bridge accepted the command and will acknowledge later.
    InFlight {
        envelope_id: EnvelopeId,
        action: String,
    },
    DeliveryFailed { error: RelayError },
    /// First readiness signal from the bridge.
    BridgeReady { pending: bool },
    /// Repeated readiness signal, ignored.
    DuplicateBridgeReady,
    /// Completion for an envelope that is not in flight.
    StaleCompletion { envelope_id: EnvelopeId },
}

/// Sink for relay events.
pub trait RelayReporter {
    fn report(&mut self, event: &RelayEvent);
}

/// Default reporter: structured `event=... module=relay` log lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogReporter {
    channel: String,
}

impl LogReporter {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }
}

impl RelayReporter for LogReporter {
    fn report(&mut self, event: &RelayEvent) {
        let channel = self.channel.as_str();
        match event {
            RelayEvent::Ignored { delivery_kind } => debug!(
                "event=command_ignored module=relay status=ok channel={channel} kind={delivery_kind}"
            ),
            RelayEvent::Buffered {
                envelope_id,
                action,
                delivery_kind,
                payload_keys,
            } => info!(
                "event=command_buffered module=relay status=ok channel={channel} envelope_id={envelope_id} action={action} kind={delivery_kind} keys=[{payload_keys}]"
            ),
            RelayEvent::CommandSuperseded {
                dropped,
                dropped_action,
                replacement,
            } => info!(
                "event=command_superseded module=relay status=ok channel={channel} dropped_id={dropped} dropped_action={dropped_action} replacement_id={replacement}"
            ),
            RelayEvent::Delivered {
                envelope_id,
                action,
                delivery_kind,
            } => info!(
                "event=command_delivered module=relay status=ok channel={channel} envelope_id={envelope_id} action={action} kind={delivery_kind}"
            ),
            RelayEvent::InFlight {
                envelope_id,
                action,
            } => debug!(
                "event=command_in_flight module=relay status=ok channel={channel} envelope_id={envelope_id} action={action}"
            ),
            RelayEvent::DeliveryFailed { error } => warn!(
                "event=command_failed module=relay status=error channel={channel} envelope_id={} action={} code={} error={}",
                error.envelope_id(),
                error.action(),
                error.code(),
                error
            ),
            RelayEvent::BridgeReady { pending } => info!(
                "event=bridge_ready module=relay status=ok channel={channel} pending={pending}"
            ),
            RelayEvent::DuplicateBridgeReady => debug!(
                "event=bridge_ready_duplicate module=relay status=ok channel={channel}"
            ),
            RelayEvent::StaleCompletion { envelope_id } => warn!(
                "event=completion_stale module=relay status=error channel={channel} envelope_id={envelope_id}"
            ),
        }
    }
}
