//! Application bridge contracts.
//!
//! # Responsibility
//! - Define the named-method-call seam between the native shell relay and
//!   the embedded application logic.
//! - Define bridge-reported error kinds.
//!
//! # Invariants
//! - The relay calls `invoke` only after the bridge signalled readiness.
//! - At most one invocation is outstanding per relay at any time.
//!
//! # See also
//! - `crate::relay` for the readiness/buffering protocol.

use crate::model::envelope::{
    CommandEnvelope, CommandPayload, DeliveryKind, EnvelopeId, PayloadValue,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod outbox;

pub type BridgeResult<T> = Result<T, BridgeError>;

/// One named call handed to the bridge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodCall<'a> {
    /// Method name on the embedded side (the envelope action).
    pub method: &'a str,
    /// Primitive arguments (the envelope payload).
    pub arguments: &'a CommandPayload,
    /// Correlation ID, echoed back through deferred acknowledgements.
    pub envelope_id: EnvelopeId,
    /// Lifecycle path that produced the call.
    pub delivery_kind: DeliveryKind,
}

impl<'a> From<&'a CommandEnvelope> for MethodCall<'a> {
    fn from(envelope: &'a CommandEnvelope) -> Self {
        Self {
            method: envelope.action.as_str(),
            arguments: &envelope.payload,
            envelope_id: envelope.id,
            delivery_kind: envelope.delivery_kind,
        }
    }
}

/// Bridge-side result of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum InvokeOutcome {
    /// Handled within the call, with an optional primitive result.
    Completed(Option<PayloadValue>),
    /// Accepted for later processing; the bridge owner reports the result
    /// through `IntentRelay::on_delivery_complete`.
    Accepted,
}

/// Cross-runtime call channel to the embedded application logic.
///
/// Implementations must not panic; failures are returned as `BridgeError`.
pub trait ApplicationBridge {
    fn invoke(&mut self, call: MethodCall<'_>) -> BridgeResult<InvokeOutcome>;
}

/// Errors reported by the bridge for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Embedded side rejected the method or argument shape.
    Rejected { reason: String },
    /// Channel or handler failure.
    Failed { message: String },
}

impl BridgeError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

impl Display for BridgeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected { reason } => write!(f, "bridge rejected command: {reason}"),
            Self::Failed { message } => write!(f, "bridge call failed: {message}"),
        }
    }
}

impl Error for BridgeError {}
