//! Per-command relay failures.

use crate::bridge::BridgeError;
use crate::model::envelope::{CommandEnvelope, EnvelopeId};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Terminal failure for one command. Never retried, never re-buffered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// Bridge rejected the action or payload shape.
    MalformedCommand {
        envelope_id: EnvelopeId,
        action: String,
        reason: String,
    },
    /// Bridge call returned an error.
    DeliveryFailed {
        envelope_id: EnvelopeId,
        action: String,
        message: String,
    },
}

impl RelayError {
    pub(crate) fn from_bridge(envelope: &CommandEnvelope, err: BridgeError) -> Self {
        Self::from_bridge_parts(envelope.id, envelope.action.clone(), err)
    }

    pub(crate) fn from_bridge_parts(
        envelope_id: EnvelopeId,
        action: String,
        err: BridgeError,
    ) -> Self {
        match err {
            BridgeError::Rejected { reason } => Self::MalformedCommand {
                envelope_id,
                action,
                reason,
            },
            BridgeError::Failed { message } => Self::DeliveryFailed {
                envelope_id,
                action,
                message,
            },
        }
    }

    pub fn envelope_id(&self) -> EnvelopeId {
        match self {
            Self::MalformedCommand { envelope_id, .. } | Self::DeliveryFailed { envelope_id, .. } => {
                *envelope_id
            }
        }
    }

    pub fn action(&self) -> &str {
        match self {
            Self::MalformedCommand { action, .. } | Self::DeliveryFailed { action, .. } => action,
        }
    }

    /// Stable error code used in logs and FFI responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedCommand { .. } => "malformed_command",
            Self::DeliveryFailed { .. } => "delivery_failed",
        }
    }
}

impl Display for RelayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedCommand { action, reason, .. } => {
                write!(f, "command `{action}` is malformed: {reason}")
            }
            Self::DeliveryFailed { action, message, .. } => {
                write!(f, "delivery of `{action}` failed: {message}")
            }
        }
    }
}

impl Error for RelayError {}
