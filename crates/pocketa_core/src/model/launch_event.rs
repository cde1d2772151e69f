//! Launch/resume event as delivered by the OS.
//!
//! # Invariants
//! - A missing, empty or whitespace-only action means "no command".
//! - Extras are carried into the envelope verbatim.

use crate::model::envelope::{CommandEnvelope, CommandPayload, DeliveryKind, PayloadValue};

/// Intent-like event observed by the shell lifecycle hooks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaunchEvent {
    /// Requested action, if the shell was opened by a voice trigger.
    pub action: Option<String>,
    /// Opaque key-value data attached to the event.
    pub extras: CommandPayload,
}

impl LaunchEvent {
    /// Event with no action: the app was opened normally.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Event carrying an action and no extras.
    pub fn with_action(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            extras: CommandPayload::new(),
        }
    }

    /// Adds one extra entry (builder style).
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<PayloadValue>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    /// Returns the trimmed action, or `None` when no usable action is present.
    pub fn normalized_action(&self) -> Option<&str> {
        self.action
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Builds an envelope for this event if it carries an action.
    pub fn extract(&self, delivery_kind: DeliveryKind) -> Option<CommandEnvelope> {
        let action = self.normalized_action()?;
        Some(CommandEnvelope::new(
            action,
            self.extras.clone(),
            delivery_kind,
        ))
    }
}
