//! Command envelope model.
//!
//! # Responsibility
//! - Define the unit of work flowing from lifecycle hooks to the bridge.
//! - Keep payload values restricted to bridge-transportable primitives.
//!
//! # Invariants
//! - `action` is non-empty and trimmed once an envelope exists.
//! - Every envelope carries a fresh `EnvelopeId`; ids are never reused.
//! - An envelope is handed to the bridge at most once.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Correlation ID for one extracted command.
///
/// Only used for logs, completion callbacks and supersession reports; the
/// bridge never sees it as part of the method arguments.
pub type EnvelopeId = Uuid;

/// Argument bag attached to a voice command.
///
/// `BTreeMap` keeps key order deterministic for logs and tests.
pub type CommandPayload = BTreeMap<String, PayloadValue>;

/// Primitive value transportable across the runtime boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for PayloadValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PayloadValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PayloadValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for PayloadValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Lifecycle path that produced an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryKind {
    /// Shell was created fresh; embedded logic may still be initializing.
    ColdStart,
    /// Shell was already running and received a new command.
    WarmStart,
}

impl DeliveryKind {
    /// Stable string id used in logs and FFI responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ColdStart => "cold_start",
            Self::WarmStart => "warm_start",
        }
    }
}

impl Display for DeliveryKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted voice command awaiting delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    /// Correlation ID minted at construction.
    pub id: EnvelopeId,
    /// Requested operation, opaque to the relay (e.g. `log-expense`).
    pub action: String,
    /// Command arguments; may be empty.
    pub payload: CommandPayload,
    /// Which lifecycle hook produced this envelope.
    pub delivery_kind: DeliveryKind,
}

impl CommandEnvelope {
    /// Creates an envelope with a generated correlation ID.
    ///
    /// Callers are expected to pass an already-normalized action; see
    /// `LaunchEvent::extract`.
    pub fn new(
        action: impl Into<String>,
        payload: CommandPayload,
        delivery_kind: DeliveryKind,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            action: action.into(),
            payload,
            delivery_kind,
        }
    }

    /// Comma-joined payload key names, for metadata-only logging.
    pub fn payload_keys(&self) -> String {
        self.payload
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}
