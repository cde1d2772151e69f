//! FFI relay API for the Flutter engine and the native shell.
//!
//! # Responsibility
//! - Expose the process-wide voice command relay to Dart via FRB.
//! - Convert relay outcomes into stable response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Exactly one relay exists per process; it is created lazily.
//! - A malformed payload never reaches the relay.
//!
//! Shell lifecycle hooks call `relay_on_shell_created` /
//! `relay_on_shell_resumed`. The Dart side calls `relay_on_bridge_ready`
//! once its method handlers are registered, drains commands with
//! `relay_drain_commands`, and acknowledges each with
//! `relay_complete_delivery`.

use crate::payload::{decode_payload, encode_payload};
use log::{info, warn};
use pocketa_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AckMode, BridgeError, CommandPayload, Completion, DispatchOutcome, EnvelopeId, IntentRelay,
    LaunchEvent, OutboundCommand, OutboxBridge, RelayConfig, RelayPhase,
};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

type ShellRelay = IntentRelay<OutboxBridge>;

static RELAY: OnceLock<Mutex<ShellRelay>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Response code mirroring the platform intent-response contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayResponseCode {
    /// Bridge handled the command.
    Success,
    /// Parked until the bridge is ready or idle.
    Buffered,
    /// Handed to the bridge, acknowledgement pending.
    InProgress,
    /// No voice command in the event.
    Ignored,
    /// Command dropped (bad payload or bridge error).
    Failure,
}

/// Outcome envelope for one relay call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    pub code: RelayResponseCode,
    /// Envelope ID in string form when a command was extracted.
    pub envelope_id: Option<String>,
    /// Human-readable message for diagnostics.
    pub message: String,
}

impl RelayResponse {
    fn ignored(message: impl Into<String>) -> Self {
        Self {
            code: RelayResponseCode::Ignored,
            envelope_id: None,
            message: message.into(),
        }
    }

    fn failure(envelope_id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            code: RelayResponseCode::Failure,
            envelope_id,
            message: message.into(),
        }
    }
}

/// Response for one acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayCompletionResponse {
    /// Final state of the acknowledged command.
    pub settled: RelayResponse,
    /// Delivery of the next buffered command, if one was waiting.
    pub follow_up: Option<RelayResponse>,
}

/// Command drained from the outbox for Dart-side handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayCommand {
    pub channel: String,
    pub method: String,
    /// JSON object of primitive arguments.
    pub payload_json: String,
    pub envelope_id: String,
    /// `cold_start|warm_start`.
    pub delivery_kind: String,
}

/// Relay diagnostics snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayStatusResponse {
    /// `awaiting_bridge|idle|delivering`.
    pub phase: String,
    pub bridge_ready: bool,
    pub in_flight_envelope_id: Option<String>,
    pub pending_envelope_id: Option<String>,
    pub pending_action: Option<String>,
    /// Commands waiting to be drained.
    pub outbox_len: u32,
}

/// Native shell was created by a launch intent (cold start).
///
/// # FFI contract
/// - `action = None` or blank means the app was opened without a voice trigger.
/// - `payload_json` is a JSON object of primitives; empty string means no payload.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn relay_on_shell_created(action: Option<String>, payload_json: String) -> RelayResponse {
    with_relay(|relay| shell_created(relay, action, &payload_json))
}

/// Running shell received a new intent (warm start).
#[flutter_rust_bridge::frb(sync)]
pub fn relay_on_shell_resumed(action: Option<String>, payload_json: String) -> RelayResponse {
    with_relay(|relay| shell_resumed(relay, action, &payload_json))
}

/// Dart engine finished registering its handlers.
///
/// Returns `ignored` when nothing was pending or readiness was already signalled.
#[flutter_rust_bridge::frb(sync)]
pub fn relay_on_bridge_ready() -> RelayResponse {
    with_relay(bridge_ready)
}

/// Acknowledges a drained command.
///
/// # FFI contract
/// - `ok = false` settles the command as failed with `message`; never retried.
/// - Unknown or stale ids return an `ignored` settled response.
#[flutter_rust_bridge::frb(sync)]
pub fn relay_complete_delivery(
    envelope_id: String,
    ok: bool,
    message: String,
) -> RelayCompletionResponse {
    with_relay(|relay| complete_delivery(relay, &envelope_id, ok, message))
}

/// Removes and returns queued commands in delivery order.
#[flutter_rust_bridge::frb(sync)]
pub fn relay_drain_commands() -> Vec<RelayCommand> {
    with_relay(drain_commands)
}

#[flutter_rust_bridge::frb(sync)]
pub fn relay_status() -> RelayStatusResponse {
    with_relay(|relay| status(relay))
}

fn new_shell_relay() -> ShellRelay {
    let config = RelayConfig::from_env().unwrap_or_else(|err| {
        warn!("event=relay_config module=ffi status=error error={err} fallback=default");
        RelayConfig::default()
    });
    info!(
        "event=relay_init module=ffi status=ok channel={}",
        config.channel
    );
    let bridge = OutboxBridge::from_config(&config, AckMode::Deferred);
    IntentRelay::new(&config, bridge)
}

fn with_relay<T>(f: impl FnOnce(&mut ShellRelay) -> T) -> T {
    let mutex = RELAY.get_or_init(|| Mutex::new(new_shell_relay()));
    let mut guard: MutexGuard<'_, ShellRelay> =
        mutex.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut *guard)
}

fn shell_created(relay: &mut ShellRelay, action: Option<String>, payload_json: &str) -> RelayResponse {
    match to_launch_event(action, payload_json) {
        Ok(event) => to_response(&relay.on_shell_created(&event)),
        Err(response) => response,
    }
}

fn shell_resumed(relay: &mut ShellRelay, action: Option<String>, payload_json: &str) -> RelayResponse {
    match to_launch_event(action, payload_json) {
        Ok(event) => to_response(&relay.on_shell_resumed(&event)),
        Err(response) => response,
    }
}

fn bridge_ready(relay: &mut ShellRelay) -> RelayResponse {
    match relay.on_bridge_ready() {
        Some(outcome) => to_response(&outcome),
        None => RelayResponse::ignored("No pending command."),
    }
}

fn complete_delivery(
    relay: &mut ShellRelay,
    envelope_id: &str,
    ok: bool,
    message: String,
) -> RelayCompletionResponse {
    let Ok(id) = envelope_id.trim().parse::<EnvelopeId>() else {
        return RelayCompletionResponse {
            settled: RelayResponse::failure(None, format!("invalid envelope id `{envelope_id}`")),
            follow_up: None,
        };
    };

    let result = if ok {
        Ok(None)
    } else {
        Err(BridgeError::failed(message))
    };
    let Completion { settled, follow_up } = relay.on_delivery_complete(id, result);

    RelayCompletionResponse {
        settled: settled
            .as_ref()
            .map(to_response)
            .unwrap_or_else(|| RelayResponse::ignored("Envelope is not in flight.")),
        follow_up: follow_up.as_ref().map(to_response),
    }
}

fn drain_commands(relay: &mut ShellRelay) -> Vec<RelayCommand> {
    relay
        .bridge_mut()
        .drain()
        .into_iter()
        .map(to_relay_command)
        .collect()
}

fn status(relay: &ShellRelay) -> RelayStatusResponse {
    let status = relay.status();
    let (phase, in_flight) = match status.phase {
        RelayPhase::AwaitingBridge => ("awaiting_bridge", None),
        RelayPhase::Idle => ("idle", None),
        RelayPhase::Delivering { envelope_id } => ("delivering", Some(envelope_id.to_string())),
    };
    RelayStatusResponse {
        phase: phase.to_string(),
        bridge_ready: status.bridge_ready,
        in_flight_envelope_id: in_flight,
        pending_envelope_id: status.pending.map(|id| id.to_string()),
        pending_action: status.pending_action,
        outbox_len: u32::try_from(relay.bridge().len()).unwrap_or(u32::MAX),
    }
}

/// Extras are only decoded for events that carry an action; a plain app
/// open may attach arbitrary extras.
fn to_launch_event(
    action: Option<String>,
    payload_json: &str,
) -> Result<LaunchEvent, RelayResponse> {
    let event = LaunchEvent {
        action,
        extras: CommandPayload::new(),
    };
    if event.normalized_action().is_none() {
        return Ok(event);
    }

    let extras = decode_payload(payload_json).map_err(|err| {
        warn!("event=payload_decode module=ffi status=error error={err}");
        RelayResponse::failure(None, err.to_string())
    })?;
    Ok(LaunchEvent { extras, ..event })
}

fn to_response(outcome: &DispatchOutcome) -> RelayResponse {
    let envelope_id = outcome.envelope_id().map(|id| id.to_string());
    let (code, message) = match outcome {
        DispatchOutcome::Ignored => (RelayResponseCode::Ignored, "No voice command.".to_string()),
        DispatchOutcome::Buffered {
            superseded: Some(dropped),
            ..
        } => (
            RelayResponseCode::Buffered,
            format!("Command buffered; superseded {dropped}."),
        ),
        DispatchOutcome::Buffered {
            superseded: None, ..
        } => (RelayResponseCode::Buffered, "Command buffered.".to_string()),
        DispatchOutcome::Delivered { .. } => {
            (RelayResponseCode::Success, "Command delivered.".to_string())
        }
        DispatchOutcome::InFlight { .. } => (
            RelayResponseCode::InProgress,
            "Command awaiting acknowledgement.".to_string(),
        ),
        DispatchOutcome::Failed(error) => (RelayResponseCode::Failure, error.to_string()),
    };
    RelayResponse {
        code,
        envelope_id,
        message,
    }
}

fn to_relay_command(command: OutboundCommand) -> RelayCommand {
    RelayCommand {
        payload_json: encode_payload(&command.arguments),
        channel: command.channel,
        method: command.method,
        envelope_id: command.envelope_id.to_string(),
        delivery_kind: command.delivery_kind.as_str().to_string(),
    }
}
