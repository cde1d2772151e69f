use pocketa_core::{
    ApplicationBridge, BridgeError, BridgeResult, CommandPayload, DeliveryKind, DispatchOutcome,
    IntentRelay, InvokeOutcome, LaunchEvent, MethodCall, PayloadValue, RelayError, RelayEvent,
    RelayPhase, RelayReporter,
};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
struct RecordedCall {
    method: String,
    arguments: CommandPayload,
    delivery_kind: DeliveryKind,
}

#[derive(Default)]
struct RecordingBridge {
    calls: Vec<RecordedCall>,
    scripted: VecDeque<BridgeResult<InvokeOutcome>>,
}

impl RecordingBridge {
    fn failing_once(err: BridgeError) -> Self {
        Self {
            calls: Vec::new(),
            scripted: VecDeque::from([Err(err)]),
        }
    }
}

impl ApplicationBridge for RecordingBridge {
    fn invoke(&mut self, call: MethodCall<'_>) -> BridgeResult<InvokeOutcome> {
        self.calls.push(RecordedCall {
            method: call.method.to_string(),
            arguments: call.arguments.clone(),
            delivery_kind: call.delivery_kind,
        });
        self.scripted
            .pop_front()
            .unwrap_or(Ok(InvokeOutcome::Completed(None)))
    }
}

#[derive(Default)]
struct RecordingReporter {
    events: Vec<RelayEvent>,
}

impl RelayReporter for RecordingReporter {
    fn report(&mut self, event: &RelayEvent) {
        self.events.push(event.clone());
    }
}

fn relay() -> IntentRelay<RecordingBridge, RecordingReporter> {
    IntentRelay::with_reporter(RecordingBridge::default(), RecordingReporter::default())
}

fn ready_relay() -> IntentRelay<RecordingBridge, RecordingReporter> {
    let mut relay = relay();
    assert!(relay.on_bridge_ready().is_none());
    relay
}

fn amount_payload(amount: impl Into<PayloadValue>) -> CommandPayload {
    let mut payload = CommandPayload::new();
    payload.insert("amount".to_string(), amount.into());
    payload
}

#[test]
fn cold_start_command_is_buffered_until_bridge_ready() {
    let mut relay = relay();
    let event = LaunchEvent::with_action("log-expense").extra("amount", 12.5);

    let outcome = relay.on_shell_created(&event);
    let DispatchOutcome::Buffered {
        envelope_id,
        superseded,
    } = outcome
    else {
        panic!("cold start before ready should buffer, got {outcome:?}");
    };
    assert!(superseded.is_none());
    assert!(relay.bridge().calls.is_empty());
    assert_eq!(relay.pending().map(|envelope| envelope.id), Some(envelope_id));

    let delivered = relay
        .on_bridge_ready()
        .expect("pending envelope should be delivered on ready");
    assert_eq!(
        delivered,
        DispatchOutcome::Delivered {
            envelope_id,
            result: None
        }
    );
    assert_eq!(
        relay.bridge().calls,
        vec![RecordedCall {
            method: "log-expense".to_string(),
            arguments: amount_payload(12.5),
            delivery_kind: DeliveryKind::ColdStart,
        }]
    );
    assert!(relay.pending().is_none());
    assert_eq!(relay.phase(), RelayPhase::Idle);
}

#[test]
fn warm_start_command_is_delivered_within_the_call() {
    let mut relay = ready_relay();
    let event = LaunchEvent::with_action("log-expense").extra("amount", 3);

    let outcome = relay.on_shell_resumed(&event);

    assert!(matches!(outcome, DispatchOutcome::Delivered { .. }));
    assert_eq!(relay.bridge().calls.len(), 1);
    assert_eq!(relay.bridge().calls[0].arguments, amount_payload(3));
    assert_eq!(relay.bridge().calls[0].delivery_kind, DeliveryKind::WarmStart);
    assert!(relay.pending().is_none());
}

#[test]
fn launch_without_voice_trigger_never_reaches_bridge() {
    let mut relay = relay();

    assert_eq!(
        relay.on_shell_created(&LaunchEvent::empty()),
        DispatchOutcome::Ignored
    );
    assert!(relay.pending().is_none());
    assert_eq!(relay.phase(), RelayPhase::AwaitingBridge);

    assert!(relay.on_bridge_ready().is_none());
    assert!(relay.bridge().calls.is_empty());
}

#[test]
fn events_without_action_leave_ready_relay_unchanged() {
    let mut relay = ready_relay();
    for event in [
        LaunchEvent::empty(),
        LaunchEvent::with_action(""),
        LaunchEvent::with_action(" \t"),
    ] {
        assert_eq!(relay.on_shell_resumed(&event), DispatchOutcome::Ignored);
        assert_eq!(relay.on_shell_created(&event), DispatchOutcome::Ignored);
    }
    assert_eq!(relay.phase(), RelayPhase::Idle);
    assert!(relay.bridge().calls.is_empty());
}

#[test]
fn command_is_either_delivered_or_buffered_never_both() {
    let mut cold = relay();
    let buffered = cold.on_shell_created(&LaunchEvent::with_action("log-expense"));
    assert!(matches!(buffered, DispatchOutcome::Buffered { .. }));
    assert!(cold.bridge().calls.is_empty());
    assert!(cold.pending().is_some());

    let mut warm = ready_relay();
    let delivered = warm.on_shell_created(&LaunchEvent::with_action("log-expense"));
    assert!(matches!(delivered, DispatchOutcome::Delivered { .. }));
    assert_eq!(warm.bridge().calls.len(), 1);
    assert!(warm.pending().is_none());
}

#[test]
fn repeated_bridge_ready_delivers_only_once() {
    let mut relay = relay();
    relay.on_shell_created(&LaunchEvent::with_action("log-expense").extra("amount", 12.5));

    assert!(relay.on_bridge_ready().is_some());
    assert!(relay.on_bridge_ready().is_none());
    assert!(relay.on_bridge_ready().is_none());

    assert_eq!(relay.bridge().calls.len(), 1);
    let duplicates = relay
        .reporter()
        .events
        .iter()
        .filter(|event| matches!(event, RelayEvent::DuplicateBridgeReady))
        .count();
    assert_eq!(duplicates, 2);
}

#[test]
fn newer_command_supersedes_pending_one_before_ready() {
    let mut relay = relay();

    let first = relay
        .on_shell_created(&LaunchEvent::with_action("log-expense").extra("amount", 12.5))
        .envelope_id()
        .expect("first command should be extracted");
    let second = relay.on_shell_resumed(&LaunchEvent::with_action("log-expense").extra("amount", 3));
    let DispatchOutcome::Buffered {
        envelope_id: second_id,
        superseded,
    } = second
    else {
        panic!("second command should be buffered, got {second:?}");
    };
    assert_eq!(superseded, Some(first));

    relay.on_bridge_ready();

    assert_eq!(relay.bridge().calls.len(), 1);
    assert_eq!(relay.bridge().calls[0].arguments, amount_payload(3));
    assert_eq!(relay.bridge().calls[0].delivery_kind, DeliveryKind::WarmStart);

    let superseded_events = relay
        .reporter()
        .events
        .iter()
        .filter_map(|event| match event {
            RelayEvent::CommandSuperseded {
                dropped,
                replacement,
                ..
            } => Some((*dropped, *replacement)),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(superseded_events, vec![(first, second_id)]);
}

#[test]
fn bridge_failure_is_reported_once_and_not_retried() {
    let mut relay = IntentRelay::with_reporter(
        RecordingBridge::failing_once(BridgeError::failed("engine detached")),
        RecordingReporter::default(),
    );
    relay.on_bridge_ready();

    let outcome = relay.on_shell_resumed(&LaunchEvent::with_action("log-expense"));
    let DispatchOutcome::Failed(error) = outcome else {
        panic!("bridge error should surface as failure, got {outcome:?}");
    };
    assert!(matches!(error, RelayError::DeliveryFailed { .. }));
    assert_eq!(relay.phase(), RelayPhase::Idle);
    assert!(relay.pending().is_none());
    assert!(relay.on_bridge_ready().is_none());
    assert_eq!(relay.bridge().calls.len(), 1);

    let failures = relay
        .reporter()
        .events
        .iter()
        .filter(|event| matches!(event, RelayEvent::DeliveryFailed { .. }))
        .count();
    assert_eq!(failures, 1);

    let next = relay.on_shell_resumed(&LaunchEvent::with_action("show-summary"));
    assert!(matches!(next, DispatchOutcome::Delivered { .. }));
    assert_eq!(relay.bridge().calls.len(), 2);
}

#[test]
fn bridge_rejection_surfaces_as_malformed_command() {
    let mut relay = IntentRelay::with_reporter(
        RecordingBridge::failing_once(BridgeError::rejected("amount must be positive")),
        RecordingReporter::default(),
    );
    relay.on_shell_created(&LaunchEvent::with_action("log-expense").extra("amount", -1));

    let outcome = relay
        .on_bridge_ready()
        .expect("pending command should be attempted");
    let DispatchOutcome::Failed(RelayError::MalformedCommand { action, reason, .. }) = outcome
    else {
        panic!("rejection should map to malformed command, got {outcome:?}");
    };
    assert_eq!(action, "log-expense");
    assert_eq!(reason, "amount must be positive");
}

#[test]
fn bridge_result_is_returned_to_caller() {
    let mut bridge = RecordingBridge::default();
    bridge
        .scripted
        .push_back(Ok(InvokeOutcome::Completed(Some(PayloadValue::from("expense-42")))));
    let mut relay = IntentRelay::with_reporter(bridge, RecordingReporter::default());
    relay.on_bridge_ready();

    let outcome = relay.on_shell_resumed(&LaunchEvent::with_action("log-expense"));
    let DispatchOutcome::Delivered { result, .. } = outcome else {
        panic!("expected delivered outcome, got {outcome:?}");
    };
    assert_eq!(result, Some(PayloadValue::Text("expense-42".to_string())));
}
