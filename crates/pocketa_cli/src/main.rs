//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `pocketa_core` linkage without a Flutter runtime.
//! - Replay cold-start and warm-start relay flows with deterministic output.

use pocketa_core::{
    AckMode, DispatchOutcome, IntentRelay, LaunchEvent, OutboxBridge, RelayConfig,
};

fn main() {
    println!("pocketa_core ping={}", pocketa_core::ping());
    println!("pocketa_core version={}", pocketa_core::core_version());

    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("relay config error: {err}");
            std::process::exit(2);
        }
    };
    let bridge = OutboxBridge::from_config(&config, AckMode::Immediate);
    let mut relay = IntentRelay::new(&config, bridge);

    let cold = LaunchEvent::with_action("log-expense").extra("amount", 12.5);
    print_outcome("cold_start", &relay.on_shell_created(&cold));
    if let Some(outcome) = relay.on_bridge_ready() {
        print_outcome("bridge_ready", &outcome);
    }

    let warm = LaunchEvent::with_action("log-expense").extra("amount", 3);
    print_outcome("warm_start", &relay.on_shell_resumed(&warm));
    print_outcome("plain_launch", &relay.on_shell_resumed(&LaunchEvent::empty()));

    for command in relay.bridge_mut().drain() {
        println!(
            "outbox channel={} method={} kind={} args={:?}",
            command.channel, command.method, command.delivery_kind, command.arguments
        );
    }
}

fn print_outcome(step: &str, outcome: &DispatchOutcome) {
    let label = match outcome {
        DispatchOutcome::Ignored => "ignored",
        DispatchOutcome::Buffered { .. } => "buffered",
        DispatchOutcome::Delivered { .. } => "delivered",
        DispatchOutcome::InFlight { .. } => "in_flight",
        DispatchOutcome::Failed(_) => "failed",
    };
    println!("relay step={step} outcome={label}");
}
