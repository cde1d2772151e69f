//! Command data model shared by the relay and bridge adapters.
//!
//! # Responsibility
//! - Define the launch event shape observed by lifecycle hooks.
//! - Define the envelope handed across the runtime boundary.
//!
//! # Invariants
//! - Payload values are primitives only (bool, integer, float, text).

pub mod envelope;
pub mod launch_event;
