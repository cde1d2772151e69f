//! Flutter-facing FFI crate for the Pocketa voice relay.

pub mod api;
mod payload;

pub use payload::PayloadDecodeError;
