//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`exchange`]: `MockExchange`, an in-memory [`FuturesExchange`](crate::exchange::FuturesExchange)
//!   that records every call.
//! - [`stream`]: `ScriptedEventStream`, a canned [`AccountEventStream`](crate::exchange::AccountEventStream).
//! - [`notifier`]: `RecordingNotifier`, which keeps every event it receives.
//! - [`clock`]: `ManualClock`, a settable time source.
//! - [`domain`]: builders for fills, trades and positions.
//! - [`config`]: canonical test configurations.

pub mod clock;
pub mod config;
pub mod domain;
pub mod exchange;
pub mod notifier;
pub mod stream;

pub use clock::ManualClock;
pub use exchange::{Call, MockExchange};
pub use notifier::RecordingNotifier;
pub use stream::ScriptedEventStream;
