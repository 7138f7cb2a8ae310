//! Testing utilities
//!
//! - **[`ScriptedSource`]**: programmable source with call counts, failure
//!   toggles and a gate for holding fetches in flight
//! - **[`wait_until`]** / **[`poll_until`]**: wait for background refreshes
//!   to land
//!
//! Deterministic time comes from [`MockClock`], re-exported here.
//!
//! Enabled for the crate's own tests and, for downstream crates, by the
//! `test-utils` feature.

pub mod polling;
pub mod scripted;

pub use polling::{poll_until, wait_until, POLL_INTERVAL};
pub use scripted::ScriptedSource;

pub use crate::clock::MockClock;
