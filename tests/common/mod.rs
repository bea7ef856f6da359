//! Common test utilities
//!
//! This module is shared across all integration tests

pub mod fakes;
pub mod fixtures;

#[allow(unused_imports)]
pub use fakes::{button_targets, FakeRelay, RelayCall, StaticMembership, StubHost};
#[allow(unused_imports)]
pub use fixtures::{photo, selection, TestEnvironment, CHAT, USER};
