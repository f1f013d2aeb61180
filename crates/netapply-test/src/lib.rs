//! Test infrastructure for netapply
//!
//! Provides:
//! - [`FakeHost`]: in-memory device inventory, recording system control
//!   and artifact probe in one shared state
//! - Declared-config fixtures rendered as netplan YAML
//! - Call-log verification helpers

pub mod fixtures;
mod host;
mod verification;

pub use fixtures::*;
pub use host::{Call, FakeDevice, FakeHost};
pub use verification::*;
