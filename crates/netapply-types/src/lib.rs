//! Link-layer value types shared by the netapply crates.
//!
//! - [`MacAddress`]: link-layer addresses of any kernel length, compared
//!   byte-wise
//! - [`OperState`]: kernel-reported operational state of a network device

mod link;
mod mac;

pub use link::OperState;
pub use mac::{MacAddress, MAX_ADDR_LEN};

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid operational state: {0}")]
    InvalidOperState(String),
}
