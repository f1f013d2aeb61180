//! Verification helpers for recorded host calls
//!
//! Provides assertion helpers over the call log of a [`FakeHost`](crate::FakeHost).

use thiserror::Error;

use crate::host::Call;

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Expected call {call} was never made")]
    CallNotFound { call: String },

    #[error("Unexpected call {call} at position {position}")]
    UnexpectedCall { call: String, position: usize },

    #[error("Expected {first} (at {first_pos}) before {second} (at {second_pos})")]
    OrderViolation {
        first: String,
        first_pos: usize,
        second: String,
        second_pos: usize,
    },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Call-log verification helper
pub struct CallVerifier<'a> {
    calls: &'a [Call],
}

impl<'a> CallVerifier<'a> {
    /// Create a verifier over a recorded call log
    pub fn new(calls: &'a [Call]) -> Self {
        Self { calls }
    }

    /// Position of the first call matching `pred`
    pub fn position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls.iter().position(pred)
    }

    /// Position of the last call matching `pred`
    pub fn last_position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls.iter().rposition(pred)
    }

    /// Verify that `call` was made
    pub fn assert_called(&self, call: &Call) -> VerifyResult<usize> {
        self.position(|c| c == call)
            .ok_or_else(|| VerificationError::CallNotFound {
                call: format!("{:?}", call),
            })
    }

    /// Verify that no call matches `pred`
    pub fn assert_none(&self, pred: impl Fn(&Call) -> bool) -> VerifyResult<()> {
        match self.position(pred) {
            Some(position) => Err(VerificationError::UnexpectedCall {
                call: format!("{:?}", self.calls[position]),
                position,
            }),
            None => Ok(()),
        }
    }

    /// Verify that every call matching `first` precedes every call matching
    /// `second`. Both must occur at least once.
    pub fn assert_before(
        &self,
        first: impl Fn(&Call) -> bool,
        second: impl Fn(&Call) -> bool,
    ) -> VerifyResult<()> {
        let first_pos = self
            .last_position(&first)
            .ok_or_else(|| VerificationError::CallNotFound {
                call: "first".to_string(),
            })?;
        let second_pos = self
            .position(&second)
            .ok_or_else(|| VerificationError::CallNotFound {
                call: "second".to_string(),
            })?;
        if first_pos < second_pos {
            Ok(())
        } else {
            Err(VerificationError::OrderViolation {
                first: format!("{:?}", self.calls[first_pos]),
                first_pos,
                second: format!("{:?}", self.calls[second_pos]),
                second_pos,
            })
        }
    }

    /// Count calls matching `pred`
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(*c)).count()
    }
}
