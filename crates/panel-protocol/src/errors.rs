//! Error Handling Guidelines
//!
//! All error messages should follow this format:
//!
//! 1. **What failed**: Describe the operation that failed
//! 2. **Why it failed**: Provide the root cause if known
//! 3. **What to do**: Suggest user action when possible
//!
//! Examples:
//! - ✅ "Save not sent: fixture 3 has unset channels. Fill in all fields and retry."
//! - ✅ "Connect to broker failed: connection refused. Check the URL and retry."
//! - ❌ "No session" (lacks context and action)
//! - ❌ "Error" (too vague)
//!
//! None of these errors are fatal. Every one is recoverable by a later user
//! or animator action, and every one is surfaced as a notice.

use thiserror::Error;

/// Unified error type for control engine operations
#[derive(Error, Debug, Clone)]
pub enum ControlError {
    /// Intent carried an incomplete or otherwise invalid color
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Send attempted before the link finished connecting
    #[error("Not connected: {0}")]
    NotConnected(String),

    /// State transition was rejected
    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    /// Connection-level failure reported by the transport
    #[error("Transport error: {0}")]
    Transport(String),

    /// Publish failed while the link was otherwise healthy
    #[error("Transmission failed: {0}")]
    Transmission(String),

    /// Communication channel closed
    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    /// Fixture id not present in the registry
    #[error("Unknown fixture: {0}")]
    UnknownFixture(u16),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for ControlError {
    fn from(s: String) -> Self {
        ControlError::Other(s)
    }
}

impl From<&str> for ControlError {
    fn from(s: &str) -> Self {
        ControlError::Other(s.to_string())
    }
}
