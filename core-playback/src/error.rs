//! # Playback Error Types
//!
//! Only constructing a manager can fail. Once running, element failures are
//! recorded in the playback state or logged, never returned.

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Errors that can occur while setting up playback.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Platform Errors
    // ========================================================================
    /// A bridge capability failed in a way that is not "unavailable".
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Manager configuration was rejected.
    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if the error comes from invalid configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::Runtime(core_runtime::Error::Config(_))
                | PlaybackError::Runtime(core_runtime::Error::CapabilityMissing { .. })
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
