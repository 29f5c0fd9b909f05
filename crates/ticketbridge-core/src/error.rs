// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the ticketbridge workspace.

use thiserror::Error;

/// The primary error type used by the tracker and gateway traits and the sync engine.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The tracker issue does not exist or is not visible to the bridge account.
    #[error("issue {key} not found")]
    NotFound { key: String },

    /// Network or HTTP failure talking to the tracker. Retried on the next cycle.
    #[error("tracker transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A tracker response could not be decoded.
    #[error("decode error: {message}")]
    Decode { message: String },

    /// The request cannot be satisfied as asked (no matching transition,
    /// no issue key in a reply). Surfaced to the user, never retried.
    #[error("{0}")]
    Policy(String),

    /// Chat platform errors (send failure, file download, rate limiting).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Shorthand for a transport error without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a channel error wrapping a platform error.
    pub fn channel<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Channel {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true for errors that a later retry may resolve.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Channel { .. })
    }
}
