// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for pickbridge.

use thiserror::Error;

/// Top-level error type for all pickbridge operations.
///
/// None of these ever reach the native side as an error signal. The native
/// runtime only sees a delivered path or silence; these values exist so the
/// bridge can log the reason and tests can inspect it.
#[derive(Debug, Error)]
pub enum PickBridgeError {
    // -- Content resolution --
    #[error("no readable stream for {uri}")]
    ContentUnavailable { uri: String },

    #[error("display name lookup failed: {0}")]
    NameLookup(String),

    // -- Storage --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    // -- Configuration --
    #[error("configuration parse error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Session / platform --
    #[error("no active UI session")]
    NoActiveSession,

    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,

    #[error("unexpected failure while resolving selection: {0}")]
    Panicked(String),
}

/// How loudly a failure should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Expected in normal use (provider hiccups, vanished files). Debug level.
    Diagnostic,
    /// Something the bridge did not anticipate. Error level.
    Unexpected,
}

impl PickBridgeError {
    /// Classify the error for logging.
    pub fn class(&self) -> ErrorClass {
        match self {
            PickBridgeError::ContentUnavailable { .. }
            | PickBridgeError::NameLookup(_)
            | PickBridgeError::Io(_)
            | PickBridgeError::NoActiveSession => ErrorClass::Diagnostic,

            PickBridgeError::Serialization(_)
            | PickBridgeError::InvalidConfig(_)
            | PickBridgeError::Bridge(_)
            | PickBridgeError::PlatformUnavailable
            | PickBridgeError::Panicked(_) => ErrorClass::Unexpected,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PickBridgeError>;
