// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration. Supplied by the host at construction time and never
// written back to disk.

use serde::{Deserialize, Serialize};

use crate::error::{PickBridgeError, Result};

/// Request code the bridge tags its picker launch with.
pub const DEFAULT_REQUEST_CODE: i32 = 0xface;

/// File name used when the provider cannot tell us a display name.
pub const FALLBACK_FILE_NAME: &str = "tempFile";

/// Intermediate buffer used while streaming the selection to disk.
pub const COPY_BUFFER_SIZE: usize = 32 * 1024;

/// Intent action used to present the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickerAction {
    /// Storage Access Framework document picker.
    OpenDocument,
    /// Legacy "get content" chooser.
    GetContent,
}

impl PickerAction {
    /// Android intent action string.
    pub fn intent_action(self) -> &'static str {
        match self {
            PickerAction::OpenDocument => "android.intent.action.OPEN_DOCUMENT",
            PickerAction::GetContent => "android.intent.action.GET_CONTENT",
        }
    }
}

/// How the picker surface is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerOptions {
    pub action: PickerAction,
    /// MIME filter. `*/*` accepts anything.
    pub mime_type: String,
    /// Restrict results to items that can be opened as a stream.
    pub openable: bool,
    /// Prefer items already on the device.
    pub local_only: bool,
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self {
            action: PickerAction::OpenDocument,
            mime_type: "*/*".into(),
            openable: true,
            local_only: true,
        }
    }
}

/// Settings for the picker trigger and selection resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Pending request token. Results carrying any other code are ignored.
    pub request_code: i32,
    /// Name for copies whose display name is unknown.
    pub fallback_name: String,
    /// Size of the copy buffer in bytes.
    pub copy_buffer_size: usize,
    pub picker: PickerOptions,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            request_code: DEFAULT_REQUEST_CODE,
            fallback_name: FALLBACK_FILE_NAME.into(),
            copy_buffer_size: COPY_BUFFER_SIZE,
            picker: PickerOptions::default(),
        }
    }
}

impl BridgeConfig {
    /// Parse a JSON document, filling unspecified fields with defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: BridgeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.copy_buffer_size == 0 {
            return Err(PickBridgeError::InvalidConfig(
                "copy_buffer_size must be greater than zero".into(),
            ));
        }
        if self.fallback_name.is_empty() {
            return Err(PickBridgeError::InvalidConfig(
                "fallback_name must not be empty".into(),
            ));
        }
        if self.picker.mime_type.is_empty() {
            return Err(PickBridgeError::InvalidConfig(
                "picker.mime_type must not be empty".into(),
            ));
        }
        Ok(())
    }
}
