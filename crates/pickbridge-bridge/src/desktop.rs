// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Native desktop file dialog via `rfd`, enabled with the `desktop-dialog`
// feature.
//
// A desktop dialog is modal and answers synchronously, so presenting it
// immediately produces the activity result. That result goes back through
// the same resolver path a mobile host would use, with a `file:` handle.

use std::sync::Weak;

use pickbridge_core::config::PickerOptions;
use pickbridge_core::error::{PickBridgeError, Result};
use pickbridge_core::types::{ActivityResult, SelectionHandle};

use crate::PickBridge;
use crate::traits::PickerPresenter;

/// Presenter that shows an `rfd` open-file dialog.
pub struct DialogPicker {
    bridge: Weak<PickBridge>,
}

impl DialogPicker {
    /// The bridge is held weakly; the session that owns this presenter lives
    /// inside the bridge.
    pub fn new(bridge: Weak<PickBridge>) -> Self {
        Self { bridge }
    }
}

impl PickerPresenter for DialogPicker {
    fn present(&self, request_code: i32, options: &PickerOptions) -> Result<()> {
        let bridge = self
            .bridge
            .upgrade()
            .ok_or_else(|| PickBridgeError::Bridge("bridge dropped before dialog".into()))?;

        let mut dialog = rfd::FileDialog::new().set_title("Open");
        if let Some(ext) = extension_for(&options.mime_type) {
            dialog = dialog.add_filter(&options.mime_type, &[ext]);
        }

        let result = match dialog.pick_file() {
            Some(path) => {
                ActivityResult::picked(request_code, SelectionHandle::from_file_path(&path))
            }
            None => ActivityResult::cancelled(request_code),
        };
        bridge.on_activity_result(result);
        Ok(())
    }
}

// rfd filters by extension, not MIME. Wildcards mean no filter.
fn extension_for(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "application/pdf" => Some("pdf"),
        "application/zip" => Some("zip"),
        "text/plain" => Some("txt"),
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pickbridge_core::types::HandleScheme;

    use super::*;

    #[test]
    fn wildcard_mime_types_have_no_filter() {
        assert_eq!(extension_for("*/*"), None);
        assert_eq!(extension_for("image/*"), None);
        assert_eq!(extension_for("application/octet-stream"), None);
    }

    #[test]
    fn known_mime_types_map_to_extensions() {
        assert_eq!(extension_for("application/pdf"), Some("pdf"));
        assert_eq!(extension_for("text/plain"), Some("txt"));
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
    }

    #[cfg(unix)]
    #[test]
    fn dialog_paths_become_readable_file_handles() {
        let path = PathBuf::from("/home/me/Game Boy/pokémon red.gb");
        let handle = SelectionHandle::from_file_path(&path);
        assert_eq!(handle.scheme(), Some(HandleScheme::File));
        assert!(!handle.uri().contains(' '));
        assert_eq!(handle.file_path(), Some(path));
    }

    #[test]
    fn presenting_after_bridge_drop_is_an_error() {
        let picker = DialogPicker::new(Weak::new());
        let err = picker
            .present(0xface, &PickerOptions::default())
            .unwrap_err();
        assert!(matches!(err, PickBridgeError::Bridge(_)));
    }
}
