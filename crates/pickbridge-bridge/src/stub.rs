// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host pieces for desktop/CI builds where there is no Android runtime.
//
// `StubPicker` has no system surface to show and returns
// `PlatformUnavailable`. `FsContentResolver` serves `file:` handles straight
// from disk, which is all a desktop picker ever hands back.

use std::fs::File;
use std::io::Read;

use pickbridge_core::config::PickerOptions;
use pickbridge_core::error::{PickBridgeError, Result};
use pickbridge_core::types::SelectionHandle;

use crate::traits::{ContentResolver, PickerPresenter};

/// Presenter for platforms without a system picker.
pub struct StubPicker;

impl PickerPresenter for StubPicker {
    fn present(&self, _request_code: i32, _options: &PickerOptions) -> Result<()> {
        tracing::warn!("PickerPresenter::present called on stub bridge");
        Err(PickBridgeError::PlatformUnavailable)
    }
}

/// Content resolver over the local filesystem.
pub struct FsContentResolver;

impl ContentResolver for FsContentResolver {
    fn display_name(&self, handle: &SelectionHandle) -> Result<Option<String>> {
        Ok(handle
            .file_path()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned())))
    }

    fn open_read(&self, handle: &SelectionHandle) -> Result<Box<dyn Read + Send>> {
        let path = handle
            .file_path()
            .ok_or_else(|| PickBridgeError::ContentUnavailable {
                uri: handle.uri().to_string(),
            })?;
        let file = File::open(&path)?;
        Ok(Box::new(file))
    }
}
