// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic seams between the bridge and its host environment.
//
// The trigger and resolver only ever talk to the host through these traits.
// Android implements them over JNI, desktop builds over the filesystem, and
// tests with in-memory fakes.

use std::io::Read;
use std::path::Path;

use pickbridge_core::config::PickerOptions;
use pickbridge_core::error::Result;
use pickbridge_core::types::SelectionHandle;

/// Host-provided facility translating a selection handle into metadata and
/// bytes.
pub trait ContentResolver: Send + Sync {
    /// Look up the display name of the handle.
    ///
    /// `Ok(None)` means the provider answered but had no name (no row, or a
    /// null column). Both that and `Err` make the resolver fall back to the
    /// sentinel name.
    fn display_name(&self, handle: &SelectionHandle) -> Result<Option<String>>;

    /// Open the handle's content for reading.
    fn open_read(&self, handle: &SelectionHandle) -> Result<Box<dyn Read + Send>>;
}

/// Presents the system file-selection surface.
///
/// Only ever called on the UI-owning thread. Returning `Ok(())` means the
/// surface was launched; the outcome arrives later as an activity result.
pub trait PickerPresenter: Send + Sync {
    fn present(&self, request_code: i32, options: &PickerOptions) -> Result<()>;
}

/// A unit of work destined for the UI-owning thread.
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Submits work to the single UI-owning execution context.
///
/// Posting never blocks and hands back no cancellation handle.
pub trait UiScheduler: Send + Sync {
    fn post(&self, task: UiTask);
}

/// One-way entry point into the native runtime.
pub trait NativeCallback: Send + Sync {
    /// Announce a freshly copied file. No acknowledgment is expected.
    fn file_picked(&self, path: &Path);
}
