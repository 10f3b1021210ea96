// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Selection resolver: turns a picker result into a local copy and tells the
// native runtime where it is.
//
// Flow for one activity result:
//
//   filter (request code, outcome) -> validate handle scheme
//     -> display name (or fallback) -> open stream -> copy into cache dir
//     -> file_picked(path)
//
// Nothing here ever propagates to the host. Every path ends in a
// `ResolveOutcome`, which `on_activity_result` logs and hands back.

use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use pickbridge_core::config::BridgeConfig;
use pickbridge_core::error::{ErrorClass, PickBridgeError, Result};
use pickbridge_core::types::{
    ActivityOutcome, ActivityResult, HandleScheme, IgnoreReason, LocalCopy, ResolveOutcome,
    SelectionHandle,
};
use tracing::{debug, error, info};

use crate::panic_message;
use crate::session::SessionSlot;
use crate::traits::{ContentResolver, NativeCallback};

/// Receives picker results from the host and materialises the selection.
pub struct SelectionResolver {
    request_code: i32,
    fallback_name: String,
    buffer_size: usize,
    sessions: Arc<SessionSlot>,
    callback: Arc<dyn NativeCallback>,
}

impl SelectionResolver {
    pub fn new(
        config: &BridgeConfig,
        sessions: Arc<SessionSlot>,
        callback: Arc<dyn NativeCallback>,
    ) -> Self {
        Self {
            request_code: config.request_code,
            fallback_name: config.fallback_name.clone(),
            buffer_size: config.copy_buffer_size.max(1),
            sessions,
            callback,
        }
    }

    /// Host entry point for an activity result.
    ///
    /// Never panics and never returns an error to the caller; the outcome is
    /// logged here and returned for inspection.
    pub fn on_activity_result(&self, result: ActivityResult) -> ResolveOutcome {
        let outcome = match catch_unwind(AssertUnwindSafe(|| self.resolve(result))) {
            Ok(outcome) => outcome,
            Err(payload) => ResolveOutcome::Failed(PickBridgeError::Panicked(panic_message(
                payload.as_ref(),
            ))),
        };
        log_outcome(&outcome);
        outcome
    }

    /// Run the resolution steps without logging or panic protection.
    pub fn resolve(&self, result: ActivityResult) -> ResolveOutcome {
        let handle = match self.accept(result) {
            Ok(handle) => handle,
            Err(reason) => return ResolveOutcome::Ignored(reason),
        };

        let Some(session) = self.sessions.current() else {
            return ResolveOutcome::Failed(PickBridgeError::NoActiveSession);
        };

        let name = resolve_name(session.content.as_ref(), &handle, &self.fallback_name);
        match self.materialise(session.content.as_ref(), &handle, &session.dirs.cache_dir, name) {
            Ok(copy) => {
                self.callback.file_picked(&copy.path);
                ResolveOutcome::Delivered(copy)
            }
            Err(e) => ResolveOutcome::Failed(e),
        }
    }

    /// Filter and validate. Returns the handle worth resolving.
    fn accept(&self, result: ActivityResult) -> std::result::Result<SelectionHandle, IgnoreReason> {
        if result.request_code != self.request_code {
            return Err(IgnoreReason::ForeignRequest(result.request_code));
        }
        match result.outcome {
            ActivityOutcome::Ok => {}
            ActivityOutcome::Cancelled => return Err(IgnoreReason::Cancelled),
            ActivityOutcome::Other(code) => return Err(IgnoreReason::UnsuccessfulOutcome(code)),
        }
        let handle = result.handle.ok_or(IgnoreReason::MissingHandle)?;
        match handle.scheme() {
            Some(scheme) if scheme.is_recognised() => Ok(handle),
            Some(HandleScheme::Other(s)) => Err(IgnoreReason::UnsupportedScheme(s)),
            _ => Err(IgnoreReason::UnsupportedScheme(String::new())),
        }
    }

    fn materialise(
        &self,
        content: &dyn ContentResolver,
        handle: &SelectionHandle,
        cache_dir: &Path,
        name: String,
    ) -> Result<LocalCopy> {
        // Open the source first so a dead handle never leaves a file behind.
        let source = content.open_read(handle)?;
        let path = std::path::absolute(local_copy_path(cache_dir, &name))?;
        let bytes = copy_stream(source, &path, self.buffer_size)?;
        Ok(LocalCopy {
            path,
            name,
            bytes,
            created_at: Utc::now(),
        })
    }
}

/// Display name from the provider, or `fallback` when it has none.
pub fn resolve_name(content: &dyn ContentResolver, handle: &SelectionHandle, fallback: &str) -> String {
    match content.display_name(handle) {
        Ok(Some(name)) if !name.is_empty() => name,
        Ok(_) => {
            debug!(uri = %handle, fallback, "provider has no display name");
            fallback.to_string()
        }
        Err(e) => {
            debug!(uri = %handle, error = %e, fallback, "display name lookup failed");
            fallback.to_string()
        }
    }
}

/// Stream `src` into a freshly created (or truncated) file at `dest`.
///
/// Returns the number of bytes written. The destination is closed when this
/// returns, whether or not the copy succeeded; a failed copy may leave a
/// partial file on disk.
pub fn copy_stream(mut src: impl Read, dest: &Path, buffer_size: usize) -> std::io::Result<u64> {
    let mut out = File::create(dest)?;
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut total: u64 = 0;
    loop {
        let n = match src.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        out.write_all(&buf[..n])?;
        total += n as u64;
    }
    out.flush()?;
    Ok(total)
}

fn log_outcome(outcome: &ResolveOutcome) {
    match outcome {
        ResolveOutcome::Delivered(copy) => info!(
            path = %copy.path.display(),
            bytes = copy.bytes,
            "selection copied and delivered"
        ),
        ResolveOutcome::Ignored(reason) => debug!(?reason, "activity result ignored"),
        ResolveOutcome::Failed(e) => match e.class() {
            ErrorClass::Diagnostic => debug!(error = %e, "selection not delivered"),
            ErrorClass::Unexpected => error!(error = %e, "selection not delivered"),
        },
    }
}

/// Where a copy named `name` would land for the given cache directory.
///
/// The name is always taken relative to `cache_dir`: root, drive prefix, `.`
/// and `..` components are dropped, so a provider cannot point the copy
/// outside the cache.
pub fn local_copy_path(cache_dir: &Path, name: &str) -> PathBuf {
    let mut path = cache_dir.to_path_buf();
    for component in Path::new(name).components() {
        if let Component::Normal(part) = component {
            path.push(part);
        }
    }
    path
}
