// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One-way message channel from the bridge into the native runtime.

use std::path::{Path, PathBuf};

use pickbridge_core::types::FilePicked;
use tokio::sync::mpsc;
use tracing::debug;

use crate::traits::NativeCallback;

/// Create a connected sender/receiver pair.
pub fn native_channel() -> (FilePickedSender, FilePickedReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (FilePickedSender { tx }, FilePickedReceiver { rx })
}

/// Bridge side. Sending never blocks and never reports back.
#[derive(Clone)]
pub struct FilePickedSender {
    tx: mpsc::UnboundedSender<FilePicked>,
}

impl NativeCallback for FilePickedSender {
    fn file_picked(&self, path: &Path) {
        let msg = FilePicked {
            path: path.to_path_buf(),
        };
        if self.tx.send(msg).is_err() {
            debug!(path = %path.display(), "native receiver gone, file_picked dropped");
        }
    }
}

/// Native side.
pub struct FilePickedReceiver {
    rx: mpsc::UnboundedReceiver<FilePicked>,
}

impl FilePickedReceiver {
    /// Next message if one is already waiting.
    pub fn try_next(&mut self) -> Option<FilePicked> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next message. `None` once every sender is dropped.
    pub async fn recv(&mut self) -> Option<FilePicked> {
        self.rx.recv().await
    }

    /// Most recent picked path, discarding any older ones still queued.
    ///
    /// Meant to be polled once per frame by a native main loop.
    pub fn take_pending(&mut self) -> Option<PathBuf> {
        let mut latest = None;
        while let Some(msg) = self.try_next() {
            latest = Some(msg.path);
        }
        latest
    }
}

impl<F> NativeCallback for F
where
    F: Fn(&Path) + Send + Sync,
{
    fn file_picked(&self, path: &Path) {
        self(path)
    }
}
