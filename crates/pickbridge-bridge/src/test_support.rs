// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory host fakes shared by the unit tests.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use pickbridge_core::config::PickerOptions;
use pickbridge_core::error::{PickBridgeError, Result};
use pickbridge_core::types::SelectionHandle;

use crate::session::{AppDirs, SessionSlot, UiSession};
use crate::traits::{ContentResolver, NativeCallback, PickerPresenter};

/// What the fake provider knows about one URI.
#[derive(Clone, Default)]
pub struct Entry {
    pub name: Option<String>,
    /// `None` makes `open_read` fail.
    pub bytes: Option<Vec<u8>>,
    pub name_query_fails: bool,
    /// Fail with an I/O error after this many bytes have been read.
    pub fail_after: Option<usize>,
    pub panic_on_open: bool,
}

#[derive(Default)]
pub struct MemoryContent {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryContent {
    pub fn insert(&self, uri: &str, entry: Entry) {
        self.entries
            .lock()
            .expect("lock")
            .insert(uri.to_string(), entry);
    }

    /// Convenience for the common case: a named document with bytes.
    pub fn document(&self, uri: &str, name: Option<&str>, bytes: &[u8]) {
        self.insert(
            uri,
            Entry {
                name: name.map(str::to_owned),
                bytes: Some(bytes.to_vec()),
                ..Entry::default()
            },
        );
    }

    fn entry(&self, handle: &SelectionHandle) -> Option<Entry> {
        self.entries.lock().expect("lock").get(handle.uri()).cloned()
    }
}

impl ContentResolver for MemoryContent {
    fn display_name(&self, handle: &SelectionHandle) -> Result<Option<String>> {
        match self.entry(handle) {
            Some(e) if e.name_query_fails => Err(PickBridgeError::NameLookup("cursor failed".into())),
            Some(e) => Ok(e.name),
            None => Ok(None),
        }
    }

    fn open_read(&self, handle: &SelectionHandle) -> Result<Box<dyn Read + Send>> {
        let entry = self.entry(handle);
        match entry {
            Some(e) if e.panic_on_open => panic!("provider crashed"),
            Some(Entry {
                bytes: Some(bytes),
                fail_after: Some(limit),
                ..
            }) => Ok(Box::new(FailingReader {
                inner: Cursor::new(bytes),
                remaining: limit,
            })),
            Some(Entry {
                bytes: Some(bytes), ..
            }) => Ok(Box::new(Cursor::new(bytes))),
            _ => Err(PickBridgeError::ContentUnavailable {
                uri: handle.uri().to_string(),
            }),
        }
    }
}

struct FailingReader {
    inner: Cursor<Vec<u8>>,
    remaining: usize,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.remaining == 0 {
            return Err(std::io::Error::other("provider went away"));
        }
        let len = buf.len().min(self.remaining);
        let n = self.inner.read(&mut buf[..len])?;
        self.remaining -= n;
        Ok(n)
    }
}

/// Records every presentation request.
#[derive(Default)]
pub struct RecordingPresenter {
    pub presented: Mutex<Vec<(i32, PickerOptions)>>,
    pub fail: bool,
}

impl PickerPresenter for RecordingPresenter {
    fn present(&self, request_code: i32, options: &PickerOptions) -> Result<()> {
        self.presented
            .lock()
            .expect("lock")
            .push((request_code, options.clone()));
        if self.fail {
            return Err(PickBridgeError::Bridge("activity not found".into()));
        }
        Ok(())
    }
}

impl RecordingPresenter {
    pub fn count(&self) -> usize {
        self.presented.lock().expect("lock").len()
    }
}

/// Records every `file_picked` call.
#[derive(Default)]
pub struct RecordingCallback {
    pub paths: Mutex<Vec<PathBuf>>,
}

impl NativeCallback for RecordingCallback {
    fn file_picked(&self, path: &Path) {
        self.paths.lock().expect("lock").push(path.to_path_buf());
    }
}

impl RecordingCallback {
    pub fn calls(&self) -> Vec<PathBuf> {
        self.paths.lock().expect("lock").clone()
    }
}

/// A scratch app directory with a live session installed.
pub struct Host {
    pub dir: tempfile::TempDir,
    pub slot: Arc<SessionSlot>,
    pub content: Arc<MemoryContent>,
    pub presenter: Arc<RecordingPresenter>,
    pub callback: Arc<RecordingCallback>,
}

impl Host {
    pub fn new() -> Self {
        Self::with_presenter(RecordingPresenter::default())
    }

    pub fn with_presenter(presenter: RecordingPresenter) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = dir.path().join("cache");
        std::fs::create_dir_all(&cache).expect("cache dir");
        let content = Arc::new(MemoryContent::default());
        let presenter = Arc::new(presenter);
        let slot = Arc::new(SessionSlot::new());
        slot.begin(UiSession::new(
            AppDirs {
                cache_dir: cache,
                files_dir: dir.path().join("files"),
            },
            presenter.clone(),
            content.clone(),
        ));
        Self {
            dir,
            slot,
            content,
            presenter,
            callback: Arc::new(RecordingCallback::default()),
        }
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.dir.path().join("cache")
    }

    /// Names of every file currently in the cache dir, sorted.
    pub fn cached_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.cache_dir())
            .expect("read cache dir")
            .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
