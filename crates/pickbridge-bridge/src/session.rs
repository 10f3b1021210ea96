// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The currently live UI session.
//
// Exactly one session is live at a time. The host begins it when its UI
// comes up and ends it when the UI goes away; the trigger and resolver read
// it through a shared `SessionSlot` instead of a process-wide static.

use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use pickbridge_core::error::{PickBridgeError, Result};
use pickbridge_core::types::SessionId;
use tracing::{debug, info, warn};

use crate::traits::{ContentResolver, PickerPresenter};

/// Application-private directories exposed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    /// Reclaimable cache directory. Local copies land here.
    pub cache_dir: PathBuf,
    /// Persistent per-app files directory.
    pub files_dir: PathBuf,
}

/// Everything the bridge needs from one live UI session.
pub struct UiSession {
    pub id: SessionId,
    pub dirs: AppDirs,
    pub presenter: Arc<dyn PickerPresenter>,
    pub content: Arc<dyn ContentResolver>,
}

impl UiSession {
    pub fn new(
        dirs: AppDirs,
        presenter: Arc<dyn PickerPresenter>,
        content: Arc<dyn ContentResolver>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            dirs,
            presenter,
            content,
        }
    }
}

/// How `open_in_app_dir` opens its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    /// Create or truncate.
    Write,
    /// Create or append.
    Append,
}

/// Holder for the active UI session.
#[derive(Default)]
pub struct SessionSlot {
    current: RwLock<Option<Arc<UiSession>>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `session` as the live session, replacing any previous one.
    pub fn begin(&self, session: UiSession) -> SessionId {
        let id = session.id;
        if let Ok(mut current) = self.current.write() {
            if let Some(old) = current.replace(Arc::new(session)) {
                warn!(old = %old.id, new = %id, "UI session replaced without ending");
            } else {
                info!(session = %id, "UI session started");
            }
        }
        id
    }

    /// End the session with the given id. Ending a session that is no longer
    /// current does nothing.
    pub fn end(&self, id: SessionId) {
        if let Ok(mut current) = self.current.write() {
            match current.as_ref() {
                Some(live) if live.id == id => {
                    *current = None;
                    info!(session = %id, "UI session ended");
                }
                _ => debug!(session = %id, "ignoring end of a session that is not live"),
            }
        }
    }

    /// The live session, if any.
    pub fn current(&self) -> Option<Arc<UiSession>> {
        self.current.read().ok().and_then(|s| s.clone())
    }

    /// Whether `id` is still the live session.
    pub fn is_live(&self, id: SessionId) -> bool {
        self.current().is_some_and(|s| s.id == id)
    }

    /// Absolute path of the app files directory, `None` with no live session.
    pub fn app_dir(&self) -> Option<PathBuf> {
        self.current().map(|s| s.dirs.files_dir.clone())
    }

    /// Open `name` inside the app files directory.
    pub fn open_in_app_dir(&self, name: &str, mode: OpenMode) -> Result<File> {
        let dir = self.app_dir().ok_or(PickBridgeError::NoActiveSession)?;
        let path = dir.join(name);
        let mut options = OpenOptions::new();
        match mode {
            OpenMode::Read => options.read(true),
            OpenMode::Write => options.write(true).create(true).truncate(true),
            OpenMode::Append => options.append(true).create(true),
        };
        let file = options.open(&path)?;
        debug!(path = %path.display(), ?mode, "opened file in app dir");
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use super::*;
    use crate::test_support::{MemoryContent, RecordingPresenter};

    fn session(root: &std::path::Path) -> UiSession {
        UiSession::new(
            AppDirs {
                cache_dir: root.join("cache"),
                files_dir: root.to_path_buf(),
            },
            Arc::new(RecordingPresenter::default()),
            Arc::new(MemoryContent::default()),
        )
    }

    #[test]
    fn begin_and_end() {
        let dir = tempfile::tempdir().expect("tempdir");
        let slot = SessionSlot::new();
        assert!(slot.current().is_none());

        let id = slot.begin(session(dir.path()));
        assert!(slot.is_live(id));
        assert_eq!(slot.app_dir().as_deref(), Some(dir.path()));

        slot.end(id);
        assert!(slot.current().is_none());
        assert!(slot.app_dir().is_none());
    }

    #[test]
    fn ending_a_stale_session_keeps_the_live_one() {
        let dir = tempfile::tempdir().expect("tempdir");
        let slot = SessionSlot::new();
        let first = slot.begin(session(dir.path()));
        let second = slot.begin(session(dir.path()));

        slot.end(first);
        assert!(slot.is_live(second));
        assert!(!slot.is_live(first));
    }

    #[test]
    fn open_in_app_dir_without_session() {
        let slot = SessionSlot::new();
        let err = slot.open_in_app_dir("save.sav", OpenMode::Read).unwrap_err();
        assert!(matches!(err, PickBridgeError::NoActiveSession));
    }

    #[test]
    fn open_in_app_dir_write_then_append_then_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let slot = SessionSlot::new();
        slot.begin(session(dir.path()));

        let mut f = slot.open_in_app_dir("save.sav", OpenMode::Write).expect("write");
        f.write_all(b"abc").expect("write bytes");
        drop(f);

        let mut f = slot.open_in_app_dir("save.sav", OpenMode::Append).expect("append");
        f.write_all(b"def").expect("append bytes");
        drop(f);

        let mut contents = String::new();
        slot.open_in_app_dir("save.sav", OpenMode::Read)
            .expect("read")
            .read_to_string(&mut contents)
            .expect("read bytes");
        assert_eq!(contents, "abcdef");
    }
}
