// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the file-acquisition bridge.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PickBridgeError;

/// Host result code for a completed activity (`Activity.RESULT_OK`).
pub const RESULT_OK: i32 = -1;
/// Host result code for a cancelled activity (`Activity.RESULT_CANCELED`).
pub const RESULT_CANCELED: i32 = 0;

/// Identity of one live UI session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Access scheme of a selection handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandleScheme {
    /// `content:` — persistent content reference served by a provider.
    Content,
    /// `file:` — direct filesystem reference.
    File,
    /// Anything else. Never resolved.
    Other(String),
}

impl HandleScheme {
    // Exact match, as the host platform compares schemes.
    fn parse(scheme: &str) -> Self {
        match scheme {
            "content" => HandleScheme::Content,
            "file" => HandleScheme::File,
            other => HandleScheme::Other(other.to_string()),
        }
    }

    /// Whether the resolver knows how to read this scheme.
    pub fn is_recognised(&self) -> bool {
        matches!(self, HandleScheme::Content | HandleScheme::File)
    }
}

/// Opaque reference to user-chosen content, as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionHandle {
    uri: String,
}

impl SelectionHandle {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    /// A `file://` handle for a local absolute path, percent-encoded per
    /// segment.
    pub fn from_file_path(path: &Path) -> Self {
        let text = path.to_string_lossy();
        let encoded: Vec<String> = text
            .split(std::path::MAIN_SEPARATOR)
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        let joined = encoded.join("/");
        if joined.starts_with('/') {
            Self::new(format!("file://{joined}"))
        } else {
            Self::new(format!("file:///{joined}"))
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The access scheme, or `None` for a handle with no `scheme:` prefix.
    pub fn scheme(&self) -> Option<HandleScheme> {
        let (scheme, _) = self.uri.split_once(':')?;
        if scheme.is_empty() {
            return None;
        }
        Some(HandleScheme::parse(scheme))
    }

    /// Filesystem path for `file:` handles (`file:///a/b` or `file:/a/b`),
    /// percent-decoded. `None` when the decoded path is not UTF-8.
    pub fn file_path(&self) -> Option<PathBuf> {
        match self.scheme()? {
            HandleScheme::File => {
                let (_, rest) = self.uri.split_once(':')?;
                let path = rest.strip_prefix("//").unwrap_or(rest);
                // `file://host/path` is not a local path.
                if !path.starts_with('/') {
                    return None;
                }
                let decoded = urlencoding::decode(path).ok()?;
                Some(PathBuf::from(decoded.into_owned()))
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for SelectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}

/// How the picker interaction ended, from the host's result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityOutcome {
    Ok,
    Cancelled,
    Other(i32),
}

impl ActivityOutcome {
    pub fn from_code(code: i32) -> Self {
        match code {
            RESULT_OK => ActivityOutcome::Ok,
            RESULT_CANCELED => ActivityOutcome::Cancelled,
            other => ActivityOutcome::Other(other),
        }
    }
}

/// One result event delivered by the host environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityResult {
    pub request_code: i32,
    pub outcome: ActivityOutcome,
    pub handle: Option<SelectionHandle>,
}

impl ActivityResult {
    /// A successful selection for the given request code.
    pub fn picked(request_code: i32, handle: SelectionHandle) -> Self {
        Self {
            request_code,
            outcome: ActivityOutcome::Ok,
            handle: Some(handle),
        }
    }

    /// The user backed out of the picker.
    pub fn cancelled(request_code: i32) -> Self {
        Self {
            request_code,
            outcome: ActivityOutcome::Cancelled,
            handle: None,
        }
    }
}

/// A materialised, native-readable copy of the selected content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalCopy {
    /// Absolute path of the copy.
    pub path: PathBuf,
    /// File name within the cache directory.
    pub name: String,
    /// Number of bytes written.
    pub bytes: u64,
    pub created_at: DateTime<Utc>,
}

/// The one-way message sent to the native runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePicked {
    pub path: PathBuf,
}

/// Why a result event was dropped without doing anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Request code belongs to some other activity result.
    ForeignRequest(i32),
    /// The user cancelled the picker.
    Cancelled,
    /// Host reported neither OK nor cancel.
    UnsuccessfulOutcome(i32),
    /// OK result without a handle.
    MissingHandle,
    /// Handle with a scheme the resolver does not read.
    UnsupportedScheme(String),
}

/// Result of running the resolver over one activity result.
#[derive(Debug)]
pub enum ResolveOutcome {
    /// Copy written and the native callback sent.
    Delivered(LocalCopy),
    /// Nothing to do.
    Ignored(IgnoreReason),
    /// Resolution or copy failed; no callback was sent.
    Failed(PickBridgeError),
}

impl ResolveOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, ResolveOutcome::Delivered(_))
    }

    pub fn local_copy(&self) -> Option<&LocalCopy> {
        match self {
            ResolveOutcome::Delivered(copy) => Some(copy),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_parsing() {
        assert_eq!(
            SelectionHandle::new("content://com.android.providers/document/7").scheme(),
            Some(HandleScheme::Content)
        );
        assert_eq!(
            SelectionHandle::new("file:///sdcard/rom.gb").scheme(),
            Some(HandleScheme::File)
        );
        assert_eq!(
            SelectionHandle::new("https://example.org/x").scheme(),
            Some(HandleScheme::Other("https".into()))
        );
        assert_eq!(SelectionHandle::new("/no/scheme").scheme(), None);
        assert_eq!(SelectionHandle::new(":empty").scheme(), None);
    }

    #[test]
    fn only_content_and_file_are_recognised() {
        assert!(HandleScheme::Content.is_recognised());
        assert!(HandleScheme::File.is_recognised());
        assert!(!HandleScheme::Other("http".into()).is_recognised());
    }

    #[test]
    fn file_path_from_file_uri() {
        assert_eq!(
            SelectionHandle::new("file:///tmp/a.bin").file_path(),
            Some(PathBuf::from("/tmp/a.bin"))
        );
        assert_eq!(
            SelectionHandle::new("file:/tmp/a.bin").file_path(),
            Some(PathBuf::from("/tmp/a.bin"))
        );
        assert_eq!(SelectionHandle::new("file://host/a.bin").file_path(), None);
        assert_eq!(SelectionHandle::new("content://x/a.bin").file_path(), None);
    }

    #[test]
    fn scheme_match_is_case_sensitive() {
        assert_eq!(
            SelectionHandle::new("FILE:///sdcard/rom.gb").scheme(),
            Some(HandleScheme::Other("FILE".into()))
        );
        assert_eq!(
            SelectionHandle::new("Content://docs/1").scheme(),
            Some(HandleScheme::Other("Content".into()))
        );
        assert!(!HandleScheme::Other("FILE".into()).is_recognised());
    }

    #[test]
    fn file_path_is_percent_decoded() {
        assert_eq!(
            SelectionHandle::new("file:///sdcard/My%20Rom.gb").file_path(),
            Some(PathBuf::from("/sdcard/My Rom.gb"))
        );
        assert_eq!(
            SelectionHandle::new("file:///tmp/%E2%9C%93.bin").file_path(),
            Some(PathBuf::from("/tmp/\u{2713}.bin"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn file_handles_from_paths_are_encoded() {
        let path = Path::new("/home/me/My Roms/50% off#1.gb");
        let handle = SelectionHandle::from_file_path(path);
        assert_eq!(handle.uri(), "file:///home/me/My%20Roms/50%25%20off%231.gb");
        assert_eq!(handle.scheme(), Some(HandleScheme::File));
        assert_eq!(handle.file_path().as_deref(), Some(path));
    }

    #[test]
    fn outcome_from_host_codes() {
        assert_eq!(ActivityOutcome::from_code(-1), ActivityOutcome::Ok);
        assert_eq!(ActivityOutcome::from_code(0), ActivityOutcome::Cancelled);
        assert_eq!(ActivityOutcome::from_code(1), ActivityOutcome::Other(1));
    }
}
