// zcl-evidence/src/atomic.rs
// ============================================================================
// Module: Evidence Store Atomic Writes
// Description: Atomic file/JSONL writes and canonical JSON (§4.A).
// Purpose: Guarantee that every on-disk evidence artifact is either absent
//          or complete, never partially written.
// Dependencies: cap-std, zcl-core, std
// ============================================================================

//! ## Overview
//! Atomic writes create `<path>.tmp.<nonce>`, fsync, then rename; a reader
//! never observes a half-written file. All writes happen through a
//! capability-scoped [`cap_std::fs::Dir`] rooted at the attempt (or
//! campaign) directory, rejecting symlink escapes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;

use cap_std::ambient_authority;
use cap_std::fs::Dir;
use cap_std::fs::OpenOptions;
use serde::Serialize;
use zcl_core::hashing::HashError;
use zcl_core::hashing::canonical_json_bytes;

use crate::error::EvidenceError;

// ============================================================================
// SECTION: Evidence Root
// ============================================================================

/// A capability-scoped writer rooted at one evidence directory (an attempt
/// directory, a campaign directory, or an output root).
///
/// # Invariants
/// - Every path passed to its methods is relative and must not escape the
///   root; escapes are rejected before any filesystem call is made.
pub struct EvidenceRoot {
    /// The underlying capability handle, opened via ambient authority once
    /// at construction time.
    dir: Dir,
}

impl EvidenceRoot {
    /// Opens (creating if necessary) a capability-scoped root at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceError::Io`] when the directory cannot be created or
    /// opened.
    pub fn open_or_create(path: &Path) -> Result<Self, EvidenceError> {
        std::fs::create_dir_all(path).map_err(|err| EvidenceError::io(path, err))?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())
            .map_err(|err| EvidenceError::io(path, err))?;
        Ok(Self { dir })
    }

    /// Validates that `relative` stays within the root (no `..`, no
    /// absolute paths) before any filesystem operation touches it.
    fn checked_relative<'a>(relative: &'a Path) -> Result<&'a Path, EvidenceError> {
        if relative.is_absolute() {
            return Err(EvidenceError::PathEscapesRoot(relative.to_path_buf()));
        }
        for component in relative.components() {
            if matches!(component, std::path::Component::ParentDir) {
                return Err(EvidenceError::PathEscapesRoot(relative.to_path_buf()));
            }
        }
        Ok(relative)
    }

    /// Ensures the parent directory chain of `relative` exists within the root.
    fn ensure_parent(&self, relative: &Path) -> Result<(), EvidenceError> {
        if let Some(parent) = relative.parent() {
            if !parent.as_os_str().is_empty() {
                self.dir
                    .create_dir_all(parent)
                    .map_err(|err| EvidenceError::io(parent, err))?;
            }
        }
        Ok(())
    }

    /// Writes `bytes` atomically to `relative`, relative to the root.
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceError::PathEscapesRoot`] if `relative` would escape
    /// the root, or [`EvidenceError::Io`] if any filesystem step fails.
    pub fn write_file_atomic(&self, relative: &Path, bytes: &[u8]) -> Result<(), EvidenceError> {
        let relative = Self::checked_relative(relative)?;
        self.ensure_parent(relative)?;
        let nonce = tmp_nonce();
        let tmp_name = tmp_name_for(relative, nonce);
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        {
            let mut file = self
                .dir
                .open_with(&tmp_name, &options)
                .map_err(|err| EvidenceError::io(&tmp_name, err))?;
            file.write_all(bytes).map_err(|err| EvidenceError::io(&tmp_name, err))?;
            file.sync_all().map_err(|err| EvidenceError::io(&tmp_name, err))?;
        }
        self.dir
            .rename(&tmp_name, &self.dir, relative)
            .map_err(|err| EvidenceError::io(relative, err))?;
        Ok(())
    }

    /// Serializes `value` as canonical JSON and writes it atomically.
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceError::Canonicalization`] on serialization failure,
    /// or the same errors as [`Self::write_file_atomic`].
    pub fn write_json_atomic<T: Serialize + ?Sized>(
        &self,
        relative: &Path,
        value: &T,
    ) -> Result<(), EvidenceError> {
        let bytes = canonical_json_bytes(value).map_err(canonicalization_error)?;
        self.write_file_atomic(relative, &bytes)
    }

    /// Appends one canonical-JSON record followed by `\n` to `relative`,
    /// creating the file if absent.
    ///
    /// Each call opens, appends, and closes the file; callers that need
    /// single-writer ordering across many appends (e.g. the trace recorder)
    /// should serialize calls through their own `Mutex`.
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceError::Canonicalization`] on serialization failure,
    /// or [`EvidenceError::Io`] if the append fails.
    pub fn append_jsonl<T: Serialize + ?Sized>(
        &self,
        relative: &Path,
        record: &T,
    ) -> Result<(), EvidenceError> {
        let relative = Self::checked_relative(relative)?;
        self.ensure_parent(relative)?;
        let mut line = canonical_json_bytes(record).map_err(canonicalization_error)?;
        line.push(b'\n');
        let mut options = OpenOptions::new();
        options.write(true).create(true).append(true);
        let mut file =
            self.dir.open_with(relative, &options).map_err(|err| EvidenceError::io(relative, err))?;
        file.write_all(&line).map_err(|err| EvidenceError::io(relative, err))?;
        file.sync_all().map_err(|err| EvidenceError::io(relative, err))?;
        Ok(())
    }

    /// Returns true when `relative` exists and contains at least one
    /// non-empty line, without loading the whole file into memory.
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceError::Io`] if the file exists but cannot be read.
    pub fn jsonl_has_non_empty_line(&self, relative: &Path) -> Result<bool, EvidenceError> {
        let relative = Self::checked_relative(relative)?;
        let mut options = OpenOptions::new();
        options.read(true);
        let file = match self.dir.open_with(relative, &options) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(err) => return Err(EvidenceError::io(relative, err)),
        };
        use std::io::BufRead;
        let reader = std::io::BufReader::new(file);
        for line in reader.lines() {
            let line = line.map_err(|err| EvidenceError::io(relative, err))?;
            if !line.trim().is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Maps a canonical-JSON hashing error onto [`EvidenceError::Canonicalization`].
fn canonicalization_error(err: HashError) -> EvidenceError {
    EvidenceError::Canonicalization(err.to_string())
}

/// Builds the `<path>.tmp.<nonce>` sibling path for an atomic write.
fn tmp_name_for(relative: &Path, nonce: u64) -> std::path::PathBuf {
    let file_name = relative.file_name().map(|name| name.to_string_lossy().to_string());
    let tmp_file_name = match file_name {
        Some(name) => format!("{name}.tmp.{nonce:016x}"),
        None => format!("tmp.{nonce:016x}"),
    };
    match relative.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(tmp_file_name),
        _ => std::path::PathBuf::from(tmp_file_name),
    }
}

/// Generates a process-unique nonce for temp-file names, without reading
/// the wall clock: a monotonic counter salted by the allocating thread's id.
fn tmp_nonce() -> u64 {
    use std::sync::atomic::AtomicU64;
    use std::sync::atomic::Ordering;
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use std::path::Path;

    use tempfile::tempdir;

    use super::EvidenceRoot;

    #[test]
    fn write_json_atomic_produces_readable_file() {
        let dir = tempdir().expect("tempdir");
        let root = EvidenceRoot::open_or_create(dir.path()).expect("open root");
        root.write_json_atomic(Path::new("attempt.json"), &serde_json::json!({"a": 1}))
            .expect("write ok");
        let contents = std::fs::read_to_string(dir.path().join("attempt.json")).expect("read");
        assert_eq!(contents, "{\"a\":1}");
    }

    #[test]
    fn append_jsonl_accumulates_lines() {
        let dir = tempdir().expect("tempdir");
        let root = EvidenceRoot::open_or_create(dir.path()).expect("open root");
        let path = Path::new("tool.calls.jsonl");
        root.append_jsonl(path, &serde_json::json!({"v": 1})).expect("append 1");
        root.append_jsonl(path, &serde_json::json!({"v": 2})).expect("append 2");
        let contents = std::fs::read_to_string(dir.path().join("tool.calls.jsonl")).expect("read");
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn jsonl_has_non_empty_line_detects_absent_file() {
        let dir = tempdir().expect("tempdir");
        let root = EvidenceRoot::open_or_create(dir.path()).expect("open root");
        assert!(!root.jsonl_has_non_empty_line(Path::new("missing.jsonl")).expect("check ok"));
    }

    #[test]
    fn jsonl_has_non_empty_line_detects_content() {
        let dir = tempdir().expect("tempdir");
        let root = EvidenceRoot::open_or_create(dir.path()).expect("open root");
        let path = Path::new("tool.calls.jsonl");
        root.append_jsonl(path, &serde_json::json!({"v": 1})).expect("append");
        assert!(root.jsonl_has_non_empty_line(path).expect("check ok"));
    }

    #[test]
    fn parent_dir_escape_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let root = EvidenceRoot::open_or_create(dir.path()).expect("open root");
        let result = root.write_file_atomic(Path::new("../escape.txt"), b"x");
        assert!(result.is_err());
    }
}
