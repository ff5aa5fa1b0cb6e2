// zcl-config/src/load.rs
// ============================================================================
// Module: Campaign & Suite Loading
// Description: Fail-closed TOML loading for campaign and suite documents.
// Purpose: Reject oversized, traversal-prone, or malformed input before a
//          single field reaches `zcl-core`'s typed model.
// Dependencies: std, toml, zcl-core
// ============================================================================

//! ## Overview
//! Campaign and suite documents are untrusted input. Loading enforces a
//! maximum file size and rejects parent-directory path components before
//! attempting to parse, so a malicious or corrupt file never reaches `toml`
//! with an unbounded read.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;
use zcl_core::model::Campaign;
use zcl_core::model::Suite;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted size, in bytes, for a campaign or suite document.
pub const MAX_DOCUMENT_BYTES: u64 = 4 * 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading a campaign or suite document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The path could not be read.
    #[error("io error reading {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The path contains a `..` component, which is never permitted for a
    /// spec-relative reference (e.g. `missionSource.suitePath`).
    #[error("path {0:?} escapes its base directory")]
    PathTraversal(PathBuf),
    /// The file exceeds [`MAX_DOCUMENT_BYTES`].
    #[error("{path:?} is {size} bytes, exceeding the {MAX_DOCUMENT_BYTES} byte limit")]
    TooLarge {
        /// Oversized path.
        path: PathBuf,
        /// Observed size in bytes.
        size: u64,
    },
    /// The file failed to parse as TOML, or failed to deserialize into the
    /// expected shape.
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
}

// ============================================================================
// SECTION: Path Guard
// ============================================================================

/// Rejects any path containing a `..` component.
fn reject_traversal(path: &Path) -> Result<(), ConfigError> {
    if path.components().any(|component| component == Component::ParentDir) {
        return Err(ConfigError::PathTraversal(path.to_path_buf()));
    }
    Ok(())
}

/// Reads `path` as UTF-8 text, rejecting traversal and oversized files.
fn read_bounded(path: &Path) -> Result<String, ConfigError> {
    reject_traversal(path)?;
    let metadata = fs::metadata(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    if metadata.len() > MAX_DOCUMENT_BYTES {
        return Err(ConfigError::TooLarge { path: path.to_path_buf(), size: metadata.len() });
    }
    fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })
}

// ============================================================================
// SECTION: Loaders
// ============================================================================

/// Loads and parses a campaign document from `path`.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read, is too large, escapes
/// its own directory via `..`, or fails to parse.
pub fn load_campaign(path: &Path) -> Result<Campaign, ConfigError> {
    let raw = read_bounded(path)?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

/// Loads and parses a suite document from `path`.
///
/// # Errors
///
/// Returns [`ConfigError`] under the same conditions as [`load_campaign`].
pub fn load_suite(path: &Path) -> Result<Suite, ConfigError> {
    let raw = read_bounded(path)?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use std::path::PathBuf;

    use tempfile::tempdir;

    use super::ConfigError;
    use super::load_campaign;
    use crate::examples::campaign_toml_example;

    #[test]
    fn a_traversal_path_is_rejected() {
        let result = load_campaign(&PathBuf::from("../outside/campaign.toml"));
        assert!(matches!(result, Err(ConfigError::PathTraversal(_))));
    }

    #[test]
    fn the_canonical_example_parses() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("campaign.toml");
        std::fs::write(&path, campaign_toml_example()).expect("write");
        load_campaign(&path).expect("parses");
    }
}
