// zcl-config/src/docs.rs
// ============================================================================
// Module: Config Docs
// Description: Markdown documentation generator for the campaign schema.
// Purpose: Keep a checked-in `CONFIG.md` from drifting out of sync with
//          `schema.rs`.
// Dependencies: std, serde_json
// ============================================================================

//! ## Overview
//! [`config_docs_markdown`] renders [`crate::schema::config_schema`] into
//! Markdown. [`verify_config_docs`] re-renders and diffs against a checked-in
//! copy, so CI can catch documentation drift the same way it catches a
//! missed regeneration after a schema change.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::schema::config_schema;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while generating or verifying config docs.
#[derive(Debug, Error)]
pub enum DocsError {
    /// The docs file could not be read or written.
    #[error("io error at {0}")]
    Io(String),
    /// The schema could not be rendered.
    #[error("schema error: {0}")]
    Schema(String),
    /// The checked-in docs file does not match freshly rendered output.
    #[error("config docs are stale; regenerate with `campaign doctor --write-docs`: {0}")]
    Drift(String),
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders the campaign schema into Markdown.
#[must_use]
pub fn config_docs_markdown() -> String {
    let schema = config_schema();
    let mut out = String::new();
    let _ = writeln!(out, "# Campaign Configuration Reference");
    let _ = writeln!(out);
    let _ = writeln!(out, "Generated from the campaign JSON schema. Do not edit by hand.");
    let _ = writeln!(out);
    render_object(&schema, "campaign.toml", 0, &mut out);

    if let Some(items) = schema.pointer("/properties/flows/items") {
        let _ = writeln!(out, "## `[[flows]]`");
        let _ = writeln!(out);
        render_object(items, "flows[]", 0, &mut out);
    }
    out
}

/// Renders one schema object's `properties` as a field table, recursing one
/// level into nested objects reachable via `properties`.
fn render_object(schema: &Value, heading: &str, depth: usize, out: &mut String) {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return;
    };
    if depth == 0 {
        let _ = writeln!(out, "## `{heading}`");
        let _ = writeln!(out);
    }
    let required: Vec<&str> =
        schema.get("required").and_then(Value::as_array).map_or_else(Vec::new, |values| {
            values.iter().filter_map(Value::as_str).collect()
        });

    let _ = writeln!(out, "| Field | Type | Required | Notes |");
    let _ = writeln!(out, "|---|---|---|---|");
    for (name, field_schema) in properties {
        let kind = field_kind(field_schema);
        let is_required = if required.contains(&name.as_str()) { "yes" } else { "no" };
        let notes = field_schema.get("description").and_then(Value::as_str).unwrap_or("");
        let _ = writeln!(out, "| `{name}` | {kind} | {is_required} | {notes} |");
    }
    let _ = writeln!(out);

    for (name, field_schema) in properties {
        if field_schema.get("properties").is_some() {
            render_object(field_schema, name, depth + 1, out);
        }
    }
}

/// Renders a schema fragment's type as a short human-readable label.
fn field_kind(schema: &Value) -> String {
    if let Some(values) = schema.get("enum").and_then(Value::as_array) {
        let labels: Vec<String> =
            values.iter().filter_map(Value::as_str).map(|value| format!("`{value}`")).collect();
        return labels.join(" \\| ");
    }
    if schema.get("oneOf").is_some() {
        return "oneOf".to_string();
    }
    schema.get("type").and_then(Value::as_str).unwrap_or("object").to_string()
}

// ============================================================================
// SECTION: CLI-facing entry points
// ============================================================================

/// Writes freshly rendered docs to `path` (default `CONFIG.md`).
///
/// # Errors
///
/// Returns [`DocsError::Io`] if the file cannot be written.
pub fn write_config_docs(path: Option<&Path>) -> Result<(), DocsError> {
    let path = path.unwrap_or_else(|| Path::new("CONFIG.md"));
    fs::write(path, config_docs_markdown()).map_err(|error| DocsError::Io(error.to_string()))
}

/// Verifies that `path` (default `CONFIG.md`) matches freshly rendered docs.
///
/// # Errors
///
/// Returns [`DocsError::Io`] if the file cannot be read, or
/// [`DocsError::Drift`] if its content differs from a fresh render.
pub fn verify_config_docs(path: Option<&Path>) -> Result<(), DocsError> {
    let path = path.unwrap_or_else(|| Path::new("CONFIG.md"));
    let on_disk = fs::read_to_string(path).map_err(|error| DocsError::Io(error.to_string()))?;
    let fresh = config_docs_markdown();
    if on_disk == fresh {
        Ok(())
    } else {
        Err(DocsError::Drift(path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use tempfile::tempdir;

    use super::config_docs_markdown;
    use super::verify_config_docs;
    use super::write_config_docs;

    #[test]
    fn the_rendered_docs_mention_every_top_level_field() {
        let markdown = config_docs_markdown();
        assert!(markdown.contains("campaign_id"));
        assert!(markdown.contains("mission_source"));
        assert!(markdown.contains("flow_id"));
    }

    #[test]
    fn a_freshly_written_file_verifies_clean() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("CONFIG.md");
        write_config_docs(Some(&path)).expect("write");
        verify_config_docs(Some(&path)).expect("verify");
    }

    #[test]
    fn a_stale_file_fails_verification() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("CONFIG.md");
        std::fs::write(&path, "stale content").expect("write");
        assert!(verify_config_docs(Some(&path)).is_err());
    }
}
