// zcl-sources/src/result_channel.rs
// ============================================================================
// Module: Result Channel Readers
// Description: file_json / stdout_json mission-result readers (§4.H).
// Purpose: Locate and decode the mission-outcome payload an
//          `auto_from_result_json` finalizer reads into a `Feedback`.
// Dependencies: serde_json, zcl-core
// ============================================================================

//! ## Overview
//! A result channel has two shapes: `file_json` reads
//! `<attemptDir>/<resultFile>` from disk; `stdout_json` scans a captured
//! stdout tail, newest line first, for one prefixed by a marker. Both
//! funnel into the same decode step, which is the only place the payload's
//! shape is validated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use serde_json::Value;
use zcl_core::model::Feedback;
use zcl_core::time::Timestamp;

use crate::error::SourceError;

// ============================================================================
// SECTION: Channel Readers
// ============================================================================

/// Reads `<attempt_dir>/<result_file>` and returns its raw JSON contents.
///
/// # Errors
///
/// Returns [`SourceError::ResultMissing`] when the file does not exist, or
/// [`SourceError::Io`] for any other filesystem failure.
pub fn read_file_json(attempt_dir: &Path, result_file: &str) -> Result<Value, SourceError> {
    let path = attempt_dir.join(result_file);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(SourceError::ResultMissing(format!(
                "result file not found: {}",
                path.display()
            )));
        }
        Err(err) => return Err(SourceError::io(path, err)),
    };
    serde_json::from_str(&raw)
        .map_err(|err| SourceError::ResultInvalid(format!("invalid json in result file: {err}")))
}

/// Scans `stdout_tail`, newest line first, for a line prefixed by `marker`
/// and returns the JSON payload following the prefix.
///
/// # Errors
///
/// Returns [`SourceError::ResultMissing`] when no line carries the marker,
/// or [`SourceError::ResultInvalid`] when the marked line is not valid JSON.
pub fn read_stdout_json(stdout_tail: &str, marker: &str) -> Result<Value, SourceError> {
    let marked_line = stdout_tail
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix(marker))
        .ok_or_else(|| SourceError::ResultMissing("no marker line in stdout tail".to_string()))?;
    serde_json::from_str(marked_line.trim())
        .map_err(|err| SourceError::ResultInvalid(format!("invalid json after marker: {err}")))
}

// ============================================================================
// SECTION: Decode
// ============================================================================

/// Decodes a raw result-channel payload into a [`Feedback`] artifact.
///
/// `result_min_turn` is `ResultChannelConfig::result_min_turn` unwrapped by
/// the caller (a value of `Some(n)` with `n > 1` requires a matching `turn`).
///
/// # Errors
///
/// Returns [`SourceError::ResultInvalid`] when the payload is not an object,
/// `ok` is missing/non-boolean, `result`/`resultJson`/`decisionTags` carry
/// the wrong type, or `decisionTags` contains an empty string; returns
/// [`SourceError::ResultTurnTooEarly`] when `result_min_turn` is not met.
pub fn decode_payload(
    payload: Value,
    result_min_turn: Option<u32>,
    created_at: Timestamp,
) -> Result<Feedback, SourceError> {
    let Value::Object(mut fields) = payload else {
        return Err(SourceError::ResultInvalid("payload is not a json object".to_string()));
    };

    let ok = match fields.remove("ok") {
        Some(Value::Bool(ok)) => ok,
        Some(_) => return Err(SourceError::ResultInvalid("\"ok\" must be a boolean".to_string())),
        None => return Err(SourceError::ResultInvalid("payload is missing \"ok\"".to_string())),
    };

    let result = match fields.remove("result") {
        Some(Value::String(value)) => Some(value),
        Some(_) => return Err(SourceError::ResultInvalid("\"result\" must be a string".to_string())),
        None => None,
    };

    let result_json = match fields.remove("resultJson") {
        Some(Value::Object(map)) => Some(Value::Object(map)),
        Some(_) => {
            return Err(SourceError::ResultInvalid("\"resultJson\" must be an object".to_string()));
        }
        None => None,
    };

    let decision_tags = match fields.remove("decisionTags") {
        Some(Value::Array(items)) => {
            let mut tags = Vec::with_capacity(items.len());
            for item in items {
                let Value::String(tag) = item else {
                    return Err(SourceError::ResultInvalid(
                        "\"decisionTags\" entries must be strings".to_string(),
                    ));
                };
                if tag.is_empty() {
                    return Err(SourceError::ResultInvalid(
                        "\"decisionTags\" entries must be non-empty".to_string(),
                    ));
                }
                tags.push(tag);
            }
            tags
        }
        Some(_) => {
            return Err(SourceError::ResultInvalid(
                "\"decisionTags\" must be an array of strings".to_string(),
            ));
        }
        None => Vec::new(),
    };

    let turn = match fields.remove("turn") {
        Some(Value::Number(number)) => {
            let Some(turn) = number.as_u64() else {
                return Err(SourceError::ResultInvalid(
                    "\"turn\" must be a non-negative integer".to_string(),
                ));
            };
            Some(turn)
        }
        Some(_) => {
            return Err(SourceError::ResultInvalid("\"turn\" must be an integer".to_string()));
        }
        None => None,
    };

    if let Some(required) = result_min_turn {
        if required > 1 {
            let meets_floor = turn.is_some_and(|turn| turn >= u64::from(required));
            if !meets_floor {
                return Err(SourceError::ResultTurnTooEarly { observed: turn, required });
            }
        }
    }

    let classification = match fields.remove("classification") {
        Some(Value::String(value)) => Some(value),
        Some(_) => {
            return Err(SourceError::ResultInvalid(
                "\"classification\" must be a string".to_string(),
            ));
        }
        None => None,
    };

    let result_json = if result.is_none() && result_json.is_none() {
        Some(Value::Object(fields))
    } else {
        result_json
    };

    Ok(Feedback { ok, result, result_json, decision_tags, classification, created_at })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use zcl_core::time::Timestamp;

    use super::decode_payload;
    use super::read_stdout_json;

    fn ts() -> Timestamp {
        Timestamp::from_unix_millis(0)
    }

    #[test]
    fn remaining_fields_fold_into_result_json_when_absent() {
        let payload = serde_json::json!({"ok": true, "answer": 42});
        let feedback = decode_payload(payload, None, ts()).expect("decodes");
        assert!(feedback.result.is_none());
        assert_eq!(feedback.result_json, Some(serde_json::json!({"answer": 42})));
    }

    #[test]
    fn explicit_result_json_is_preserved_as_is() {
        let payload = serde_json::json!({"ok": true, "resultJson": {"a": 1}, "extra": "ignored_for_fold"});
        let feedback = decode_payload(payload, None, ts()).expect("decodes");
        assert_eq!(feedback.result_json, Some(serde_json::json!({"a": 1})));
    }

    #[test]
    fn missing_ok_is_invalid() {
        let payload = serde_json::json!({"result": "done"});
        assert!(decode_payload(payload, None, ts()).is_err());
    }

    #[test]
    fn empty_decision_tag_is_rejected() {
        let payload = serde_json::json!({"ok": true, "decisionTags": [""]});
        assert!(decode_payload(payload, None, ts()).is_err());
    }

    #[test]
    fn turn_below_minimum_is_rejected() {
        let payload = serde_json::json!({"ok": true, "turn": 1});
        let err = decode_payload(payload, Some(3), ts()).expect_err("too early");
        assert!(matches!(
            err,
            super::SourceError::ResultTurnTooEarly { observed: Some(1), required: 3 }
        ));
    }

    #[test]
    fn turn_at_minimum_is_accepted() {
        let payload = serde_json::json!({"ok": true, "turn": 3});
        assert!(decode_payload(payload, Some(3), ts()).is_ok());
    }

    #[test]
    fn stdout_scan_prefers_the_newest_marked_line() {
        let tail = "ZCL_RESULT_JSON:{\"ok\":false}\nnoise\nZCL_RESULT_JSON:{\"ok\":true}";
        let value = read_stdout_json(tail, "ZCL_RESULT_JSON:").expect("found marker");
        assert_eq!(value, serde_json::json!({"ok": true}));
    }
}
