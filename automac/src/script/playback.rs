//! Recorded-macro playback files.
//!
//! The macro recorder captures a flat list of already-resolved events (no
//! control flow) as a JSON array. Each record is a `{"type": ..., ...}`
//! object whose remaining fields, in file order, become the argument string
//! for the dispatcher handler named by `type`:
//!
//! ```json
//! [
//!   {"type": "click_location", "x": 100, "y": 200},
//!   {"type": "wait", "duration": 0.5},
//!   {"type": "type", "text": "hello"}
//! ]
//! ```
//!
//! turns into `click_location 100 200`, `wait 0.5`, `type hello`. Field
//! order is meaningful, which is why `serde_json` runs with `preserve_order`.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value as Json};

/// One replayable event: a dispatcher command name plus its argument string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackEvent {
    pub command: String,
    pub args: String,
}

/// On-disk shape of one record: the handler name plus its fields, order
/// intact.
#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(flatten)]
    fields: Map<String, Json>,
}

/// Load and decode a playback file.
///
/// A record without a `"type"` field, or a file that is not a JSON array of
/// objects, is malformed (fatal to the run).
pub fn load_events(path: &Path) -> Result<Vec<PlaybackEvent>, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read macro file {}: {e}", path.display()))?;
    parse_events(&text).map_err(|e| format!("malformed macro file {}: {e}", path.display()))
}

/// Decode playback events from JSON text.
pub fn parse_events(text: &str) -> Result<Vec<PlaybackEvent>, String> {
    let records: Vec<RawEvent> = serde_json::from_str(text).map_err(|e| e.to_string())?;
    Ok(records
        .into_iter()
        .map(|record| {
            let args = record
                .fields
                .values()
                .map(field_text)
                .collect::<Vec<_>>()
                .join(" ");
            PlaybackEvent {
                command: record.kind,
                args,
            }
        })
        .collect())
}

/// Render one field value the way a hand-written script line would carry it.
fn field_text(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        Json::Number(n) => n.to_string(),
        Json::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_event() {
        let events = parse_events(r#"[{"type": "click_location", "x": 100, "y": 200}]"#).unwrap();
        assert_eq!(
            events,
            vec![PlaybackEvent {
                command: "click_location".into(),
                args: "100 200".into(),
            }]
        );
    }

    #[test]
    fn field_order_is_preserved() {
        // y before x in the file means y before x in the args.
        let events = parse_events(r#"[{"type": "click_location", "y": 7, "x": 3}]"#).unwrap();
        assert_eq!(events[0].args, "7 3");
    }

    #[test]
    fn float_and_text_fields() {
        let events = parse_events(
            r#"[
                {"type": "wait", "duration": 0.5},
                {"type": "type", "text": "hello world"},
                {"type": "key", "key_name": "enter"}
            ]"#,
        )
        .unwrap();
        assert_eq!(events[0].args, "0.5");
        assert_eq!(events[1].args, "hello world");
        assert_eq!(events[2].args, "enter");
    }

    #[test]
    fn event_with_no_extra_fields() {
        let events = parse_events(r#"[{"type": "exit"}]"#).unwrap();
        assert_eq!(events[0].command, "exit");
        assert_eq!(events[0].args, "");
    }

    #[test]
    fn missing_type_is_error() {
        assert!(parse_events(r#"[{"x": 1}]"#).is_err());
    }

    #[test]
    fn non_array_is_error() {
        assert!(parse_events(r#"{"type": "exit"}"#).is_err());
        assert!(parse_events("not json").is_err());
    }
}
