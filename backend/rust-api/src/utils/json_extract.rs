//! Recovers a JSON object from model output that may carry prose or
//! markdown fences around it.
//!
//! The primary strategy scans for the first balanced top-level `{ ... }`
//! span (tracking string literals and escapes, so braces inside strings do
//! not confuse it) that also parses as a JSON object. When no such span
//! exists, the first-`{` / last-`}` window is returned with fence markers
//! removed, and `"{}"` when even that is absent.

use lazy_static::lazy_static;
use regex::Regex;

pub const EMPTY_OBJECT: &str = "{}";

lazy_static! {
    static ref FENCE_MARKER: Regex = Regex::new(r"```[A-Za-z0-9_+\-]*").unwrap();
}

/// Never fails; the worst case is `"{}"`.
pub fn extract_json(text: &str) -> String {
    if let Some(object) = first_balanced_object(text) {
        return object.to_string();
    }
    outer_brace_span(text)
}

fn first_balanced_object(text: &str) -> Option<&str> {
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        // An unclosed object swallows every later brace, so nothing after it is top-level.
        let end = balanced_end(text, start)?;
        let candidate = &text[start..=end];
        if serde_json::from_str::<serde_json::Value>(candidate)
            .map(|value| value.is_object())
            .unwrap_or(false)
        {
            return Some(candidate);
        }
        // Resume after the whole span; its inner objects are not top-level.
        search_from = end + 1;
    }

    None
}

/// Byte index of the `}` closing the object opened at `start`.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + idx);
                }
            }
            _ => {}
        }
    }

    None
}

fn outer_brace_span(text: &str) -> String {
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return EMPTY_OBJECT.to_string();
    };
    if end <= start {
        return EMPTY_OBJECT.to_string();
    }

    FENCE_MARKER
        .replace_all(&text[start..=end], "")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn parsed(text: &str) -> Value {
        serde_json::from_str(extract_json(text).trim()).unwrap()
    }

    #[test]
    fn test_fenced_block_inside_prose() {
        let text = "prose ```json {\"a\":1} ``` more prose";
        assert_eq!(parsed(text), json!({"a": 1}));
    }

    #[test]
    fn test_no_braces_yields_empty_object() {
        assert_eq!(extract_json("no braces here"), "{}");
        assert_eq!(extract_json(""), "{}");
    }

    #[test]
    fn test_inverted_braces_yield_empty_object() {
        assert_eq!(extract_json("} before {"), "{}");
    }

    #[test]
    fn test_braces_inside_string_values() {
        let text = r#"Sure! {"hint": "use a map like {k: v}", "status": "on_track"} hope it helps }"#;
        assert_eq!(
            parsed(text),
            json!({"hint": "use a map like {k: v}", "status": "on_track"})
        );
    }

    #[test]
    fn test_escaped_quotes_inside_strings() {
        let text = r#"{"hint": "say \"hi\" then }", "confidence": 0.9}"#;
        assert_eq!(parsed(text)["confidence"], json!(0.9));
    }

    #[test]
    fn test_nested_objects_are_kept_whole() {
        let text = "result: {\"status\": \"mild_risk\", \"meta\": {\"x\": 1}} trailing {note}";
        assert_eq!(
            parsed(text),
            json!({"status": "mild_risk", "meta": {"x": 1}})
        );
    }

    #[test]
    fn test_skips_non_json_braces_before_object() {
        let text = "Consider {this} first. {\"status\": \"high_risk\"}";
        assert_eq!(parsed(text), json!({"status": "high_risk"}));
    }

    #[test]
    fn test_falls_back_to_outer_span_when_nothing_parses() {
        let text = "x {```json not json``` } y";
        assert_eq!(extract_json(text), "{ not json }");
    }

    #[test]
    fn test_unparseable_object_does_not_yield_nested_object() {
        let text = "{\"status\": \"high_risk\", \"hint\": \"x\", \"meta\": {\"k\": 1},}";
        assert_eq!(extract_json(text), text);
        assert!(serde_json::from_str::<Value>(&extract_json(text)).is_err());
    }

    #[test]
    fn test_later_top_level_object_after_unparseable_one() {
        let text = "draft {\"a\": {\"b\": 1},} final {\"status\": \"on_track\"}";
        assert_eq!(parsed(text), json!({"status": "on_track"}));
    }

    #[test]
    fn test_unbalanced_input_uses_outer_span() {
        let text = "{\"a\": {\"b\": 1}";
        assert_eq!(extract_json(text), "{\"a\": {\"b\": 1}");
    }
}
