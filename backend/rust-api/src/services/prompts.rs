use serde::Serialize;
use std::borrow::Cow;

use crate::models::analysis::AnalyzeRequest;

pub const SYSTEM_PROMPT: &str = r#"
You are an ambient LeetCode coding coach.

Return STRICT JSON ONLY (no prose, no markdown), matching this schema:
{
  "status": "on_track" | "mild_risk" | "medium_risk" | "high_risk" | "error",
  "hint": string,                          // <= 35 words
  "next_step": string,                     // <= 35 words
  "watch_out": string[],                   // list of short bullets
  "try_tests": string[],                   // list of tiny test ideas
  "confidence": number,                    // 0.0 to 1.0
  "intervention_after_sec": number         // 5 to 120
}

Constraints:
- Only the 7 keys above. No extra keys.
- Do NOT write code or full algorithms. No spoilers.
- If unsure about status, use "mild_risk".
- If a field would be empty, return [] for arrays or "" for strings.
"#;

pub const TRUNCATION_MARKER: &str = "\n/* …truncated… */";

/// Cuts `text` after `limit` characters and appends [`TRUNCATION_MARKER`].
pub fn truncate_text(text: &str, limit: usize) -> Cow<'_, str> {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => Cow::Owned(format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER)),
        None => Cow::Borrowed(text),
    }
}

/// Renders the request as labelled blocks for the model. Code fields are
/// capped at `max_code_chars` characters each.
pub fn build_user_prompt(req: &AnalyzeRequest, max_code_chars: usize) -> String {
    let mut work_state = req.work_state.clone();
    work_state.code_snapshot = truncate_text(&work_state.code_snapshot, max_code_chars).into_owned();
    work_state.code_diff = work_state
        .code_diff
        .map(|diff| truncate_text(&diff, max_code_chars).into_owned());

    let signals = req.signals.clone().unwrap_or_default();

    format!(
        "TASK CONTEXT:\n{}\n\nWORK STATE:\n{}\n\nSIGNALS:\n{}\n\nReturn STRICT JSON ONLY.",
        render_section(&req.task_context),
        render_section(&work_state),
        render_section(&signals),
    )
}

fn render_section<T: Serialize>(section: &T) -> String {
    serde_json::to_string_pretty(section).unwrap_or_else(|_| "{}".to_string())
}
