//! Quick heuristics that can answer without spending a model call.
//!
//! Rules run in a fixed order and the first match wins. Each rule is a pure
//! function of the request.

use crate::models::analysis::{AnalyzeRequest, AnalyzeResponse, CoachStatus};

/// Problems whose idiomatic solution needs an associative lookup (title keyword).
const LOOKUP_PROBLEMS: &[&str] = &["two sum"];

/// Lower-cased tokens that show a hash map / dictionary is already in play.
const LOOKUP_TOKENS: &[&str] = &["dict", "map", "counter"];

const RETURN_TOKENS: &[&str] = &["return", "yield"];

/// Phrases in the constraints that declare a mutate-in-place contract.
const IN_PLACE_PHRASES: &[&str] = &["in place", "in-place", "do not return anything"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleId {
    MissingLookupTable,
    MissingReturn,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::MissingLookupTable => "missing_lookup_table",
            RuleId::MissingReturn => "missing_return",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    pub rule: RuleId,
    pub response: AnalyzeResponse,
}

/// Returns the fast-path response, or `None` to defer to the model.
pub fn evaluate(req: &AnalyzeRequest) -> Option<AnalyzeResponse> {
    match_rule(req).map(|hit| hit.response)
}

pub fn match_rule(req: &AnalyzeRequest) -> Option<RuleMatch> {
    let title = req.task_context.title.to_lowercase();
    let constraints = req
        .task_context
        .constraints
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    let code = req.work_state.code_snapshot.to_lowercase();

    if is_lookup_problem(&title) && !contains_any(&code, LOOKUP_TOKENS) {
        return Some(RuleMatch {
            rule: RuleId::MissingLookupTable,
            response: respond(
                CoachStatus::MildRisk,
                "Consider a linear-time approach using a memory of complements.",
                "Sketch a one-pass plan checking if complement was seen before.",
                &["Duplicates", "Negative targets"],
                &["[2,7,11,15], target=9", "[3,3], target=6"],
                0.7,
                25,
            ),
        });
    }

    if !contains_any(&code, RETURN_TOKENS) && !contains_any(&constraints, IN_PLACE_PHRASES) {
        return Some(RuleMatch {
            rule: RuleId::MissingReturn,
            response: respond(
                CoachStatus::HighRisk,
                "Your function doesn't return a result.",
                "Add a return statement that outputs the final value.",
                &["Missing output"],
                &[],
                0.8,
                20,
            ),
        });
    }

    None
}

fn is_lookup_problem(title: &str) -> bool {
    LOOKUP_PROBLEMS.iter().any(|problem| title.contains(problem))
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

fn respond(
    status: CoachStatus,
    hint: &str,
    next_step: &str,
    watch_out: &[&str],
    try_tests: &[&str],
    confidence: f64,
    wait_sec: u32,
) -> AnalyzeResponse {
    AnalyzeResponse {
        status,
        hint: hint.to_string(),
        next_step: next_step.to_string(),
        watch_out: watch_out.iter().map(|s| s.to_string()).collect(),
        try_tests: try_tests.iter().map(|s| s.to_string()).collect(),
        confidence,
        intervention_after_sec: wait_sec,
    }
}
