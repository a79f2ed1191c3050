//! Maps whatever JSON the model produced onto [`AnalyzeResponse`].
//!
//! Every field is read independently and falls back to its default when it
//! is absent or cannot be coerced. Each substitution is reported as a
//! [`NormalizationIssue`] so callers can log it; the response itself never
//! carries the diagnostics.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::analysis::{AnalyzeResponse, CoachStatus, DEFAULT_INTERVENTION_AFTER_SEC};

pub const DEFAULT_STATUS: CoachStatus = CoachStatus::MildRisk;
pub const DEFAULT_HINT: &str = "Analyzer returned incomplete data.";
pub const DEFAULT_NEXT_STEP: &str = "Consider a smaller sub-step.";
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueReason {
    Missing,
    WrongType,
    InvalidValue,
    OutOfRange,
    NotAnObject,
}

impl IssueReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueReason::Missing => "missing",
            IssueReason::WrongType => "wrong_type",
            IssueReason::InvalidValue => "invalid_value",
            IssueReason::OutOfRange => "out_of_range",
            IssueReason::NotAnObject => "not_an_object",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NormalizationIssue {
    pub field: &'static str,
    pub reason: IssueReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub response: AnalyzeResponse,
    pub issues: Vec<NormalizationIssue>,
}

pub fn default_response() -> AnalyzeResponse {
    AnalyzeResponse {
        status: DEFAULT_STATUS,
        hint: DEFAULT_HINT.to_string(),
        next_step: DEFAULT_NEXT_STEP.to_string(),
        watch_out: Vec::new(),
        try_tests: Vec::new(),
        confidence: DEFAULT_CONFIDENCE,
        intervention_after_sec: DEFAULT_INTERVENTION_AFTER_SEC,
    }
}

pub fn normalize(parsed: &Value) -> Normalized {
    let Some(object) = parsed.as_object() else {
        return Normalized {
            response: default_response(),
            issues: vec![NormalizationIssue {
                field: "$",
                reason: IssueReason::NotAnObject,
            }],
        };
    };

    let mut fields = FieldReader {
        object,
        issues: Vec::new(),
    };

    let response = AnalyzeResponse {
        status: fields.status(),
        hint: fields.text("hint", DEFAULT_HINT),
        next_step: fields.text("next_step", DEFAULT_NEXT_STEP),
        watch_out: fields.list("watch_out"),
        try_tests: fields.list("try_tests"),
        confidence: fields.confidence(),
        intervention_after_sec: fields.seconds("intervention_after_sec"),
    };

    Normalized {
        response,
        issues: fields.issues,
    }
}

struct FieldReader<'a> {
    object: &'a Map<String, Value>,
    issues: Vec<NormalizationIssue>,
}

impl<'a> FieldReader<'a> {
    fn flag(&mut self, field: &'static str, reason: IssueReason) {
        self.issues.push(NormalizationIssue { field, reason });
    }

    /// `null` counts as absent.
    fn present(&mut self, field: &'static str) -> Option<&'a Value> {
        match self.object.get(field) {
            None | Some(Value::Null) => {
                self.flag(field, IssueReason::Missing);
                None
            }
            Some(value) => Some(value),
        }
    }

    fn status(&mut self) -> CoachStatus {
        match self.present("status") {
            Some(Value::String(raw)) => CoachStatus::parse_loose(raw).unwrap_or_else(|| {
                self.flag("status", IssueReason::InvalidValue);
                DEFAULT_STATUS
            }),
            Some(_) => {
                self.flag("status", IssueReason::WrongType);
                DEFAULT_STATUS
            }
            None => DEFAULT_STATUS,
        }
    }

    fn text(&mut self, field: &'static str, default: &str) -> String {
        match self.present(field) {
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                self.flag(field, IssueReason::WrongType);
                default.to_string()
            }
            None => default.to_string(),
        }
    }

    fn list(&mut self, field: &'static str) -> Vec<String> {
        match self.present(field) {
            Some(Value::Array(items)) => {
                let strings: Vec<String> = items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect();
                if strings.len() != items.len() {
                    self.flag(field, IssueReason::WrongType);
                }
                strings
            }
            // A lone string is almost always a one-item list.
            Some(Value::String(s)) => {
                self.flag(field, IssueReason::WrongType);
                vec![s.clone()]
            }
            Some(_) => {
                self.flag(field, IssueReason::WrongType);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    fn confidence(&mut self) -> f64 {
        let raw = match self.present("confidence") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(v) => Some(v),
                Err(_) => {
                    self.flag("confidence", IssueReason::InvalidValue);
                    return DEFAULT_CONFIDENCE;
                }
            },
            Some(_) => {
                self.flag("confidence", IssueReason::WrongType);
                return DEFAULT_CONFIDENCE;
            }
            None => return DEFAULT_CONFIDENCE,
        };

        match raw {
            Some(v) if !v.is_finite() => {
                self.flag("confidence", IssueReason::InvalidValue);
                DEFAULT_CONFIDENCE
            }
            Some(v) if !(0.0..=1.0).contains(&v) => {
                self.flag("confidence", IssueReason::OutOfRange);
                v.clamp(0.0, 1.0)
            }
            Some(v) => v,
            None => {
                self.flag("confidence", IssueReason::InvalidValue);
                DEFAULT_CONFIDENCE
            }
        }
    }

    fn seconds(&mut self, field: &'static str) -> u32 {
        let parsed = match self.present(field) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(_) => {
                self.flag(field, IssueReason::WrongType);
                return DEFAULT_INTERVENTION_AFTER_SEC;
            }
            None => return DEFAULT_INTERVENTION_AFTER_SEC,
        };

        match parsed {
            Some(v) if v.is_finite() && v >= 0.0 => v.trunc().min(u32::MAX as f64) as u32,
            Some(v) if v.is_finite() => {
                self.flag(field, IssueReason::OutOfRange);
                DEFAULT_INTERVENTION_AFTER_SEC
            }
            _ => {
                self.flag(field, IssueReason::InvalidValue);
                DEFAULT_INTERVENTION_AFTER_SEC
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reasons(normalized: &Normalized, field: &str) -> Vec<IssueReason> {
        normalized
            .issues
            .iter()
            .filter(|issue| issue.field == field)
            .map(|issue| issue.reason)
            .collect()
    }

    #[test]
    fn test_empty_object_yields_all_defaults() {
        let normalized = normalize(&json!({}));
        assert_eq!(normalized.response, default_response());
        assert_eq!(normalized.response.status, CoachStatus::MildRisk);
        assert_eq!(normalized.response.confidence, 0.5);
        assert_eq!(normalized.response.intervention_after_sec, 30);
        assert!(normalized.response.watch_out.is_empty());
        assert!(normalized.response.try_tests.is_empty());
        assert_eq!(normalized.issues.len(), 7);
        assert!(normalized
            .issues
            .iter()
            .all(|issue| issue.reason == IssueReason::Missing));
    }

    #[test]
    fn test_well_formed_reply_passes_through() {
        let normalized = normalize(&json!({
            "status": "on_track",
            "hint": "Nice progress.",
            "next_step": "Handle the empty input.",
            "watch_out": ["Empty array"],
            "try_tests": ["[]"],
            "confidence": 0.9,
            "intervention_after_sec": 60,
            "extra": "ignored"
        }));

        assert!(normalized.issues.is_empty());
        assert_eq!(normalized.response.status, CoachStatus::OnTrack);
        assert_eq!(normalized.response.hint, "Nice progress.");
        assert_eq!(normalized.response.watch_out, vec!["Empty array"]);
        assert_eq!(normalized.response.confidence, 0.9);
        assert_eq!(normalized.response.intervention_after_sec, 60);
    }

    #[test]
    fn test_non_object_yields_defaults() {
        let normalized = normalize(&json!(["status", "on_track"]));
        assert_eq!(normalized.response, default_response());
        assert_eq!(reasons(&normalized, "$"), vec![IssueReason::NotAnObject]);
    }

    #[test]
    fn test_unknown_status_falls_back() {
        let normalized = normalize(&json!({"status": "catastrophic"}));
        assert_eq!(normalized.response.status, CoachStatus::MildRisk);
        assert_eq!(reasons(&normalized, "status"), vec![IssueReason::InvalidValue]);
    }

    #[test]
    fn test_loose_status_spelling_is_accepted() {
        let normalized = normalize(&json!({"status": "High Risk"}));
        assert_eq!(normalized.response.status, CoachStatus::HighRisk);
        assert!(reasons(&normalized, "status").is_empty());
    }

    #[test]
    fn test_confidence_coercions() {
        assert_eq!(normalize(&json!({"confidence": "0.75"})).response.confidence, 0.75);
        assert_eq!(normalize(&json!({"confidence": 1})).response.confidence, 1.0);

        let clamped = normalize(&json!({"confidence": 85}));
        assert_eq!(clamped.response.confidence, 1.0);
        assert_eq!(reasons(&clamped, "confidence"), vec![IssueReason::OutOfRange]);

        let negative = normalize(&json!({"confidence": -0.2}));
        assert_eq!(negative.response.confidence, 0.0);

        let garbage = normalize(&json!({"confidence": "high"}));
        assert_eq!(garbage.response.confidence, 0.5);
        assert_eq!(reasons(&garbage, "confidence"), vec![IssueReason::InvalidValue]);

        let boolean = normalize(&json!({"confidence": true}));
        assert_eq!(boolean.response.confidence, 0.5);
        assert_eq!(reasons(&boolean, "confidence"), vec![IssueReason::WrongType]);
    }

    #[test]
    fn test_intervention_coercions() {
        assert_eq!(
            normalize(&json!({"intervention_after_sec": 45.9})).response.intervention_after_sec,
            45
        );
        assert_eq!(
            normalize(&json!({"intervention_after_sec": "90"})).response.intervention_after_sec,
            90
        );

        let negative = normalize(&json!({"intervention_after_sec": -5}));
        assert_eq!(negative.response.intervention_after_sec, 30);
        assert_eq!(
            reasons(&negative, "intervention_after_sec"),
            vec![IssueReason::OutOfRange]
        );

        let garbage = normalize(&json!({"intervention_after_sec": "soon"}));
        assert_eq!(garbage.response.intervention_after_sec, 30);
    }

    #[test]
    fn test_list_coercions() {
        let mixed = normalize(&json!({"watch_out": ["Overflow", 3, null, "Empty input"]}));
        assert_eq!(mixed.response.watch_out, vec!["Overflow", "Empty input"]);
        assert_eq!(reasons(&mixed, "watch_out"), vec![IssueReason::WrongType]);

        let single = normalize(&json!({"try_tests": "[1,2,3], target=5"}));
        assert_eq!(single.response.try_tests, vec!["[1,2,3], target=5"]);

        let object = normalize(&json!({"try_tests": {"a": 1}}));
        assert!(object.response.try_tests.is_empty());
    }

    #[test]
    fn test_null_and_wrong_type_text_fields() {
        let normalized = normalize(&json!({"hint": null, "next_step": 42}));
        assert_eq!(normalized.response.hint, DEFAULT_HINT);
        assert_eq!(normalized.response.next_step, DEFAULT_NEXT_STEP);
        assert_eq!(reasons(&normalized, "hint"), vec![IssueReason::Missing]);
        assert_eq!(reasons(&normalized, "next_step"), vec![IssueReason::WrongType]);
    }

    #[test]
    fn test_empty_strings_are_kept() {
        let normalized = normalize(&json!({"next_step": ""}));
        assert_eq!(normalized.response.next_step, "");
        assert!(reasons(&normalized, "next_step").is_empty());
    }
}
