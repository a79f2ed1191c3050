use serde::{Deserialize, Serialize};
use validator::Validate;

pub const MAX_CODE_SNAPSHOT_CHARS: u64 = 20_000;
pub const DEFAULT_INTERVENTION_AFTER_SEC: u32 = 30;

/// Coding platforms the coach accepts snapshots from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSource {
    Leetcode,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskContext {
    pub source: TaskSource,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WorkState {
    #[validate(length(min = 1, message = "language must not be empty"))]
    pub language: String,
    #[serde(default)]
    #[validate(length(max = MAX_CODE_SNAPSHOT_CHARS, message = "code_snapshot is too long"))]
    pub code_snapshot: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_diff: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_sec: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Signals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_errors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity_guess: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_guess: Option<String>,
}

/// Snapshot of a coding session sent by the browser extension.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnalyzeRequest {
    #[validate(nested)]
    pub task_context: TaskContext,
    #[validate(nested)]
    pub work_state: WorkState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signals: Option<Signals>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoachStatus {
    Error,
    OnTrack,
    MildRisk,
    MediumRisk,
    HighRisk,
}

impl CoachStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoachStatus::Error => "error",
            CoachStatus::OnTrack => "on_track",
            CoachStatus::MildRisk => "mild_risk",
            CoachStatus::MediumRisk => "medium_risk",
            CoachStatus::HighRisk => "high_risk",
        }
    }

    /// Accepts the spellings models tend to produce ("On-Track", "high risk").
    pub fn parse_loose(raw: &str) -> Option<Self> {
        let key = raw.trim().to_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "error" => Some(CoachStatus::Error),
            "on_track" => Some(CoachStatus::OnTrack),
            "mild_risk" => Some(CoachStatus::MildRisk),
            "medium_risk" => Some(CoachStatus::MediumRisk),
            "high_risk" => Some(CoachStatus::HighRisk),
            _ => None,
        }
    }
}

/// Coaching feedback returned for every analysed snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub status: CoachStatus,
    pub hint: String,
    #[serde(default)]
    pub next_step: String,
    #[serde(default)]
    pub watch_out: Vec<String>,
    #[serde(default)]
    pub try_tests: Vec<String>,
    pub confidence: f64,
    #[serde(default = "default_intervention_after_sec")]
    pub intervention_after_sec: u32,
}

fn default_intervention_after_sec() -> u32 {
    DEFAULT_INTERVENTION_AFTER_SEC
}
