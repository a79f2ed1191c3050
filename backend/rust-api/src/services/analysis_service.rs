use anyhow::{Context, Result};
use serde_json::Value;
use std::{sync::Arc, time::Duration, time::Instant};

use crate::config::Config;
use crate::metrics;
use crate::models::analysis::{AnalyzeRequest, AnalyzeResponse, CoachStatus};
use crate::services::{
    llm_client::{ChatCompletion, ProviderError},
    normalizer, prompts, rules,
};
use crate::utils::{
    json_extract::extract_json,
    retry::{retry_async_if, RetryConfig},
};

/// Served whenever the model path fails for any reason.
pub fn fallback_response() -> AnalyzeResponse {
    AnalyzeResponse {
        status: CoachStatus::MildRisk,
        hint: "Analyzer error; try again soon.".to_string(),
        next_step: "Review constraints and add a tiny test.".to_string(),
        watch_out: vec!["Edge cases".to_string(), "Time complexity".to_string()],
        try_tests: Vec::new(),
        confidence: 0.5,
        intervention_after_sec: 45,
    }
}

/// Rules first, model second, fixed fallback last. Holds no per-request
/// state, so one instance serves all requests concurrently.
pub struct AnalysisService {
    provider: Arc<dyn ChatCompletion>,
    max_tokens: u32,
    temperature: f64,
    max_code_chars: usize,
    retry: RetryConfig,
}

impl AnalysisService {
    pub fn new(provider: Arc<dyn ChatCompletion>, config: &Config) -> Self {
        Self {
            provider,
            max_tokens: config.llm.max_tokens,
            temperature: config.llm.temperature,
            max_code_chars: config.max_code_chars,
            retry: RetryConfig::from_backoff(
                config.llm.retry_attempts,
                Duration::from_millis(config.llm.retry_backoff_ms),
            ),
        }
    }

    /// Never fails: provider and parse errors become [`fallback_response`].
    pub async fn analyze(&self, req: &AnalyzeRequest) -> AnalyzeResponse {
        if let Some(hit) = rules::match_rule(req) {
            tracing::info!(rule = hit.rule.as_str(), "Heuristic fast-path matched");
            metrics::record_rule_hit(hit.rule.as_str());
            metrics::record_analysis("rule");
            return hit.response;
        }

        tracing::info!("No heuristic matched, taking the model path");
        match self.consult_model(req).await {
            Ok(response) => {
                metrics::record_analysis("llm");
                response
            }
            Err(e) => {
                tracing::error!("Model analysis failed, serving fallback: {:#}", e);
                metrics::record_analysis("fallback");
                fallback_response()
            }
        }
    }

    async fn consult_model(&self, req: &AnalyzeRequest) -> Result<AnalyzeResponse> {
        let user_prompt = prompts::build_user_prompt(req, self.max_code_chars);
        tracing::debug!(prompt_chars = user_prompt.len(), "Consulting chat-completion provider");

        let raw = retry_async_if(self.retry.clone(), ProviderError::is_transient, || {
            self.call_provider(&user_prompt)
        })
        .await
        .context("Chat-completion provider failed")?;
        tracing::debug!(reply_chars = raw.len(), "Provider replied");

        let parsed: Value = serde_json::from_str(&extract_json(&raw))
            .context("Model reply did not contain a parseable JSON object")?;

        let normalized = normalizer::normalize(&parsed);
        for issue in &normalized.issues {
            tracing::warn!(
                field = issue.field,
                reason = issue.reason.as_str(),
                "Model reply field replaced by default"
            );
            metrics::record_normalization_issue(issue.field, issue.reason.as_str());
        }

        Ok(normalized.response)
    }

    async fn call_provider(&self, user_prompt: &str) -> Result<String, ProviderError> {
        let start = Instant::now();
        let result = self
            .provider
            .complete(
                prompts::SYSTEM_PROMPT,
                user_prompt,
                self.max_tokens,
                self.temperature,
            )
            .await;

        match &result {
            Ok(_) => metrics::record_llm_call("success", start.elapsed()),
            Err(e) => {
                metrics::record_llm_call(e.kind(), start.elapsed());
                if e.is_transient() {
                    tracing::warn!("Transient provider failure: {}", e);
                }
            }
        }

        result
    }
}
