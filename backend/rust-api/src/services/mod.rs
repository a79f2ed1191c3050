use std::sync::Arc;

use crate::config::Config;
use analysis_service::AnalysisService;
use llm_client::{ChatCompletion, OpenRouterClient};

pub mod analysis_service;
pub mod llm_client;
pub mod normalizer;
pub mod prompts;
pub mod rules;

pub struct AppState {
    pub config: Config,
    pub analysis: AnalysisService,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let provider = Arc::new(OpenRouterClient::new(&config.llm)?);

        tracing::info!(
            model = %config.llm.model,
            api_url = %config.llm.api_url,
            timeout_secs = config.llm.timeout_secs,
            "Chat-completion provider configured"
        );

        Ok(Self::with_provider(config, provider))
    }

    /// Builds the state around any provider; tests plug in scripted ones here.
    pub fn with_provider(config: Config, provider: Arc<dyn ChatCompletion>) -> Self {
        let analysis = AnalysisService::new(provider, &config);
        Self { config, analysis }
    }
}
