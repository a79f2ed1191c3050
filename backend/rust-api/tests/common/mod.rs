#![allow(dead_code)]

use ambient_coach_api::{
    config::Config,
    create_router,
    services::{
        llm_client::{ChatCompletion, ProviderError},
        AppState,
    },
};
use async_trait::async_trait;
use axum::Router;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Provider that replays scripted replies and remembers the prompts it saw.
#[derive(Default)]
pub struct StubProvider {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        })
    }

    /// Answers every call with the same text.
    pub fn replying(text: &str, times: usize) -> Arc<Self> {
        Self::new((0..times).map(|_| Ok(text.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatCompletion for StubProvider {
    async fn complete(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        _max_tokens: u32,
        _temperature: f64,
    ) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(user_prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Network("stub has no reply left".into())))
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.llm.api_key = "sk-test".to_string();
    config.llm.model = "test/coach-model".to_string();
    config.llm.retry_backoff_ms = 1;
    config
}

pub fn create_test_app(provider: Arc<StubProvider>) -> Router {
    create_test_app_with_config(provider, test_config())
}

pub fn create_test_app_with_config(provider: Arc<StubProvider>, config: Config) -> Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let app_state = Arc::new(AppState::with_provider(config, provider));
    create_router(app_state)
}

/// A request that no heuristic matches, so it always reaches the provider.
pub fn model_path_request() -> Value {
    json!({
        "task_context": {
            "source": "leetcode",
            "title": "Valid Anagram",
            "difficulty": "Easy"
        },
        "work_state": {
            "language": "python",
            "code_snapshot": "def isAnagram(s, t):\n    return sorted(s) == sorted(t)\n",
            "elapsed_sec": 240
        },
        "signals": {
            "run_errors": [],
            "complexity_guess": "O(n log n)"
        }
    })
}
