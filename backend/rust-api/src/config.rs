use serde::de::DeserializeOwned;
use std::{env, fmt, str::FromStr};

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "tngtech/deepseek-r1t-chimera:free";
pub const DEFAULT_TITLE: &str = "LeetCode Ambient Agent";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub llm: LlmSettings,
    /// Upper bound on `code_snapshot` / `code_diff` characters embedded in the prompt.
    pub max_code_chars: usize,
}

#[derive(Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub referer: String,
    pub title: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f64,
    /// Total attempts for transient provider failures, including the first call.
    pub retry_attempts: usize,
    pub retry_backoff_ms: u64,
}

// The bearer credential must never end up in logs.
impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("api_key", &if self.api_key.is_empty() { "<empty>" } else { "<redacted>" })
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("referer", &self.referer)
            .field("title", &self.title)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .finish()
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            referer: String::new(),
            title: DEFAULT_TITLE.to_string(),
            timeout_secs: 10,
            max_tokens: 300,
            temperature: 0.2,
            retry_attempts: 1,
            retry_backoff_ms: 250,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8787,
            llm: LlmSettings::default(),
            max_code_chars: 6000,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/{env}.toml is optional; APP_* variables (APP_LLM__MODEL) override it
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Self::from_settings(&settings)
    }

    /// Resolves every key against `settings` first, then the unprefixed
    /// variables the browser-extension deployment already uses.
    pub fn from_settings(settings: &config::Config) -> Result<Self, config::ConfigError> {
        let defaults = Config::default();

        let api_key: String = lookup(settings, "llm.api_key", Some("OPENROUTER_API_KEY"))?
            .unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(config::ConfigError::NotFound(
                "llm.api_key (or OPENROUTER_API_KEY)".to_string(),
            ));
        }

        let llm = LlmSettings {
            api_key: api_key.trim().to_string(),
            api_url: lookup(settings, "llm.api_url", Some("OPENROUTER_URL"))?
                .unwrap_or(defaults.llm.api_url),
            model: lookup(settings, "llm.model", Some("OPENROUTER_MODEL"))?
                .unwrap_or(defaults.llm.model),
            referer: lookup(settings, "llm.referer", Some("OPENROUTER_REFERER"))?
                .unwrap_or(defaults.llm.referer),
            title: lookup(settings, "llm.title", Some("OPENROUTER_TITLE"))?
                .unwrap_or(defaults.llm.title),
            timeout_secs: lookup(settings, "llm.timeout_secs", None)?
                .unwrap_or(defaults.llm.timeout_secs)
                .max(1),
            max_tokens: lookup(settings, "llm.max_tokens", None)?
                .unwrap_or(defaults.llm.max_tokens),
            temperature: lookup(settings, "llm.temperature", None)?
                .unwrap_or(defaults.llm.temperature),
            retry_attempts: lookup(settings, "llm.retry_attempts", None)?
                .unwrap_or(defaults.llm.retry_attempts)
                .max(1),
            retry_backoff_ms: lookup(settings, "llm.retry_backoff_ms", None)?
                .unwrap_or(defaults.llm.retry_backoff_ms),
        };

        if !(0.0..=2.0).contains(&llm.temperature) {
            return Err(config::ConfigError::Message(format!(
                "llm.temperature must be within [0, 2], got {}",
                llm.temperature
            )));
        }

        Ok(Config {
            host: lookup(settings, "server.host", None)?.unwrap_or(defaults.host),
            port: lookup(settings, "server.port", Some("PORT"))?.unwrap_or(defaults.port),
            llm,
            max_code_chars: lookup(settings, "prompt.max_code_chars", None)?
                .unwrap_or(defaults.max_code_chars),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn lookup<T>(
    settings: &config::Config,
    key: &str,
    legacy_env: Option<&str>,
) -> Result<Option<T>, config::ConfigError>
where
    T: DeserializeOwned + FromStr,
    T::Err: fmt::Display,
{
    match settings.get::<T>(key) {
        Ok(value) => return Ok(Some(value)),
        Err(config::ConfigError::NotFound(_)) => {}
        Err(e) => return Err(e),
    }

    let Some(var) = legacy_env else {
        return Ok(None);
    };

    match env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| config::ConfigError::Message(format!("{}: {}", var, e))),
        _ => Ok(None),
    }
}
