use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub jitter_max: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from_backoff(1, Duration::from_millis(250))
    }
}

impl RetryConfig {
    /// Backoff doubles per attempt up to 8x the base, with up to half the base as jitter.
    pub fn from_backoff(max_attempts: usize, base_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff,
            max_backoff: base_backoff * 8,
            jitter_max: Some(base_backoff / 2),
        }
    }

    fn jittered(&self, backoff: Duration) -> Duration {
        let Some(jitter_max) = self.jitter_max else {
            return backoff;
        };
        let jitter_ms = jitter_max.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::random::<u64>() % (jitter_ms + 1)
        };
        backoff + Duration::from_millis(extra)
    }
}

/// Runs `f` until it succeeds, the attempts run out, or it fails with an
/// error `should_retry` rejects. The last error is returned unchanged.
pub async fn retry_async_if<F, Fut, T, E, P>(
    config: RetryConfig,
    should_retry: P,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut attempts_left = config.max_attempts.max(1);
    let mut backoff = config.base_backoff;

    loop {
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                attempts_left = attempts_left.saturating_sub(1);
                if attempts_left == 0 || !should_retry(&e) {
                    return Err(e);
                }

                tokio::time::sleep(config.jittered(backoff)).await;
                backoff = std::cmp::min(backoff * 2, config.max_backoff);
            }
        }
    }
}
