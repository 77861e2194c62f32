use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use http::Extensions;
use reqwest::Url;
use reqwest_middleware::{Middleware, Next};
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

const MIN_INTERVAL_ENV: &str = "PGXRISK_EXPLAIN_MIN_INTERVAL_MS";
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(250);

/// Spaces requests to the same origin by at least `min_interval`.
#[derive(Debug)]
pub(crate) struct RateLimiter {
    min_interval: Duration,
    last_seen: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    pub(crate) fn from_env() -> Self {
        let min_interval = crate::sources::env_value(MIN_INTERVAL_ENV)
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_MIN_INTERVAL);
        Self::new(min_interval)
    }

    pub(crate) fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    fn origin_key(url: &Url) -> String {
        let port = url
            .port_or_known_default()
            .map(|p| format!(":{p}"))
            .unwrap_or_default();
        format!(
            "{}://{}{port}",
            url.scheme(),
            url.host_str().unwrap_or("unknown-host")
        )
    }

    pub(crate) async fn wait_for_url(&self, url: &Url) {
        let key = Self::origin_key(url);
        loop {
            let now = Instant::now();
            let mut map = self.last_seen.lock().await;
            let wait_until = map.get(&key).map(|last| *last + self.min_interval);

            match wait_until {
                Some(target) if target > now => {
                    drop(map);
                    sleep_until(target).await;
                }
                _ => {
                    map.insert(key, now);
                    return;
                }
            }
        }
    }
}

static GLOBAL_RATE_LIMITER: OnceLock<Arc<RateLimiter>> = OnceLock::new();

fn global_limiter() -> Arc<RateLimiter> {
    GLOBAL_RATE_LIMITER
        .get_or_init(|| Arc::new(RateLimiter::from_env()))
        .clone()
}

#[derive(Clone, Debug)]
pub(crate) struct RateLimitMiddleware {
    limiter: Arc<RateLimiter>,
}

impl RateLimitMiddleware {
    pub(crate) fn new() -> Self {
        Self {
            limiter: global_limiter(),
        }
    }
}

#[async_trait::async_trait]
impl Middleware for RateLimitMiddleware {
    async fn handle(
        &self,
        req: reqwest::Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<reqwest::Response> {
        self.limiter.wait_for_url(req.url()).await;
        next.run(req, extensions).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rate_limit_blocks_second_request_for_same_origin() {
        let limiter = RateLimiter::new(Duration::from_millis(120));
        let first = Url::parse("https://gateway.example.org/v1/chat/completions").unwrap();
        let second = Url::parse("https://gateway.example.org/v1/models").unwrap();

        let start = Instant::now();
        limiter.wait_for_url(&first).await;
        limiter.wait_for_url(&second).await;

        assert!(
            start.elapsed() >= Duration::from_millis(100),
            "second request to the same origin should be throttled"
        );
    }

    #[tokio::test]
    async fn rate_limit_keeps_origins_independent() {
        let limiter = RateLimiter::new(Duration::from_millis(100));
        let a = Url::parse("https://a.example.org/v1/chat/completions").unwrap();
        let b = Url::parse("https://b.example.org/v1/chat/completions").unwrap();

        let start = Instant::now();
        limiter.wait_for_url(&a).await;
        limiter.wait_for_url(&b).await;

        assert!(
            start.elapsed() < Duration::from_millis(80),
            "different origins should not block each other"
        );
    }

    #[test]
    fn origin_key_includes_port() {
        let url = Url::parse("http://127.0.0.1:8080/v1/chat/completions").unwrap();
        assert_eq!(RateLimiter::origin_key(&url), "http://127.0.0.1:8080");
        let url = Url::parse("https://api.example.org/v1").unwrap();
        assert_eq!(RateLimiter::origin_key(&url), "https://api.example.org:443");
    }
}
