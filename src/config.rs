//! Configuration loading and runtime settings.
//!
//! Settings come from an optional `vidacquire.toml`, with CLI flags taking
//! precedence over file values. Every tunable has a default so the tool runs
//! with no configuration at all.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_base_url() -> String {
    "https://www.youtube.com".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

fn default_client_name() -> String {
    "1".to_string()
}

fn default_client_version() -> String {
    "2.20200911.04.00".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_request_delay_ms() -> u64 {
    250
}

/// HTTP fetch settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Base URL of the site. Overridable for tests against a local server.
    pub base_url: String,
    pub user_agent: String,
    /// Sent as Accept-Language on every request; the relative-timestamp
    /// parser assumes English phrases.
    pub accept_language: String,
    /// Client identity headers required by the internal endpoints.
    pub client_name: String,
    pub client_version: String,
    pub timeout_secs: u64,
    /// Base pacing delay applied after every request.
    pub request_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            client_name: default_client_name(),
            client_version: default_client_version(),
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

/// Continuation walk settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Maximum continuations followed per walk before a soft stop. Guards
    /// against runaway pagination on anomalous threads.
    pub continuation_limit: usize,
    /// Maximum concurrent reply sub-walks per comment walk.
    pub max_reply_forks: usize,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            continuation_limit: 500,
            max_reply_forks: 16,
        }
    }
}

/// Crawl scheduler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Process-wide worker count. Applies uniformly to seed and discovered
    /// jobs; there is no separate priority lane.
    pub workers: usize,
    /// Queue size cap. Oldest entries are dropped (and logged) past this.
    pub queue_cap: usize,
    /// Dedup set size cap; 0 means unbounded.
    pub dedup_cap: usize,
    /// Requeue attempts for retryable failures.
    pub max_retries: u32,
    /// Sleep before re-polling an empty queue.
    pub idle_backoff_ms: u64,
    /// Stop after this many successfully crawled resources; 0 = drain.
    pub limit: usize,
    /// Maximum discovery depth; 0 = unlimited.
    pub max_depth: u32,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_cap: 100_000,
            dedup_cap: 0,
            max_retries: 3,
            idle_backoff_ms: 100,
            limit: 0,
            max_depth: 0,
        }
    }
}

impl CrawlConfig {
    pub fn idle_backoff(&self) -> Duration {
        Duration::from_millis(self.idle_backoff_ms)
    }
}

/// Systemic failure circuit breaker. One central tunable, shared by every
/// call site rather than hardcoded per caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailurePolicy {
    /// Failures within the window that trigger a fatal abort. 0 derives a
    /// threshold from the worker count.
    pub threshold: usize,
    pub window_secs: u64,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self {
            threshold: 0,
            window_secs: 60,
        }
    }
}

impl FailurePolicy {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Threshold scaled to the worker pool when not set explicitly.
    pub fn effective_threshold(&self, workers: usize) -> usize {
        if self.threshold > 0 {
            self.threshold
        } else {
            10.max(workers + 2)
        }
    }
}

/// Batch sink settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub batch_size: usize,
    /// Idle flush: a non-empty partial batch is flushed after this long.
    pub flush_interval_secs: u64,
    pub failure: FailurePolicy,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            flush_interval_secs: 5,
            failure: FailurePolicy::default(),
        }
    }
}

impl SinkConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }
}

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fetch: FetchConfig,
    pub walk: WalkConfig,
    pub crawl: CrawlConfig,
    pub sink: SinkConfig,
}

impl Settings {
    /// Load settings from an explicit path, or from `vidacquire.toml` in the
    /// working directory if present, or defaults otherwise.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let candidate = match path {
            Some(p) => Some(p.to_path_buf()),
            None => {
                let default = Path::new("vidacquire.toml");
                default.exists().then(|| default.to_path_buf())
            }
        };

        match candidate {
            Some(p) => {
                let raw = std::fs::read_to_string(&p)
                    .map_err(|e| anyhow::anyhow!("reading {}: {}", p.display(), e))?;
                let settings = toml::from_str(&raw)
                    .map_err(|e| anyhow::anyhow!("parsing {}: {}", p.display(), e))?;
                Ok(settings)
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_usable() {
        let settings = Settings::default();
        assert!(settings.crawl.workers > 0);
        assert!(settings.sink.batch_size > 0);
        assert_eq!(settings.fetch.base_url, "https://www.youtube.com");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [crawl]
            workers = 8

            [sink.failure]
            threshold = 20
            "#,
        )
        .unwrap();
        assert_eq!(settings.crawl.workers, 8);
        assert_eq!(settings.sink.failure.threshold, 20);
        assert_eq!(settings.sink.batch_size, 50);
    }

    #[test]
    fn test_failure_threshold_derived_from_workers() {
        let policy = FailurePolicy::default();
        assert_eq!(policy.effective_threshold(4), 10);
        assert_eq!(policy.effective_threshold(16), 18);
        let explicit = FailurePolicy {
            threshold: 5,
            window_secs: 60,
        };
        assert_eq!(explicit.effective_threshold(16), 5);
    }
}
