use std::time::Duration;

use crate::error::{PlannerError, Result};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-4.1-mini";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CLOSE_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Runtime settings for the planner.
///
/// The credential is optional here: a missing key is reported by the client
/// as a configuration error before any network call, not at load time.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannerConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub max_tokens: Option<u32>,
    /// How long the closing acknowledgment stays up before the auto-reset
    pub close_delay: Duration,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            close_delay: DEFAULT_CLOSE_DELAY,
        }
    }
}

impl PlannerConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Load settings from the process environment.
    ///
    /// `TRIP_PLANNER_API_KEY` (or `OPENAI_API_KEY`), `OPENAI_BASE_URL` (or
    /// `OPENROUTER_BASE_URL`), `TRIP_PLANNER_MODEL`, `TRIP_PLANNER_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.api_key = lookup("TRIP_PLANNER_API_KEY")
            .or_else(|| lookup("OPENAI_API_KEY"))
            .filter(|key| !key.trim().is_empty());

        if let Some(base_url) = lookup("OPENAI_BASE_URL").or_else(|| lookup("OPENROUTER_BASE_URL"))
        {
            config.base_url = base_url;
        }
        if let Some(model) = lookup("TRIP_PLANNER_MODEL") {
            config.model = model;
        }
        if let Some(raw) = lookup("TRIP_PLANNER_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                PlannerError::Configuration(format!(
                    "TRIP_PLANNER_TIMEOUT_SECS must be a whole number of seconds, got `{raw}`"
                ))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_close_delay(mut self, close_delay: Duration) -> Self {
        self.close_delay = close_delay;
        self
    }
}
