use anyhow::{Context, Result, bail};
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub provider: ProviderConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub api_url: String,
    pub model: String,
    pub temperature: f64,
    /// `None` leaves the HTTP call unbounded.
    pub timeout: Option<Duration>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be a socket address such as 127.0.0.1:3000")?;

        let mut provider = ProviderConfig::default();
        if let Some(api_url) = lookup("LLM_API_URL") {
            provider.api_url = api_url;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            provider.model = model;
        }
        if let Some(raw) = lookup("LLM_TEMPERATURE") {
            let temperature = raw
                .parse::<f64>()
                .with_context(|| format!("LLM_TEMPERATURE is not a number: {raw:?}"))?;
            if !(0.0..=2.0).contains(&temperature) {
                bail!("LLM_TEMPERATURE must be between 0 and 2, got {temperature}");
            }
            provider.temperature = temperature;
        }
        if let Some(raw) = lookup("LLM_TIMEOUT_SECS") {
            let secs = raw
                .parse::<u64>()
                .with_context(|| format!("LLM_TIMEOUT_SECS is not a whole number: {raw:?}"))?;
            if secs == 0 {
                bail!("LLM_TIMEOUT_SECS must be positive");
            }
            provider.timeout = Some(Duration::from_secs(secs));
        }

        Ok(Config {
            bind_addr,
            provider,
        })
    }
}
