use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::layout::{default_page_config, page_config, FontFamily, PageConfig};
use crate::llm_client::{ChatModel, ProviderKeys};

/// Application configuration loaded from environment variables.
/// Everything has a default; provider keys are optional and disable only their own models.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub page: PageConfig,
    pub mount_timeout: Duration,
    pub provider_keys: ProviderKeys,
    pub default_chat_models: Vec<ChatModel>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let font = match var("PAGE_FONT") {
            Some(name) => name
                .parse::<FontFamily>()
                .map_err(|e| anyhow!(e))
                .context("PAGE_FONT must name a supported font family")?,
            None => FontFamily::Inter,
        };
        let defaults = default_page_config(font);
        let font_size_pt = parse_or(var("PAGE_FONT_SIZE_PT"), defaults.font_size_pt)
            .context("PAGE_FONT_SIZE_PT must be a whole number of points")?;
        let lines_per_page = parse_or(var("PAGE_LINES"), defaults.lines_per_page)
            .context("PAGE_LINES must be a positive integer")?;
        let mount_timeout_ms = parse_or(var("MOUNT_TIMEOUT_MS"), 2000u64)
            .context("MOUNT_TIMEOUT_MS must be a number of milliseconds")?;

        let default_chat_models = match var("DEFAULT_CHAT_MODELS") {
            Some(list) => list
                .split(',')
                .filter(|m| !m.trim().is_empty())
                .map(|m| m.parse::<ChatModel>().map_err(|e| anyhow!(e)))
                .collect::<Result<Vec<_>>>()
                .context("DEFAULT_CHAT_MODELS must be a comma list of claude, chatgpt, llama")?,
            None => vec![ChatModel::Claude, ChatModel::ChatGpt],
        };

        Ok(Config {
            port: parse_or(var("PORT"), 8080u16).context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            page: page_config(font, font_size_pt, lines_per_page),
            mount_timeout: Duration::from_millis(mount_timeout_ms),
            provider_keys: ProviderKeys {
                anthropic: var("ANTHROPIC_API_KEY"),
                openai: var("OPENAI_API_KEY"),
                together: var("TOGETHER_API_KEY"),
            },
            default_chat_models,
        })
    }
}

fn parse_or<T>(value: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => Ok(v.trim().parse::<T>()?),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).expect("defaults");
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.page.font, FontFamily::Inter);
        assert_eq!(config.page.font_size_pt, 11);
        assert_eq!(config.page.lines_per_page, 45);
        assert_eq!(config.mount_timeout, Duration::from_millis(2000));
        assert!(config.provider_keys.anthropic.is_none());
        assert_eq!(
            config.default_chat_models,
            vec![ChatModel::Claude, ChatModel::ChatGpt]
        );
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("PAGE_FONT", "garamond"),
            ("PAGE_LINES", "30"),
            ("MOUNT_TIMEOUT_MS", "50"),
            ("OPENAI_API_KEY", "sk-test"),
            ("DEFAULT_CHAT_MODELS", "llama, chatgpt"),
        ])
        .expect("overrides");
        assert_eq!(config.port, 9000);
        assert_eq!(config.page.font, FontFamily::EbGaramond);
        assert_eq!(config.page.lines_per_page, 30);
        assert_eq!(config.mount_timeout, Duration::from_millis(50));
        assert_eq!(config.provider_keys.openai.as_deref(), Some("sk-test"));
        assert_eq!(
            config.default_chat_models,
            vec![ChatModel::Llama, ChatModel::ChatGpt]
        );
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = config_from(&[("PORT", "  "), ("ANTHROPIC_API_KEY", "")]).expect("blank");
        assert_eq!(config.port, 8080);
        assert!(config.provider_keys.anthropic.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config_from(&[("PORT", "eighty")]).is_err());
        assert!(config_from(&[("PAGE_FONT", "comic_sans")]).is_err());
        assert!(config_from(&[("DEFAULT_CHAT_MODELS", "claude,bard")]).is_err());
    }
}
