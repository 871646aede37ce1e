use crate::alert::{DEFAULT_EXPLORER_URL, DEFAULT_SENDER_THRESHOLD};
use crate::analyzer::{DEFAULT_DUST_THRESHOLD, parse_native_amount};
use crate::classifier::DEFAULT_TOP_SENDER_LIMIT;
use crate::error::{MonitorError, Result};
use crate::notifier::DEFAULT_TELEGRAM_API_URL;
use crate::pending::{DEFAULT_PENDING_THRESHOLD, DEFAULT_POOL_SENDER_THRESHOLD};
use crate::scanner::{DEFAULT_HISTORY_DEPTH, DEFAULT_SPAM_THRESHOLD};
use alloy_primitives::U256;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 15_000;

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub api_url: String,
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub json_rpc_urls: Vec<String>,
    pub telegram: Option<TelegramConfig>,
    pub spam_threshold: usize,
    pub history_depth: u64,
    pub poll_interval: Duration,
    pub dust_threshold: U256,
    pub sender_threshold: usize,
    pub pending_threshold: u64,
    pub pool_sender_threshold: usize,
    pub top_sender_limit: usize,
    pub explorer_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source. Missing optional
    /// keys fall back to their defaults; malformed values are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let json_rpc_urls: Vec<String> = get("JSON_RPC_URLS")
            .or_else(|| get("JSON_RPC_URL"))
            .map(|raw| {
                raw.split(',')
                    .map(|url| url.trim().to_string())
                    .filter(|url| !url.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        if json_rpc_urls.is_empty() {
            return Err(MonitorError::ConfigurationMissing("JSON_RPC_URL"));
        }

        let telegram = match (get("TELEGRAM_BOT_TOKEN"), get("TELEGRAM_CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig {
                api_url: get("TELEGRAM_API_URL")
                    .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
                bot_token,
                chat_id,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(MonitorError::ConfigurationMissing("TELEGRAM_CHAT_ID")),
            (None, Some(_)) => {
                return Err(MonitorError::ConfigurationMissing("TELEGRAM_BOT_TOKEN"));
            }
        };

        let dust_raw = get("DUST_THRESHOLD").unwrap_or_else(|| DEFAULT_DUST_THRESHOLD.to_string());
        let dust_threshold = parse_native_amount(&dust_raw).map_err(|reason| {
            MonitorError::InvalidConfiguration {
                key: "DUST_THRESHOLD",
                reason,
            }
        })?;

        let spam_threshold = parse_or(&get, "SPAM_THRESHOLD", DEFAULT_SPAM_THRESHOLD)?;
        if spam_threshold == 0 {
            return Err(MonitorError::InvalidConfiguration {
                key: "SPAM_THRESHOLD",
                reason: "must be at least 1".to_string(),
            });
        }

        let poll_interval_ms = parse_or(&get, "POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?;
        if poll_interval_ms == 0 {
            return Err(MonitorError::InvalidConfiguration {
                key: "POLL_INTERVAL_MS",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Config {
            json_rpc_urls,
            telegram,
            spam_threshold,
            history_depth: parse_or(&get, "HISTORY_DEPTH", DEFAULT_HISTORY_DEPTH)?,
            poll_interval: Duration::from_millis(poll_interval_ms),
            dust_threshold,
            sender_threshold: parse_or(&get, "SENDER_THRESHOLD", DEFAULT_SENDER_THRESHOLD)?,
            pending_threshold: parse_or(&get, "PENDING_THRESHOLD", DEFAULT_PENDING_THRESHOLD)?,
            pool_sender_threshold: parse_or(
                &get,
                "POOL_SENDER_THRESHOLD",
                DEFAULT_POOL_SENDER_THRESHOLD,
            )?,
            top_sender_limit: parse_or(&get, "TOP_SENDER_LIMIT", DEFAULT_TOP_SENDER_LIMIT)?,
            explorer_url: get("EXPLORER_URL").unwrap_or_else(|| DEFAULT_EXPLORER_URL.to_string()),
        })
    }

    /// The watcher cannot run without somewhere to send alerts.
    pub fn require_telegram(&self) -> Result<&TelegramConfig> {
        self.telegram
            .as_ref()
            .ok_or(MonitorError::ConfigurationMissing("TELEGRAM_BOT_TOKEN"))
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| MonitorError::InvalidConfiguration {
                key,
                reason: e.to_string(),
            }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_rpc_is_set() {
        let config =
            Config::from_lookup(lookup(&[("JSON_RPC_URL", "http://localhost:8545")])).unwrap();

        assert_eq!(config.json_rpc_urls, vec!["http://localhost:8545"]);
        assert_eq!(config.spam_threshold, 20);
        assert_eq!(config.history_depth, 100);
        assert_eq!(config.poll_interval, Duration::from_millis(15_000));
        assert_eq!(config.dust_threshold, U256::from(1_000_000_000_000_000u64));
        assert_eq!(config.pending_threshold, 50);
        assert_eq!(config.pool_sender_threshold, 10);
        assert_eq!(config.top_sender_limit, 5);
        assert_eq!(config.explorer_url, "https://etherscan.io");
        assert!(config.telegram.is_none());
        assert!(matches!(
            config.require_telegram(),
            Err(MonitorError::ConfigurationMissing("TELEGRAM_BOT_TOKEN"))
        ));
    }

    #[test]
    fn missing_rpc_url_is_fatal() {
        let err = Config::from_lookup(lookup(&[("JSON_RPC_URL", "  ")])).unwrap_err();
        assert!(matches!(err, MonitorError::ConfigurationMissing("JSON_RPC_URL")));
    }

    #[test]
    fn parses_overrides_and_url_list() {
        let config = Config::from_lookup(lookup(&[
            ("JSON_RPC_URLS", "http://a, http://b,"),
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_CHAT_ID", "-1001"),
            ("SPAM_THRESHOLD", "35"),
            ("HISTORY_DEPTH", "0"),
            ("DUST_THRESHOLD", "0.5"),
        ]))
        .unwrap();

        assert_eq!(config.json_rpc_urls, vec!["http://a", "http://b"]);
        assert_eq!(config.spam_threshold, 35);
        assert_eq!(config.history_depth, 0);
        assert_eq!(config.dust_threshold, U256::from(500_000_000_000_000_000u64));
        let telegram = config.require_telegram().unwrap();
        assert_eq!(telegram.chat_id, "-1001");
        assert_eq!(telegram.api_url, DEFAULT_TELEGRAM_API_URL);
    }

    #[test]
    fn half_configured_telegram_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("JSON_RPC_URL", "http://a"),
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
        ]))
        .unwrap_err();
        assert!(matches!(err, MonitorError::ConfigurationMissing("TELEGRAM_CHAT_ID")));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("JSON_RPC_URL", "http://a"),
            ("SPAM_THRESHOLD", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            MonitorError::InvalidConfiguration {
                key: "SPAM_THRESHOLD",
                ..
            }
        ));
    }
}
