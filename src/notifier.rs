use crate::error::{MonitorError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Telegram counts message length in UTF-16 code units.
const TELEGRAM_MAX_MESSAGE_UNITS: usize = 4096;
const TRUNCATION_MARKER: &str = "\n…(truncated)";
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Best-effort text delivery to a fixed destination.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

/// Sends `text` and logs a failure instead of returning it. Alerts that could
/// not be delivered are dropped.
pub async fn deliver<N>(notifier: &N, text: &str) -> bool
where
    N: Notifier + ?Sized,
{
    match notifier.send(text).await {
        Ok(()) => {
            debug!("Notification delivered ({} chars)", text.chars().count());
            true
        }
        Err(e) => {
            warn!("Dropping notification: {}", e);
            false
        }
    }
}

#[derive(Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    endpoint: String,
    chat_id: String,
}

#[derive(Deserialize)]
struct TelegramResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(api_url: &str, bot_token: &str, chat_id: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| MonitorError::InvalidConfiguration {
                key: "TELEGRAM_API_URL",
                reason: e.to_string(),
            })?;

        Ok(TelegramNotifier {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                api_url.trim_end_matches('/'),
                bot_token
            ),
            chat_id: chat_id.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let payload = json!({
            "chat_id": self.chat_id,
            "text": fit_message(text),
            "disable_web_page_preview": true,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MonitorError::NotificationFailed(e.without_url().to_string()))?;

        let status = response.status();
        let body: Option<TelegramResponse> = response.json().await.ok();

        match body {
            Some(TelegramResponse { ok: true, .. }) if status.is_success() => Ok(()),
            Some(TelegramResponse { description, .. }) => Err(MonitorError::NotificationFailed(
                format!(
                    "telegram returned {}: {}",
                    status,
                    description.unwrap_or_else(|| "no description".to_string())
                ),
            )),
            None => Err(MonitorError::NotificationFailed(format!(
                "telegram returned {status} with an unreadable body"
            ))),
        }
    }
}

fn fit_message(text: &str) -> String {
    if text.encode_utf16().count() <= TELEGRAM_MAX_MESSAGE_UNITS {
        return text.to_string();
    }
    let mut budget = TELEGRAM_MAX_MESSAGE_UNITS - TRUNCATION_MARKER.encode_utf16().count();
    let mut fitted = String::new();
    for c in text.chars() {
        if c.len_utf16() > budget {
            break;
        }
        budget -= c.len_utf16();
        fitted.push(c);
    }
    fitted.push_str(TRUNCATION_MARKER);
    fitted
}
