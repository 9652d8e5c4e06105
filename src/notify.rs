//! Notification sink. Delivery is best-effort: a dropped message never
//! fails a scan cycle.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::config::Config;
use crate::logging::{log, obj, v_str, Level};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str);
}

pub struct Telegram {
    client: Client,
    base: String,
    token: String,
    chat_id: String,
}

impl Telegram {
    pub fn new(cfg: &Config, token: String, chat_id: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()?;
        Ok(Self { client, base: cfg.telegram_base.clone(), token, chat_id })
    }
}

#[async_trait]
impl Notifier for Telegram {
    async fn send(&self, text: &str) {
        let url = format!("{}/bot{}/sendMessage", self.base, self.token);
        let body = json!({
            "chat_id": self.chat_id,
            "text": format!("[SHORT BOT]\n{}", text),
            "parse_mode": "Markdown",
        });
        match self.client.post(&url).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => {
                log(
                    Level::Warn,
                    "notify",
                    obj(&[
                        ("event", v_str("telegram_rejected")),
                        ("status", v_str(resp.status().as_str())),
                    ]),
                );
            }
            Err(err) => {
                log(
                    Level::Warn,
                    "notify",
                    obj(&[
                        ("event", v_str("telegram_unreachable")),
                        ("error", v_str(&err.to_string())),
                    ]),
                );
            }
        }
    }
}

/// Sink for runs without Telegram credentials; messages only hit the log.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn send(&self, text: &str) {
        log(Level::Debug, "notify", obj(&[("event", v_str("dropped")), ("text", v_str(text))]));
    }
}

/// Telegram when both credentials are present, otherwise the null sink.
pub fn from_config(cfg: &Config) -> Result<Box<dyn Notifier>> {
    match (cfg.telegram_token.clone(), cfg.telegram_chat_id.clone()) {
        (Some(token), Some(chat_id)) => {
            Ok(Box::new(Telegram::new(cfg, token, chat_id)?))
        }
        _ => {
            log(Level::Warn, "notify", obj(&[("event", v_str("no_credentials_null_sink"))]));
            Ok(Box::new(NullNotifier))
        }
    }
}
