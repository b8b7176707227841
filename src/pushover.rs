//! Pushover notification client.
//!
//! Delivery is fire-and-forget: transport failures and API rejections are
//! logged and swallowed, never surfaced to the caller. At most one attempt
//! per message.

use crate::config::{NotificationOptions, PushoverConfig};
use crate::snapshot::Snapshot;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("missing Pushover user key: set {0} or pushover.user_key in the config")]
    MissingUser(String),
    #[error("missing Pushover application token: set {0} or pushover.api_token in the config")]
    MissingToken(String),
}

/// Credential pair resolved once at startup, environment first. Absence is
/// a constructor failure, checked before any collection work happens.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: String,
    pub token: String,
}

impl Credentials {
    pub fn resolve(cfg: &PushoverConfig) -> Result<Self, CredentialsError> {
        let user = from_env(&cfg.user_key_env)
            .or_else(|| non_empty(cfg.user_key.clone()))
            .ok_or_else(|| CredentialsError::MissingUser(cfg.user_key_env.clone()))?;
        let token = from_env(&cfg.api_token_env)
            .or_else(|| non_empty(cfg.api_token.clone()))
            .ok_or_else(|| CredentialsError::MissingToken(cfg.api_token_env.clone()))?;
        Ok(Self { user, token })
    }
}

fn from_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|v| non_empty(Some(v)))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Outbound message form. Optional parameters that are unset are omitted
/// from the request entirely; `priority` and `html` always travel with
/// their defaults.
#[derive(Debug, Serialize)]
struct Notification<'a> {
    token: &'a str,
    user: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url_title: Option<&'a str>,
    priority: i8,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sound: Option<&'a str>,
    html: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expire: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback: Option<&'a str>,
}

impl<'a> Notification<'a> {
    fn new(credentials: &'a Credentials, message: &'a str, options: &'a NotificationOptions) -> Self {
        Self {
            token: &credentials.token,
            user: &credentials.user,
            message,
            device: options.device.as_deref(),
            title: options.title.as_deref(),
            url: options.url.as_deref(),
            url_title: options.url_title.as_deref(),
            priority: options.priority,
            timestamp: options.timestamp,
            sound: options.sound.as_deref(),
            html: options.html.into(),
            retry: options.retry,
            expire: options.expire,
            callback: options.callback.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PushoverResponse {
    status: i64,
    #[serde(default)]
    errors: Vec<String>,
}

pub struct PushoverClient {
    http: Client,
    endpoint: String,
    timeout: Duration,
    credentials: Credentials,
}

impl PushoverClient {
    pub fn new(credentials: Credentials, cfg: &PushoverConfig) -> Self {
        let http = Client::builder()
            .user_agent("pushsnap/0.1.0")
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            endpoint: cfg.endpoint.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs),
            credentials,
        }
    }

    pub async fn send(&self, message: &str, options: &NotificationOptions) {
        let notification = Notification::new(&self.credentials, message, options);
        let response = self
            .http
            .post(&self.endpoint)
            .timeout(self.timeout)
            .form(&notification)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "failed to send the Pushover message");
                return;
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            error!(status = %status, body = %body, "Pushover rejected the request");
            return;
        }

        match serde_json::from_str::<PushoverResponse>(&body) {
            Ok(parsed) if parsed.status == 1 => info!("Pushover message sent"),
            Ok(parsed) => warn!(
                status = parsed.status,
                errors = ?parsed.errors,
                "Pushover returned a non-success status"
            ),
            Err(err) => warn!(error = %err, "could not parse the Pushover response body"),
        }
    }
}

/// Multi-line digest of a snapshot, handed to `PushoverClient::send` as
/// the message body.
pub fn format_summary(snapshot: &Snapshot) -> String {
    let mut lines = vec![
        format!(
            "{} ({} {})",
            snapshot.hostname, snapshot.os, snapshot.os_version
        ),
        format!("Uptime: {}", human_uptime(snapshot.uptime_seconds)),
        format!(
            "CPU: {} | {}% over {} cores{}",
            snapshot.cpu_model,
            snapshot.cpu_usage_percent,
            snapshot.cpu_cores,
            snapshot
                .cpu_frequency_mhz
                .map(|mhz| format!(" @ {mhz} MHz"))
                .unwrap_or_default()
        ),
        format!(
            "Memory: {:.1} / {:.1} GB ({}%)",
            snapshot.memory_used_gb, snapshot.memory_total_gb, snapshot.memory_usage_percent
        ),
        format!(
            "Disk: {:.1} / {:.1} GB ({:.0}%)",
            snapshot.disk.used_gb(),
            snapshot.disk.total_gb(),
            snapshot.disk.usage_percent
        ),
        format!(
            "Network: sent {}, received {}",
            snapshot.network_sent, snapshot.network_recv
        ),
    ];

    for (i, gpu) in snapshot.gpus.iter().enumerate() {
        lines.push(format!(
            "GPU{i}: {} | {}% | {} / {} GB | {}C",
            gpu.name, gpu.load_percent, gpu.memory_used_gb, gpu.memory_total_gb, gpu.temperature_c
        ));
    }

    if let Some((sensor, celsius)) = hottest_sensor(snapshot) {
        lines.push(format!("Hottest sensor: {sensor} at {celsius:.1}C"));
    }

    lines.join("\n")
}

fn hottest_sensor(snapshot: &Snapshot) -> Option<(String, f64)> {
    snapshot
        .temperatures
        .iter()
        .filter_map(|t| t.celsius.map(|c| (t.flat_key(), c)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

fn human_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3600;
    let mins = (seconds % 3600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {mins}m")
    } else if hours > 0 {
        format!("{hours}h {mins}m")
    } else if mins > 0 {
        format!("{mins}m")
    } else {
        format!("{seconds}s")
    }
}
