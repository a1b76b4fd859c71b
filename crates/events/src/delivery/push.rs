//! Push notification delivery over HTTP (ntfy-compatible).
//!
//! [`PushDelivery`] POSTs a plain-text body to a topic URL with the
//! notification metadata carried in headers (`Title`, `Priority`, `Tags`,
//! `Click`). A single attempt is made per message; there is no retry.

use std::time::Duration;

use farmlink_core::error::CoreError;

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Public ntfy server used when only a topic name is configured.
const DEFAULT_NTFY_BASE: &str = "https://ntfy.sh";

const DEFAULT_TOPIC: &str = "farmlink-alerts";

const DEFAULT_APP_URL: &str = "http://localhost:8080";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The push endpoint returned a non-2xx status code.
    #[error("Push endpoint returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// PushConfig
// ---------------------------------------------------------------------------

/// Where alerts go and what they link back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushConfig {
    /// Full topic URL notifications are POSTed to.
    pub endpoint: String,
    /// Public dashboard URL sent as the `Click` deep link.
    pub click_url: String,
    /// Send an explicit "all clear" push on recovery. Off by default:
    /// recovery only resets the alert flag.
    pub notify_on_recovery: bool,
}

impl PushConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                   | Default                        |
    /// |----------------------------|--------------------------------|
    /// | `ALERT_URL`                | `https://ntfy.sh/<ALERT_TOPIC>` |
    /// | `ALERT_TOPIC`              | `farmlink-alerts`              |
    /// | `APP_URL`                  | `http://localhost:8080`        |
    /// | `ALERT_NOTIFY_ON_RECOVERY` | `false`                        |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let endpoint = lookup("ALERT_URL").unwrap_or_else(|| {
            let topic = lookup("ALERT_TOPIC").unwrap_or_else(|| DEFAULT_TOPIC.to_string());
            topic_url(&topic)
        });

        let notify_on_recovery = match lookup("ALERT_NOTIFY_ON_RECOVERY") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                CoreError::Validation(format!(
                    "ALERT_NOTIFY_ON_RECOVERY must be 'true' or 'false', got '{raw}'"
                ))
            })?,
            None => false,
        };

        Ok(Self {
            endpoint,
            click_url: lookup("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.to_string()),
            notify_on_recovery,
        })
    }
}

/// Topic URL on the public ntfy server.
pub fn topic_url(topic: &str) -> String {
    format!("{DEFAULT_NTFY_BASE}/{}", topic.trim_matches('/'))
}

// ---------------------------------------------------------------------------
// PushMessage
// ---------------------------------------------------------------------------

/// A single notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub title: String,
    /// ntfy priority, 1 (min) to 5 (urgent).
    pub priority: u8,
    /// Comma-separated ntfy tags (emoji short codes).
    pub tags: String,
    pub click: String,
    pub body: String,
}

impl PushMessage {
    /// The soil-is-critical alert.
    pub fn critical(click_url: &str) -> Self {
        Self {
            title: "🚨 FARM ALERT! 🚨".to_string(),
            priority: 5,
            tags: "rotating_light".to_string(),
            click: click_url.to_string(),
            body: "The soil is very dry! Please check the farm.".to_string(),
        }
    }

    /// The optional all-clear sent on recovery.
    pub fn recovery(click_url: &str) -> Self {
        Self {
            title: "✅ Farm recovered".to_string(),
            priority: 3,
            tags: "white_check_mark".to_string(),
            click: click_url.to_string(),
            body: "Soil moisture is back to a healthy level.".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// PushDelivery
// ---------------------------------------------------------------------------

pub struct PushDelivery {
    client: reqwest::Client,
}

impl PushDelivery {
    /// Create a delivery service with a pre-configured HTTP client.
    pub fn new() -> Result<Self, PushError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client })
    }

    /// POST one message to `endpoint`. Non-2xx responses are errors.
    pub async fn send(&self, endpoint: &str, message: &PushMessage) -> Result<(), PushError> {
        let response = self
            .client
            .post(endpoint)
            .header("Title", &message.title)
            .header("Priority", message.priority.to_string())
            .header("Tags", &message.tags)
            .header("Click", &message.click)
            .body(message.body.clone())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PushError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
