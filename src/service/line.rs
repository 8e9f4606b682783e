//! LINE Notify implementation.
//!
//! Messages are delivered by a background worker so `notify` never blocks the
//! trading path. Delivery failures are logged and dropped.

use reqwest::Client;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::{Event, Notifier};

/// Default LINE Notify endpoint.
pub const DEFAULT_LINE_NOTIFY_URL: &str = "https://notify-api.line.me/api/notify";

/// Configuration for LINE notifier.
#[derive(Clone)]
pub struct LineConfig {
    /// Personal access token issued by LINE Notify.
    pub token: String,
    pub url: String,
    /// Whether to send open/close fill alerts (can be noisy).
    pub notify_fills: bool,
}

impl std::fmt::Debug for LineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineConfig")
            .field("token", &"<redacted>")
            .field("url", &self.url)
            .field("notify_fills", &self.notify_fills)
            .finish()
    }
}

impl LineConfig {
    /// Create config from environment variables.
    ///
    /// Returns `None` when `LINE_NOTIFY_TOKEN` is unset or empty.
    pub fn from_env(url: impl Into<String>) -> Option<Self> {
        let token = std::env::var("LINE_NOTIFY_TOKEN").ok()?;
        if token.trim().is_empty() {
            return None;
        }

        Some(Self {
            token,
            url: url.into(),
            notify_fills: std::env::var("LINE_NOTIFY_FILLS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        })
    }
}

/// LINE notifier that posts messages to a LINE Notify token.
pub struct LineNotifier {
    sender: mpsc::UnboundedSender<Event>,
}

impl LineNotifier {
    /// Create a new LINE notifier and spawn the background task.
    pub fn new(config: LineConfig, client: Client) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        tokio::spawn(line_worker(config, client, receiver));

        Self { sender }
    }
}

impl Notifier for LineNotifier {
    fn notify(&self, event: Event) {
        if self.sender.send(event).is_err() {
            warn!("LINE notifier channel closed");
        }
    }
}

fn should_send(config: &LineConfig, event: &Event) -> bool {
    match event {
        Event::PositionOpened(_) | Event::PositionClosed(_) => config.notify_fills,
        _ => true,
    }
}

/// Background worker that sends LINE messages.
async fn line_worker(config: LineConfig, client: Client, mut receiver: mpsc::UnboundedReceiver<Event>) {
    info!(url = %config.url, "LINE notifier started");

    while let Some(event) = receiver.recv().await {
        if !should_send(&config, &event) {
            continue;
        }

        let message = event.to_string();
        let result = client
            .post(&config.url)
            .bearer_auth(&config.token)
            .form(&[("message", message.as_str())])
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                error!(status = %status, body = %body, "LINE Notify rejected message");
            }
            Err(e) => error!(error = %e, "Failed to send LINE message"),
        }
    }

    warn!("LINE worker shutting down");
}
