use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::database::models::UserProfile;

/// One notification per mentioned user. Dispatch is best-effort and runs
/// detached from the response path; failures are logged and never surface to
/// the commenting client.
#[derive(Debug, Clone)]
pub struct MentionNotification {
    pub recipient: UserProfile,
    pub author_name: String,
    pub post_title: String,
    pub comment_content: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn mention(&self, notification: MentionNotification);
}

/// Posts mention notifications to an incoming-webhook URL.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self { client: reqwest::Client::new(), url }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn mention(&self, notification: MentionNotification) {
        let body = json!({
            "text": format!(
                "{} mentioned {} in a comment on \"{}\": {}",
                notification.author_name,
                notification.recipient.name,
                notification.post_title,
                notification.comment_content,
            ),
        });

        if let Err(e) = self.client.post(&self.url).json(&body).send().await {
            warn!("Mention notification delivery failed: {}", e);
        }
    }
}

/// Used when no webhook is configured.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn mention(&self, notification: MentionNotification) {
        debug!(
            recipient = %notification.recipient.name,
            "Mention notification skipped - no webhook configured"
        );
    }
}

pub fn build_notifier(config: &AppConfig) -> Arc<dyn Notifier> {
    match &config.notifications.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
        None => Arc::new(NoopNotifier),
    }
}
