//! Outbound webhook notifications for new posts
//!
//! Delivery is best-effort. [`WebhookDispatcher::dispatch`] only enqueues the
//! event; a supervisor task spawns one delivery per event into a `JoinSet`
//! and reaps them as they finish. At shutdown the supervisor stops accepting
//! events, waits a short grace period for running deliveries and aborts the
//! rest.

use crate::config::WebhookConfig;
use crate::domain::{Post, WebhookProvider};
use crate::middleware::RequestId;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::timeout;

/// Embed accent colour used for Discord notifications.
const DISCORD_COLOR: u32 = 5_814_783;

/// A post that should be announced on its project's webhook.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub provider: WebhookProvider,
    pub target_url: String,
    pub post: Post,
    pub request_id: RequestId,
}

/// Publishing side of the webhook pipeline.
///
/// Lets services fire notifications without depending on the concrete
/// dispatcher.
#[cfg_attr(test, mockall::automock)]
pub trait WebhookPublisher: Send + Sync {
    /// Hand an event off for delivery. Never blocks and never fails the caller.
    fn dispatch(&self, event: WebhookEvent);
}

#[derive(Clone)]
pub struct WebhookDispatcher {
    sender: mpsc::UnboundedSender<WebhookEvent>,
}

/// Owns the delivery tasks. Dropping it without calling
/// [`WebhookSupervisor::shutdown`] leaves the supervisor running until every
/// dispatcher handle is gone.
pub struct WebhookSupervisor {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<usize>,
}

impl WebhookDispatcher {
    /// Spawn the supervisor task. Must be called from within a tokio runtime.
    pub fn start(config: &WebhookConfig) -> (WebhookDispatcher, WebhookSupervisor) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        let grace = Duration::from_secs(config.drain_grace_secs);

        let (sender, receiver) = mpsc::unbounded_channel();
        let (stop, stopped) = oneshot::channel();
        let handle = tokio::spawn(supervise(client, receiver, stopped, grace));

        (WebhookDispatcher { sender }, WebhookSupervisor { stop, handle })
    }
}

impl WebhookPublisher for WebhookDispatcher {
    fn dispatch(&self, event: WebhookEvent) {
        let request_id = event.request_id.clone();
        let post_id = event.post.id;
        if self.sender.send(event).is_err() {
            tracing::warn!(
                request_id = %request_id,
                post_id,
                "Webhook dispatcher stopped, notification dropped"
            );
        }
    }
}

impl WebhookSupervisor {
    /// Stop accepting events and drain in-flight deliveries.
    ///
    /// Returns how many deliveries were aborted because they outlived the
    /// grace period.
    pub async fn shutdown(self) -> usize {
        let _ = self.stop.send(());
        match self.handle.await {
            Ok(abandoned) => abandoned,
            Err(e) => {
                tracing::error!(error = %e, "Webhook supervisor failed");
                0
            }
        }
    }
}

async fn supervise(
    client: reqwest::Client,
    mut receiver: mpsc::UnboundedReceiver<WebhookEvent>,
    mut stopped: oneshot::Receiver<()>,
    grace: Duration,
) -> usize {
    let mut deliveries = JoinSet::new();

    loop {
        tokio::select! {
            event = receiver.recv() => match event {
                Some(event) => {
                    deliveries.spawn(deliver(client.clone(), event));
                }
                None => break,
            },
            Some(joined) = deliveries.join_next(), if !deliveries.is_empty() => {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "Webhook delivery task failed");
                }
            }
            _ = &mut stopped => break,
        }
    }

    // Events accepted before the stop signal still get their attempt.
    receiver.close();
    while let Some(event) = receiver.recv().await {
        deliveries.spawn(deliver(client.clone(), event));
    }

    let drained = timeout(grace, async {
        while deliveries.join_next().await.is_some() {}
    })
    .await;

    if drained.is_ok() {
        return 0;
    }

    let abandoned = deliveries.len();
    deliveries.abort_all();
    tracing::warn!(abandoned, "Webhook deliveries abandoned at shutdown");
    abandoned
}

async fn deliver(client: reqwest::Client, event: WebhookEvent) {
    let payload = build_payload(event.provider, &event.post, Utc::now());

    match send(&client, &event.target_url, &payload).await {
        Ok(status) => tracing::info!(
            request_id = %event.request_id,
            post_id = event.post.id,
            provider = %event.provider,
            status,
            "Webhook triggered successfully"
        ),
        Err((status, message)) => tracing::warn!(
            request_id = %event.request_id,
            post_id = event.post.id,
            provider = %event.provider,
            status = ?status,
            error = %message,
            "Failed to trigger webhook"
        ),
    }
}

/// POST the payload; any non-2xx answer counts as a failure.
async fn send(
    client: &reqwest::Client,
    url: &str,
    payload: &serde_json::Value,
) -> std::result::Result<u16, (Option<u16>, String)> {
    let response = client
        .post(url)
        .header("Content-Type", "application/json")
        .body(payload.to_string())
        .send()
        .await
        .map_err(|e| (None, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err((
            Some(status.as_u16()),
            format!("Webhook returned error status {}", status.as_u16()),
        ));
    }

    Ok(status.as_u16())
}

/// Provider-specific notification body for a new post.
pub fn build_payload(provider: WebhookProvider, post: &Post, now: DateTime<Utc>) -> serde_json::Value {
    match provider {
        WebhookProvider::Discord => json!({
            "username": "LogStream",
            "embeds": [{
                "title": post.title,
                "description": post.content,
                "color": DISCORD_COLOR,
                "fields": [
                    { "name": "Category", "value": post.category, "inline": true },
                    { "name": "Status", "value": post.status, "inline": true },
                    { "name": "Post ID", "value": post.id.to_string(), "inline": true },
                ],
                "footer": { "text": "Sent via LogStream" },
                "timestamp": now.to_rfc3339(),
            }],
        }),
        WebhookProvider::Slack => json!({
            "text": format!(
                "*New Update: {}*\nCategory: {}\n<{}>",
                post.title, post.category, post.content
            ),
        }),
        WebhookProvider::Generic => json!({
            "event": "post_created",
            "data": {
                "id": post.id,
                "title": post.title,
                "content": post.content,
                "category": post.category,
                "created_at": post.created_at,
            },
        }),
    }
}
