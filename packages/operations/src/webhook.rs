// ABOUTME: Best-effort webhook notification of operation transitions
// ABOUTME: Posts status changes to an external endpoint and never fails the caller

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};
use uuid::Uuid;

use crate::types::OperationStatus;

/// Body sent to `<base>/import_todo`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookPayload {
    pub operation_id: Uuid,
    pub from: OperationStatus,
    pub to: OperationStatus,
}

#[async_trait]
pub trait WebhookNotifier: Send + Sync {
    /// Deliver one transition. Failures are logged, never returned.
    async fn notify(&self, operation_id: Uuid, from: OperationStatus, to: OperationStatus);
}

pub struct HttpWebhookNotifier {
    client: Client,
    endpoint: String,
}

impl HttpWebhookNotifier {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/import_todo", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl WebhookNotifier for HttpWebhookNotifier {
    async fn notify(&self, operation_id: Uuid, from: OperationStatus, to: OperationStatus) {
        let payload = WebhookPayload {
            operation_id,
            from,
            to,
        };

        let result = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .and_then(|resp| resp.error_for_status());

        match result {
            Ok(resp) => {
                info!(
                    operation_id = %operation_id,
                    from = %from,
                    to = %to,
                    status_code = resp.status().as_u16(),
                    "webhook success"
                );
            }
            Err(e) => {
                warn!(
                    operation_id = %operation_id,
                    from = %from,
                    to = %to,
                    error = %e,
                    "webhook error"
                );
            }
        }
    }
}

/// Fire a notification on the shared background tracker so shutdown can drain it
pub fn notify_in_background(
    tasks: &TaskTracker,
    notifier: Arc<dyn WebhookNotifier>,
    operation_id: Uuid,
    from: OperationStatus,
    to: OperationStatus,
) {
    tasks.spawn(async move {
        notifier.notify(operation_id, from, to).await;
    });
}
