use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{BatchPublisher, BatchQueuedMessage};

/// POSTs each notification as JSON to a fixed URL.
pub struct WebhookPublisher {
    client: Client,
    url: String,
    topic: String,
}

impl WebhookPublisher {
    pub fn new(url: &str, topic: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            url: url.to_string(),
            topic,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl BatchPublisher for WebhookPublisher {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn publish(&self, message: &BatchQueuedMessage) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .header("X-Topic", &self.topic)
            .json(message)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Webhook delivery failed ({}): {}", status, body);
        }

        tracing::debug!(batch_id = %message.id, url = %self.url, "Webhook delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediasort_common::BatchId;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn publisher(server: &MockServer) -> WebhookPublisher {
        WebhookPublisher::new(
            &format!("{}/hooks/batches", server.uri()),
            "batches.queued".into(),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_posts_message_with_topic() {
        let server = MockServer::start().await;
        let message = BatchQueuedMessage::new(BatchId::new(), "Show");

        Mock::given(method("POST"))
            .and(path("/hooks/batches"))
            .and(header("X-Topic", "batches.queued"))
            .and(body_json(&message))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        publisher(&server).publish(&message).await.unwrap();
    }

    #[tokio::test]
    async fn test_error_status_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("broker down"))
            .mount(&server)
            .await;

        let err = publisher(&server)
            .publish(&BatchQueuedMessage::new(BatchId::new(), "Show"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("broker down"));
    }
}
