//! Slack notification channel (incoming webhook).

use async_trait::async_trait;
use conveyor_core::notifier::{ChannelOptions, NotificationChannel};
use conveyor_core::{Error, Product, Result};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{Instrument, Span, info, info_span};

/// Typed view of the Slack channel options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlackConfig {
    pub webhook_url: String,
}

/// Posts product notifications to a Slack incoming webhook.
pub struct SlackNotification {
    config: ChannelOptions,
    timeout: Duration,
    span: Span,
}

impl SlackNotification {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(config: ChannelOptions) -> Self {
        Self {
            config,
            timeout: Self::DEFAULT_TIMEOUT,
            span: info_span!("notification_channel", channel = "slack"),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn webhook_config(&self) -> Result<SlackConfig> {
        self.config
            .parse()
            .map_err(|e| Error::delivery("slack", format!("invalid slack config: {}", e)))
    }

    /// Message body posted for `product`.
    pub fn payload(product: &Product) -> Value {
        json!({ "text": format!("Product {} has been processed", product.name()) })
    }

    async fn post(&self, webhook_url: &str, payload: &Value) -> Result<()> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::delivery("slack", format!("failed to create HTTP client: {}", e)))?;

        let response = client
            .post(webhook_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::delivery("slack", format!("webhook request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::delivery(
                "slack",
                format!("webhook returned status {}: {}", status, body),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for SlackNotification {
    fn name(&self) -> &'static str {
        "slack"
    }

    fn config(&self) -> &ChannelOptions {
        &self.config
    }

    async fn notify(&self, product: &Product) -> Result<()> {
        let webhook = self.webhook_config()?;
        let payload = Self::payload(product);

        async move {
            info!(
                product = %product.name(),
                "Sending Slack notification for product '{}'",
                product.name()
            );
            self.post(&webhook.webhook_url, &payload).await
        }
        .instrument(self.span.clone())
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conveyor_core::testing::CapturedLogs;
    use std::io::Read;
    use std::thread::JoinHandle;
    use tiny_http::{Method, Response, Server};

    struct Received {
        is_post: bool,
        path: String,
        body: String,
    }

    /// Serve every request with `status` until the server has been idle
    /// for half a second, then return what was received.
    fn fake_webhook(status: u16) -> (String, JoinHandle<Vec<Received>>) {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let url = format!("http://{}/services/test", addr);

        let handle = std::thread::spawn(move || {
            let mut received = Vec::new();
            while let Ok(Some(mut request)) = server.recv_timeout(Duration::from_millis(500)) {
                let mut body = String::new();
                request.as_reader().read_to_string(&mut body).unwrap();
                received.push(Received {
                    is_post: *request.method() == Method::Post,
                    path: request.url().to_string(),
                    body,
                });
                request
                    .respond(Response::from_string("ok").with_status_code(status))
                    .unwrap();
            }
            received
        });

        (url, handle)
    }

    fn options(url: &str) -> ChannelOptions {
        [("webhook_url", url)].into_iter().collect()
    }

    fn product() -> Product {
        Product::new("TestProduct", "https://example.com/test.git", "main")
    }

    #[test]
    fn test_payload_text() {
        assert_eq!(
            SlackNotification::payload(&product()),
            json!({ "text": "Product TestProduct has been processed" })
        );
    }

    #[tokio::test]
    async fn test_notify_posts_once() {
        let (url, server) = fake_webhook(200);
        let channel = SlackNotification::new(options(&url));

        channel.notify(&product()).await.unwrap();

        let received = server.join().unwrap();
        assert_eq!(received.len(), 1);
        assert!(received[0].is_post);
        assert_eq!(received[0].path, "/services/test");
        let body: Value = serde_json::from_str(&received[0].body).unwrap();
        assert_eq!(body, json!({ "text": "Product TestProduct has been processed" }));
    }

    #[tokio::test]
    async fn test_logs_under_injected_span() {
        let logs = CapturedLogs::new();
        let _guard = tracing::subscriber::set_default(logs.subscriber());
        let (url, server) = fake_webhook(200);
        let channel =
            SlackNotification::new(options(&url)).with_span(info_span!("announce", attempt = 4));

        channel.notify(&product()).await.unwrap();
        assert_eq!(server.join().unwrap().len(), 1);

        let lines = logs.lines_containing("Sending Slack notification for product 'TestProduct'");
        assert_eq!(lines.len(), 1, "{}", logs.contents());
        assert!(lines[0].contains("announce{attempt=4}"), "{}", lines[0]);
    }

    #[tokio::test]
    async fn test_non_success_status_is_delivery_error() {
        let (url, server) = fake_webhook(500);
        let channel = SlackNotification::new(options(&url));

        let err = channel.notify(&product()).await.unwrap_err();

        assert!(err.to_string().contains("500"), "{}", err);
        assert_eq!(server.join().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_webhook_is_delivery_error() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let channel = SlackNotification::new(options(&format!("http://127.0.0.1:{}/", port)));

        let err = channel.notify(&product()).await.unwrap_err();
        assert!(matches!(err, Error::DeliveryFailed { ref destination, .. } if destination == "slack"));
    }

    #[tokio::test]
    async fn test_missing_webhook_url() {
        let channel = SlackNotification::new(ChannelOptions::new());
        let err = channel.notify(&product()).await.unwrap_err();
        assert!(err.to_string().contains("webhook_url"), "{}", err);
    }
}
