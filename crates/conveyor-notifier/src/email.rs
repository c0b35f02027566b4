//! Email notification channel.
//!
//! Opens an SMTP session with the configured server, checks for a `220`
//! service-ready greeting, and closes the session with `QUIT`.

use async_trait::async_trait;
use conveyor_core::notifier::{ChannelOptions, NotificationChannel};
use conveyor_core::{Error, Product, Result};
use serde::Deserialize;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{Instrument, Span, debug, info, info_span};

/// Typed view of the email channel options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmailConfig {
    pub smtp_server: String,
    pub port: u16,
}

/// Sends product notifications by email.
pub struct EmailNotification {
    config: ChannelOptions,
    timeout: Duration,
    span: Span,
}

impl EmailNotification {
    /// Connect plus greeting must complete within this time.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(config: ChannelOptions) -> Self {
        Self {
            config,
            timeout: Self::DEFAULT_TIMEOUT,
            span: info_span!("notification_channel", channel = "email"),
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

    /// Parse the channel options.
    pub fn smtp_config(&self) -> Result<EmailConfig> {
        self.config
            .parse()
            .map_err(|e| Error::delivery("email", format!("invalid email config: {}", e)))
    }

    async fn session(&self, smtp: &EmailConfig) -> Result<()> {
        let mut stream = TcpStream::connect((smtp.smtp_server.as_str(), smtp.port))
            .await
            .map_err(|e| {
                Error::delivery(
                    "email",
                    format!(
                        "failed to connect to {}:{}: {}",
                        smtp.smtp_server, smtp.port, e
                    ),
                )
            })?;

        let (read_half, mut write_half) = stream.split();
        let mut reader = BufReader::new(read_half);

        let mut greeting = String::new();
        reader
            .read_line(&mut greeting)
            .await
            .map_err(|e| Error::delivery("email", format!("failed to read greeting: {}", e)))?;
        if !greeting.starts_with("220") {
            return Err(Error::delivery(
                "email",
                format!("unexpected SMTP greeting: {}", greeting.trim_end()),
            ));
        }
        debug!(greeting = %greeting.trim_end(), "SMTP server ready");

        write_half
            .write_all(b"QUIT\r\n")
            .await
            .map_err(|e| Error::delivery("email", format!("failed to send QUIT: {}", e)))?;
        write_half.shutdown().await.ok();
        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for EmailNotification {
    fn name(&self) -> &'static str {
        "email"
    }

    fn config(&self) -> &ChannelOptions {
        &self.config
    }

    async fn notify(&self, product: &Product) -> Result<()> {
        let smtp = self.smtp_config()?;
        let timeout = self.timeout;

        async move {
            info!(
                product = %product.name(),
                smtp_server = %smtp.smtp_server,
                port = smtp.port,
                "Sending email notification for product '{}'",
                product.name()
            );
            tokio::time::timeout(timeout, self.session(&smtp))
                .await
                .map_err(|_| {
                    Error::delivery(
                        "email",
                        format!(
                            "timed out after {:?} talking to {}:{}",
                            timeout, smtp.smtp_server, smtp.port
                        ),
                    )
                })?
        }
        .instrument(self.span.clone())
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conveyor_core::testing::CapturedLogs;
    use tokio::net::TcpListener;

    fn options(server: &str, port: u16) -> ChannelOptions {
        [
            ("smtp_server", serde_json::Value::from(server)),
            ("port", serde_json::Value::from(port)),
        ]
        .into_iter()
        .collect()
    }

    fn product() -> Product {
        Product::new("TestProduct", "https://example.com/test.git", "main")
    }

    /// Accept one connection, send `greeting`, and return the first line the
    /// client writes back.
    async fn fake_smtp(greeting: &'static str) -> (u16, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = socket.split();
            write_half.write_all(greeting.as_bytes()).await.unwrap();
            let mut line = String::new();
            BufReader::new(read_half).read_line(&mut line).await.unwrap();
            line
        });
        (port, handle)
    }

    #[test]
    fn test_smtp_config_parsed() {
        let channel = EmailNotification::new(options("smtp.example.com", 587));
        assert_eq!(
            channel.smtp_config().unwrap(),
            EmailConfig {
                smtp_server: "smtp.example.com".to_string(),
                port: 587,
            }
        );
    }

    #[tokio::test]
    async fn test_notify_completes_session() {
        let (port, server) = fake_smtp("220 localhost ESMTP ready\r\n").await;
        let channel = EmailNotification::new(options("127.0.0.1", port));

        channel.notify(&product()).await.unwrap();

        assert_eq!(server.await.unwrap(), "QUIT\r\n");
    }

    #[tokio::test]
    async fn test_logs_under_injected_span() {
        let logs = CapturedLogs::new();
        let _guard = tracing::subscriber::set_default(logs.subscriber());
        let (port, server) = fake_smtp("220 localhost ESMTP ready\r\n").await;
        let channel = EmailNotification::new(options("127.0.0.1", port))
            .with_span(info_span!("announce", attempt = 3));

        channel.notify(&product()).await.unwrap();
        server.await.unwrap();

        let sent = logs.lines_containing("Sending email notification for product 'TestProduct'");
        assert_eq!(sent.len(), 1, "{}", logs.contents());
        assert!(sent[0].contains("announce{attempt=3}"), "{}", sent[0]);
        let ready = logs.lines_containing("SMTP server ready");
        assert_eq!(ready.len(), 1, "{}", logs.contents());
        assert!(ready[0].contains("announce{attempt=3}"), "{}", ready[0]);
    }

    #[tokio::test]
    async fn test_unexpected_greeting_is_delivery_error() {
        let (port, _server) = fake_smtp("554 no service\r\n").await;
        let channel = EmailNotification::new(options("127.0.0.1", port));

        let err = channel.notify(&product()).await.unwrap_err();
        assert!(err.to_string().contains("554 no service"), "{}", err);
    }

    #[tokio::test]
    async fn test_connection_refused_is_delivery_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let channel = EmailNotification::new(options("127.0.0.1", port));
        let err = channel.notify(&product()).await.unwrap_err();
        assert!(matches!(err, Error::DeliveryFailed { ref destination, .. } if destination == "email"));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let _server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let channel = EmailNotification::new(options("127.0.0.1", port))
            .with_timeout(Duration::from_millis(100));
        let err = channel.notify(&product()).await.unwrap_err();
        assert!(err.to_string().contains("timed out"), "{}", err);
    }

    #[tokio::test]
    async fn test_missing_server_is_delivery_error() {
        let config: ChannelOptions = [("port", 25)].into_iter().collect();
        let channel = EmailNotification::new(config);

        let err = channel.notify(&product()).await.unwrap_err();
        assert!(err.to_string().contains("smtp_server"), "{}", err);
    }
}
