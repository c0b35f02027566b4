//! Notification channel trait and channel options.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::{Product, Result};

/// Free-form options of a notification channel, as written in configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelOptions(BTreeMap<String, Value>);

impl ChannelOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Read the options as a typed channel configuration.
    pub fn parse<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        let object = self
            .0
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::from_value(Value::Object(object))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ChannelOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A destination that receives a human-readable status message.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Name of this channel kind (e.g. "slack").
    fn name(&self) -> &'static str;

    /// Options the channel was constructed with.
    fn config(&self) -> &ChannelOptions;

    /// Send a notification about the product.
    async fn notify(&self, product: &Product) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Smtp {
        smtp_server: String,
        port: u16,
    }

    #[test]
    fn test_parse_typed_options() {
        let options: ChannelOptions = [
            ("smtp_server", Value::from("smtp.example.com")),
            ("port", Value::from(587)),
        ]
        .into_iter()
        .collect();

        let smtp: Smtp = options.parse().unwrap();
        assert_eq!(smtp.smtp_server, "smtp.example.com");
        assert_eq!(smtp.port, 587);
    }

    #[test]
    fn test_parse_reports_missing_field() {
        let options: ChannelOptions = [("port", 25)].into_iter().collect();
        let err = options.parse::<Smtp>().unwrap_err();
        assert!(err.to_string().contains("smtp_server"));
    }
}
