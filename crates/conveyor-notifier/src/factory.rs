//! Construction of notification channels from configuration.

use conveyor_config::{ChannelSettings, ProductConfig};
use conveyor_core::notifier::NotificationChannel;
use tracing::warn;

use crate::{EmailNotification, SlackNotification};

/// Known channel kinds, in notification order.
pub const CHANNEL_KINDS: [&str; 2] = ["email", "slack"];

/// Build the channel for `kind` if it is known and enabled.
///
/// `kind` is matched case-insensitively; anything else is `None`.
pub fn create_notification_channel(
    kind: &str,
    settings: &ChannelSettings,
) -> Option<Box<dyn NotificationChannel>> {
    if !settings.enabled {
        return None;
    }

    match kind.to_ascii_lowercase().as_str() {
        "email" => Some(Box::new(EmailNotification::new(settings.config.clone()))),
        "slack" => Some(Box::new(SlackNotification::new(settings.config.clone()))),
        _ => None,
    }
}

/// Build every enabled channel of a product, in [`CHANNEL_KINDS`] order.
///
/// Keys must match [`CHANNEL_KINDS`] exactly; other enabled keys are
/// skipped with a warning.
pub fn init_notification_channels(product: &ProductConfig) -> Vec<Box<dyn NotificationChannel>> {
    let mut channels = Vec::new();

    for kind in CHANNEL_KINDS {
        let settings = product.notifications.get(kind);
        if let Some(channel) = settings.and_then(|s| create_notification_channel(kind, s)) {
            channels.push(channel);
        }
    }

    for (kind, settings) in &product.notifications {
        if settings.enabled && !CHANNEL_KINDS.contains(&kind.as_str()) {
            warn!(
                product = %product.product_name,
                %kind,
                "Ignoring unrecognised notification channel"
            );
        }
    }

    channels
}
