//! Notification channels for the Conveyor delivery pipeline.
//!
//! Provides channel implementations:
//! - Email (SMTP session check)
//! - Slack (incoming webhook)

pub mod email;
pub mod factory;
pub mod slack;

pub use conveyor_core::notifier::{ChannelOptions, NotificationChannel};
pub use email::{EmailConfig, EmailNotification};
pub use factory::{CHANNEL_KINDS, create_notification_channel, init_notification_channels};
pub use slack::{SlackConfig, SlackNotification};
