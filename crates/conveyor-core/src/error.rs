//! Error types for Conveyor.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::Stage;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("stage '{stage}' is not valid. Valid stages are: {valid}")]
    InvalidStage { stage: String, valid: String },

    #[error("stage '{0}' is listed more than once")]
    DuplicateStage(Stage),

    #[error("delivery to {destination} failed: {message}")]
    DeliveryFailed { destination: String, message: String },

    #[error("{stage} stage failed with {} delivery failure(s)", .failures.len())]
    StageFailed {
        stage: Stage,
        failures: Vec<DeliveryFailure>,
    },
}

impl Error {
    /// Shorthand for a [`Error::DeliveryFailed`] raised by a target or channel.
    pub fn delivery(destination: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DeliveryFailed {
            destination: destination.into(),
            message: message.into(),
        }
    }
}

/// One target or channel that failed during a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[display("{destination}: {message}")]
pub struct DeliveryFailure {
    pub destination: String,
    pub message: String,
}

impl DeliveryFailure {
    /// Build a failure record for `destination`, unwrapping delivery errors
    /// so the message is not prefixed twice.
    pub fn from_error(destination: &str, err: Error) -> Self {
        match err {
            Error::DeliveryFailed {
                destination,
                message,
            } => Self {
                destination,
                message,
            },
            other => Self {
                destination: destination.to_string(),
                message: other.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
