//! Stage names and dispatch policy.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::Error;

/// A named unit of pipeline work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[display("build")]
    Build,
    #[display("deploy")]
    Deploy,
    #[display("notify")]
    Notify,
}

impl Stage {
    /// Every implemented stage, in default execution order.
    pub const ALL: [Stage; 3] = [Stage::Build, Stage::Deploy, Stage::Notify];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Build => "build",
            Stage::Deploy => "deploy",
            Stage::Notify => "notify",
        }
    }

    /// Comma-separated stage names, used in validation messages.
    pub fn join(stages: &[Stage]) -> String {
        stages
            .iter()
            .map(Stage::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "build" => Ok(Stage::Build),
            "deploy" => Ok(Stage::Deploy),
            "notify" => Ok(Stage::Notify),
            other => Err(Error::InvalidStage {
                stage: other.to_string(),
                valid: Stage::join(&Stage::ALL),
            }),
        }
    }
}

/// What happens after a target or channel fails.
///
/// Applied identically to deployment targets and notification channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop dispatching the rest of the stage and skip later stages.
    #[default]
    FailFast,
    /// Dispatch every destination and run every stage.
    Continue,
}

/// How the destinations of a single stage are invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchMode {
    /// One at a time, in configuration order.
    #[default]
    Sequential,
    /// All at once; every failure is collected.
    Concurrent,
}

/// Failure and dispatch settings shared by the deploy and notify stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchPolicy {
    pub on_failure: FailurePolicy,
    pub mode: DispatchMode,
}

/// Lifecycle of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStatus {
    /// Stage list checked; nothing has run yet.
    Validated,
    /// Stages are being dispatched.
    Running,
    /// The last stage has completed or been skipped.
    Finished,
}
