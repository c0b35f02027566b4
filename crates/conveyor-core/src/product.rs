//! The product aggregate and its stage operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, join_all};
use std::fmt;
use tracing::{error, info, warn};

use crate::deployer::DeploymentTarget;
use crate::notifier::NotificationChannel;
use crate::pipeline::{DispatchMode, DispatchPolicy, FailurePolicy, Stage};
use crate::{DeliveryFailure, Error, Result};

/// Something a pipeline can drive through its stages.
#[async_trait]
pub trait Deliverable: Send + Sync {
    /// Name used in logs and events.
    fn name(&self) -> &str;

    /// Stages this deliverable accepts, in default order.
    fn valid_stages(&self) -> &[Stage];

    /// Build the product.
    async fn build(&self) -> Result<()>;

    /// Deliver to every deployment target.
    async fn deploy(&self, policy: DispatchPolicy) -> Result<()>;

    /// Send every notification.
    async fn notify(&self, policy: DispatchPolicy) -> Result<()>;
}

/// A product to build, deploy, and announce.
pub struct Product {
    name: String,
    git_repository: String,
    scheduled_time: DateTime<Utc>,
    target_branch: String,
    deploy_targets: Vec<Box<dyn DeploymentTarget>>,
    notification_channels: Vec<Box<dyn NotificationChannel>>,
    valid_stages: Vec<Stage>,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        git_repository: impl Into<String>,
        target_branch: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            git_repository: git_repository.into(),
            scheduled_time: Utc::now(),
            target_branch: target_branch.into(),
            deploy_targets: Vec::new(),
            notification_channels: Vec::new(),
            valid_stages: Stage::ALL.to_vec(),
        }
    }

    pub fn with_scheduled_time(mut self, scheduled_time: DateTime<Utc>) -> Self {
        self.scheduled_time = scheduled_time;
        self
    }

    /// Targets are deployed to in the order given.
    pub fn with_targets(mut self, targets: Vec<Box<dyn DeploymentTarget>>) -> Self {
        self.deploy_targets = targets;
        self
    }

    /// Channels are notified in the order given.
    pub fn with_channels(mut self, channels: Vec<Box<dyn NotificationChannel>>) -> Self {
        self.notification_channels = channels;
        self
    }

    pub fn with_valid_stages(mut self, stages: Vec<Stage>) -> Self {
        self.valid_stages = stages;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn git_repository(&self) -> &str {
        &self.git_repository
    }

    pub fn scheduled_time(&self) -> DateTime<Utc> {
        self.scheduled_time
    }

    pub fn target_branch(&self) -> &str {
        &self.target_branch
    }

    pub fn deploy_targets(&self) -> &[Box<dyn DeploymentTarget>] {
        &self.deploy_targets
    }

    pub fn notification_channels(&self) -> &[Box<dyn NotificationChannel>] {
        &self.notification_channels
    }
}

impl fmt::Debug for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Product")
            .field("name", &self.name)
            .field("git_repository", &self.git_repository)
            .field("scheduled_time", &self.scheduled_time)
            .field("target_branch", &self.target_branch)
            .field(
                "deploy_targets",
                &self.deploy_targets.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field(
                "notification_channels",
                &self
                    .notification_channels
                    .iter()
                    .map(|c| c.name())
                    .collect::<Vec<_>>(),
            )
            .field("valid_stages", &self.valid_stages)
            .finish()
    }
}

#[async_trait]
impl Deliverable for Product {
    fn name(&self) -> &str {
        &self.name
    }

    fn valid_stages(&self) -> &[Stage] {
        &self.valid_stages
    }

    async fn build(&self) -> Result<()> {
        info!(
            product = %self.name,
            repository = %self.git_repository,
            branch = %self.target_branch,
            "Building product '{}' from repository '{}' on branch '{}'",
            self.name,
            self.git_repository,
            self.target_branch
        );
        Ok(())
    }

    async fn deploy(&self, policy: DispatchPolicy) -> Result<()> {
        info!(
            product = %self.name,
            targets = self.deploy_targets.len(),
            "Deploying product '{}'",
            self.name
        );
        let calls = self
            .deploy_targets
            .iter()
            .map(|target| (target.name(), target.deploy(self)))
            .collect();
        dispatch(Stage::Deploy, calls, policy).await
    }

    async fn notify(&self, policy: DispatchPolicy) -> Result<()> {
        info!(
            product = %self.name,
            channels = self.notification_channels.len(),
            "Notifying about product '{}'",
            self.name
        );
        let calls = self
            .notification_channels
            .iter()
            .map(|channel| (channel.name(), channel.notify(self)))
            .collect();
        dispatch(Stage::Notify, calls, policy).await
    }
}

/// Await each destination call according to `policy`.
///
/// Futures are lazy, so calls skipped under fail-fast never start.
async fn dispatch(
    stage: Stage,
    calls: Vec<(&'static str, BoxFuture<'_, Result<()>>)>,
    policy: DispatchPolicy,
) -> Result<()> {
    let mut failures = Vec::new();

    match policy.mode {
        DispatchMode::Concurrent => {
            let (names, pending): (Vec<_>, Vec<_>) = calls.into_iter().unzip();
            for (name, result) in names.into_iter().zip(join_all(pending).await) {
                if let Err(e) = result {
                    failures.push(record_failure(stage, name, e));
                }
            }
        }
        DispatchMode::Sequential => {
            let total = calls.len();
            for (idx, (name, call)) in calls.into_iter().enumerate() {
                if let Err(e) = call.await {
                    failures.push(record_failure(stage, name, e));
                    if policy.on_failure == FailurePolicy::FailFast {
                        let skipped = total - idx - 1;
                        if skipped > 0 {
                            warn!(%stage, skipped, "Skipping remaining destinations after failure");
                        }
                        break;
                    }
                }
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(Error::StageFailed { stage, failures })
    }
}

fn record_failure(stage: Stage, destination: &str, err: Error) -> DeliveryFailure {
    let failure = DeliveryFailure::from_error(destination, err);
    error!(
        %stage,
        destination = %failure.destination,
        error = %failure.message,
        "Delivery failed"
    );
    failure
}
