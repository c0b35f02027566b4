//! Pipeline orchestrator - runs a product's selected stages in order.

use conveyor_core::{
    DeliveryFailure, Deliverable, DispatchPolicy, Error, FailurePolicy, PipelineStatus, Result,
    RunId, Stage,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{Instrument, Span, error, info, info_span, warn};

use crate::clock::{Sleeper, TokioSleeper};

/// State of a stage during execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageState {
    Pending,
    Running,
    Succeeded,
    Failed { message: String },
    Skipped { reason: String },
}

impl StageState {
    pub fn is_success(&self) -> bool {
        matches!(self, StageState::Succeeded)
    }
}

/// Event emitted during pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    StageStarted { stage: Stage },
    DeliveryFailed { stage: Stage, failure: DeliveryFailure },
    StageCompleted { stage: Stage, success: bool },
    StageSkipped { stage: Stage, reason: String },
    PipelineCompleted { success: bool },
}

/// Result of a pipeline execution.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub run_id: RunId,
    pub success: bool,
    /// Final state of every selected stage, in execution order.
    pub stages: Vec<(Stage, StageState)>,
}

impl PipelineResult {
    pub fn state(&self, stage: Stage) -> Option<&StageState> {
        self.stages.iter().find(|(s, _)| *s == stage).map(|(_, state)| state)
    }
}

/// Tunables for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    pub policy: DispatchPolicy,
    /// Wait between consecutive stages. Zero disables waiting.
    pub stage_delay: Duration,
}

/// A validated, ordered stage selection for one product.
pub struct Pipeline {
    run_id: RunId,
    product: Arc<dyn Deliverable>,
    stages: Vec<Stage>,
    options: PipelineOptions,
    sleeper: Arc<dyn Sleeper>,
    events: Option<mpsc::Sender<PipelineEvent>>,
    status: PipelineStatus,
    span: Span,
}

impl Pipeline {
    /// Validate `stages` against the product.
    ///
    /// `None` selects the product's valid stages in their default order.
    /// Otherwise every name must be a stage the product accepts. Either way
    /// no stage may repeat and the selection must not be empty.
    pub fn new(
        product: Arc<dyn Deliverable>,
        stages: Option<Vec<String>>,
        options: PipelineOptions,
    ) -> Result<Self> {
        let stages = match stages {
            None => default_stages(product.valid_stages())?,
            Some(names) => select_stages(product.valid_stages(), &names)?,
        };

        let run_id = RunId::new();
        let span = info_span!("pipeline", run_id = %run_id, product = %product.name());

        Ok(Self {
            run_id,
            product,
            stages,
            options,
            sleeper: Arc::new(TokioSleeper),
            events: None,
            status: PipelineStatus::Validated,
            span,
        })
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Stream progress events to `tx` while running.
    pub fn with_events(mut self, tx: mpsc::Sender<PipelineEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn status(&self) -> PipelineStatus {
        self.status
    }

    /// Run every selected stage once.
    ///
    /// Under [`FailurePolicy::FailFast`] the stages after a failed one are
    /// skipped. A pipeline can only be run once.
    pub async fn run(&mut self) -> Result<PipelineResult> {
        if self.status != PipelineStatus::Validated {
            return Err(Error::InvalidInput(format!(
                "pipeline {} has already been run",
                self.run_id
            )));
        }

        let span = self.span.clone();
        self.execute().instrument(span).await
    }

    async fn execute(&mut self) -> Result<PipelineResult> {
        self.status = PipelineStatus::Running;
        info!(
            stages = %Stage::join(&self.stages),
            "Starting pipeline for product '{}'",
            self.product.name()
        );

        let mut states: Vec<(Stage, StageState)> = self
            .stages
            .iter()
            .map(|stage| (*stage, StageState::Pending))
            .collect();
        let mut halted_by: Option<Stage> = None;

        for idx in 0..states.len() {
            let stage = states[idx].0;

            if let Some(failed) = halted_by {
                let reason = format!("{} stage failed", failed);
                info!(%stage, %reason, "Skipping stage");
                states[idx].1 = StageState::Skipped {
                    reason: reason.clone(),
                };
                self.emit(PipelineEvent::StageSkipped { stage, reason }).await;
                continue;
            }

            if idx > 0 && !self.options.stage_delay.is_zero() {
                info!(delay = ?self.options.stage_delay, "Waiting before next stage");
                self.sleeper.sleep(self.options.stage_delay).await;
            }

            states[idx].1 = StageState::Running;
            self.emit(PipelineEvent::StageStarted { stage }).await;

            match self.run_stage(stage).await {
                Ok(()) => {
                    info!(%stage, "Stage completed successfully");
                    states[idx].1 = StageState::Succeeded;
                    self.emit(PipelineEvent::StageCompleted {
                        stage,
                        success: true,
                    })
                    .await;
                }
                Err(e) => {
                    error!(%stage, error = %e, "Stage failed");
                    if let Error::StageFailed { failures, .. } = &e {
                        for failure in failures {
                            self.emit(PipelineEvent::DeliveryFailed {
                                stage,
                                failure: failure.clone(),
                            })
                            .await;
                        }
                    }
                    states[idx].1 = StageState::Failed {
                        message: e.to_string(),
                    };
                    self.emit(PipelineEvent::StageCompleted {
                        stage,
                        success: false,
                    })
                    .await;

                    if self.options.policy.on_failure == FailurePolicy::FailFast {
                        halted_by = Some(stage);
                    }
                }
            }
        }

        self.status = PipelineStatus::Finished;
        let success = states.iter().all(|(_, state)| state.is_success());
        if success {
            info!("Pipeline completed");
        } else {
            warn!("Pipeline completed with failures");
        }
        self.emit(PipelineEvent::PipelineCompleted { success }).await;

        Ok(PipelineResult {
            run_id: self.run_id,
            success,
            stages: states,
        })
    }

    async fn run_stage(&self, stage: Stage) -> Result<()> {
        let policy = self.options.policy;
        match stage {
            Stage::Build => self.product.build().await,
            Stage::Deploy => self.product.deploy(policy).await,
            Stage::Notify => self.product.notify(policy).await,
        }
    }

    async fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is listening.
            let _ = tx.send(event).await;
        }
    }
}

fn default_stages(valid: &[Stage]) -> Result<Vec<Stage>> {
    if valid.is_empty() {
        return Err(Error::InvalidInput("product has no valid stages".to_string()));
    }

    let mut stages = Vec::with_capacity(valid.len());
    for stage in valid {
        push_unique(&mut stages, *stage)?;
    }
    Ok(stages)
}

fn select_stages(valid: &[Stage], names: &[String]) -> Result<Vec<Stage>> {
    if names.is_empty() {
        return Err(Error::InvalidInput("no stages selected".to_string()));
    }

    let invalid = |name: &str| Error::InvalidStage {
        stage: name.to_string(),
        valid: Stage::join(valid),
    };

    let mut stages = Vec::with_capacity(names.len());
    for name in names {
        let stage: Stage = name.parse().map_err(|_| invalid(name))?;
        if !valid.contains(&stage) {
            return Err(invalid(name));
        }
        push_unique(&mut stages, stage)?;
    }
    Ok(stages)
}

fn push_unique(stages: &mut Vec<Stage>, stage: Stage) -> Result<()> {
    if stages.contains(&stage) {
        return Err(Error::DuplicateStage(stage));
    }
    stages.push(stage);
    Ok(())
}
