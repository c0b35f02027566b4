//! Pipeline execution command.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use conveyor_config::find_product_config;
use conveyor_core::{DispatchMode, DispatchPolicy, FailurePolicy};
use conveyor_scheduler::{
    Pipeline, PipelineEvent, PipelineOptions, StageState, assemble_product,
};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

use super::{ConfigArgs, EXIT_DELIVERY_FAILED};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Product to run, as named in the configuration
    #[arg(long, alias = "repo_name", value_name = "NAME")]
    pub repo_name: String,

    /// Branch to build instead of the configured default
    #[arg(long, alias = "target_branch", value_name = "BRANCH")]
    pub target_branch: Option<String>,

    /// Comma-separated stages to run, in order (default: all)
    #[arg(long, value_name = "STAGES")]
    pub stages: Option<String>,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Seconds to wait between stages
    #[arg(long, value_name = "SECS", default_value_t = 0)]
    pub stage_delay: u64,

    /// What to do after a delivery failure
    #[arg(long, value_enum, default_value_t = OnFailure::FailFast)]
    pub on_failure: OnFailure,

    /// Deliver to all destinations of a stage at once
    #[arg(long)]
    pub concurrent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnFailure {
    FailFast,
    Continue,
}

impl From<OnFailure> for FailurePolicy {
    fn from(value: OnFailure) -> Self {
        match value {
            OnFailure::FailFast => FailurePolicy::FailFast,
            OnFailure::Continue => FailurePolicy::Continue,
        }
    }
}

impl RunArgs {
    fn options(&self) -> PipelineOptions {
        PipelineOptions {
            policy: DispatchPolicy {
                on_failure: self.on_failure.into(),
                mode: if self.concurrent {
                    DispatchMode::Concurrent
                } else {
                    DispatchMode::Sequential
                },
            },
            stage_delay: Duration::from_secs(self.stage_delay),
        }
    }
}

/// Split a comma-separated stage list.
///
/// Blank entries are dropped; a list with nothing left means "use the
/// product's defaults".
pub fn parse_stage_list(raw: Option<&str>) -> Option<Vec<String>> {
    let stages: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    (!stages.is_empty()).then_some(stages)
}

/// Run the configured pipeline for one product.
pub async fn run(args: RunArgs) -> Result<ExitCode> {
    let config = args.config.load()?;
    let product_config = find_product_config(&config, &args.repo_name)?;
    let product = assemble_product(product_config, args.target_branch.as_deref())?;

    let (tx, mut rx) = mpsc::channel(100);
    let mut pipeline = Pipeline::new(
        Arc::new(product),
        parse_stage_list(args.stages.as_deref()),
        args.options(),
    )?
    .with_events(tx);
    info!(
        run_id = %pipeline.run_id(),
        stages = ?pipeline.stages(),
        "Pipeline validated"
    );

    println!(
        "Running pipeline {} for '{}'",
        pipeline.run_id(),
        args.repo_name
    );

    let handle = tokio::spawn(async move { pipeline.run().await });

    while let Some(event) = rx.recv().await {
        match event {
            PipelineEvent::StageStarted { stage } => {
                println!("▶ Stage '{}' started", stage);
            }
            PipelineEvent::DeliveryFailed { stage, failure } => {
                println!("  [{}] ✗ {}", stage, failure);
            }
            PipelineEvent::StageCompleted { stage, success } => {
                if success {
                    println!("✓ Stage '{}' completed successfully", stage);
                } else {
                    println!("✗ Stage '{}' failed", stage);
                }
            }
            PipelineEvent::StageSkipped { stage, reason } => {
                println!("⊘ Stage '{}' skipped: {}", stage, reason);
            }
            PipelineEvent::PipelineCompleted { success } => {
                if success {
                    println!("--- Pipeline completed successfully ---");
                } else {
                    println!("--- Pipeline completed with failures ---");
                }
            }
        }
    }

    let result = handle
        .await
        .context("pipeline execution task failed")??;

    println!("\n--- Stage Summary ---");
    for (stage, state) in &result.stages {
        let status = match state {
            StageState::Succeeded => "✓ succeeded".to_string(),
            StageState::Failed { message } => format!("✗ failed: {}", message),
            StageState::Skipped { reason } => format!("⊘ skipped: {}", reason),
            StageState::Pending => "○ pending".to_string(),
            StageState::Running => "▶ running".to_string(),
        };
        println!("  {} - {}", stage, status);
    }

    if result.success {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_DELIVERY_FAILED))
    }
}
