//! CLI command implementations.

pub mod products;
pub mod run;
pub mod validate;

use anyhow::Result;
use clap::Args;
use conveyor_config::{
    DEFAULT_CONFIG_FILE, DEFAULT_SECRETS_FILE, PipelineConfig, VariableContext,
    load_configuration,
};
use std::path::PathBuf;

pub use run::RunArgs;

pub const EXIT_CONFIG_ERROR: u8 = 1;
pub const EXIT_DELIVERY_FAILED: u8 = 2;

/// Locations of the configuration and secrets files.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Pipeline configuration file
    #[arg(long, env = "CONVEYOR_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Secrets file merged into the deployment targets
    #[arg(long, env = "CONVEYOR_SECRETS", default_value = DEFAULT_SECRETS_FILE)]
    pub secrets: PathBuf,
}

impl ConfigArgs {
    /// Load both files, resolving placeholders from the process environment.
    pub fn load(&self) -> Result<PipelineConfig> {
        let ctx = VariableContext::from_process_env();
        Ok(load_configuration(&self.config, &self.secrets, &ctx)?)
    }
}
