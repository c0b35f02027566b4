//! YAML configuration loading for the Conveyor delivery pipeline.
//!
//! This crate handles:
//! - Product definitions (config.yaml)
//! - The secret store (secrets.yaml)
//! - `${VAR}` placeholder resolution against the environment
//! - Merging secrets into deployment target settings

pub mod error;
pub mod loader;
pub mod secrets;
pub mod settings;
pub mod variables;

pub use error::{ConfigError, ConfigResult};
pub use loader::{DEFAULT_CONFIG_FILE, DEFAULT_SECRETS_FILE, load_configuration};
pub use secrets::Secrets;
pub use settings::{ChannelSettings, PipelineConfig, ProductConfig, TargetSettings, find_product_config};
pub use variables::VariableContext;
