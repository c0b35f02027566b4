//! Product configuration model.

use conveyor_core::notifier::ChannelOptions;
use conveyor_core::secret::Credentials;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::{ConfigError, ConfigResult};

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

/// One product's pipeline description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductConfig {
    pub product_name: String,
    #[serde(default)]
    pub git_repository: String,
    /// Branch used when the command line does not override it.
    #[serde(default)]
    pub default_target_branch: Option<String>,
    /// Deployment targets keyed by kind (artifactory, nexus, s3).
    #[serde(default)]
    pub repositories: BTreeMap<String, TargetSettings>,
    /// Notification channels keyed by kind (email, slack).
    #[serde(default)]
    pub notifications: BTreeMap<String, ChannelSettings>,
}

/// Settings for one deployment target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Key into the secret store.
    #[serde(default)]
    pub credentials_ref: Option<String>,
    /// Filled in from the secret store at load time.
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

/// Settings for one notification channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub config: ChannelOptions,
}

impl PipelineConfig {
    /// Parse configuration from YAML text.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Option<Self> = serde_yaml::from_str(yaml)?;
        Ok(config.unwrap_or_default())
    }

    /// Check product names are present and unique.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut seen = HashSet::new();
        for product in &self.products {
            if product.product_name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "product_name".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
            if !seen.insert(product.product_name.as_str()) {
                return Err(ConfigError::Duplicate(format!(
                    "product '{}'",
                    product.product_name
                )));
            }
        }
        Ok(())
    }

    /// Find a product by its exact name.
    pub fn find_product(&self, name: &str) -> ConfigResult<&ProductConfig> {
        self.products
            .iter()
            .find(|p| p.product_name == name)
            .ok_or_else(|| ConfigError::ProductNotFound(name.to_string()))
    }
}

impl ProductConfig {
    /// The branch to deliver: the override if given, else the configured default.
    pub fn resolve_branch(&self, branch_override: Option<&str>) -> ConfigResult<String> {
        branch_override
            .map(str::to_string)
            .or_else(|| self.default_target_branch.clone())
            .ok_or_else(|| {
                ConfigError::MissingField(format!(
                    "default_target_branch for product '{}'",
                    self.product_name
                ))
            })
    }

    /// Kinds of the enabled deployment targets.
    pub fn enabled_targets(&self) -> impl Iterator<Item = &str> {
        self.repositories
            .iter()
            .filter(|(_, settings)| settings.enabled)
            .map(|(kind, _)| kind.as_str())
    }

    /// Kinds of the enabled notification channels.
    pub fn enabled_channels(&self) -> impl Iterator<Item = &str> {
        self.notifications
            .iter()
            .filter(|(_, settings)| settings.enabled)
            .map(|(kind, _)| kind.as_str())
    }
}

/// Look up a product configuration by name.
pub fn find_product_config<'a>(
    config: &'a PipelineConfig,
    name: &str,
) -> ConfigResult<&'a ProductConfig> {
    config.find_product(name)
}
