//! Secret store loading and merging.

use conveyor_core::secret::Credentials;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::settings::PipelineConfig;
use crate::variables::VariableContext;
use crate::ConfigResult;

/// Secrets keyed by the name a target's `credentials_ref` points at.
///
/// Entries written as `key: ~` are kept but never merged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Secrets(BTreeMap<String, Option<Credentials>>);

impl Secrets {
    /// Parse secrets from YAML text. An empty document yields no secrets.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let secrets: Option<Self> = serde_yaml::from_str(yaml)?;
        Ok(secrets.unwrap_or_default())
    }

    pub fn get(&self, key: &str) -> Option<&Credentials> {
        self.0.get(key).and_then(Option::as_ref)
    }

    /// Replace every string value written as `${VAR}` with that variable.
    pub fn resolve_placeholders(&mut self, ctx: &VariableContext) {
        for (service, creds) in self.0.iter_mut() {
            let Some(creds) = creds else { continue };
            for value in creds.string_values_mut() {
                if let Some(variable) = ctx.unresolved(value) {
                    warn!(%service, %variable, "Secret placeholder left unresolved");
                }
                *value = ctx.interpolate(value);
            }
        }
    }

    /// Copy credentials into every enabled target whose `credentials_ref`
    /// names a known secret.
    pub fn merge_into(&self, config: &mut PipelineConfig) {
        for product in &mut config.products {
            for (kind, target) in product.repositories.iter_mut() {
                if !target.enabled {
                    continue;
                }
                let Some(secret_key) = target.credentials_ref.as_deref() else {
                    continue;
                };
                match self.get(secret_key) {
                    Some(creds) => {
                        debug!(product = %product.product_name, target = %kind, %secret_key, "Merged credentials");
                        target.credentials = Some(creds.clone());
                    }
                    None => {
                        warn!(product = %product.product_name, target = %kind, %secret_key, "Credentials reference not found in secrets");
                    }
                }
            }
        }
    }
}
