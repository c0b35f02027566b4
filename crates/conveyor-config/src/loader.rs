//! Loading configuration and secrets from disk.

use std::path::Path;
use tracing::{error, info};

use crate::secrets::Secrets;
use crate::settings::PipelineConfig;
use crate::variables::VariableContext;
use crate::{ConfigError, ConfigResult};

pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
pub const DEFAULT_SECRETS_FILE: &str = "secrets.yaml";

/// Load the configuration, resolve secret placeholders against `ctx`, and
/// merge the secrets into the enabled deployment targets.
///
/// Both files must exist.
pub fn load_configuration(
    config_path: &Path,
    secrets_path: &Path,
    ctx: &VariableContext,
) -> ConfigResult<PipelineConfig> {
    let config_text = read_required(config_path)?;
    let secrets_text = read_required(secrets_path)?;

    let mut config =
        PipelineConfig::from_yaml(&config_text).map_err(|e| with_path(e, config_path))?;
    config.validate()?;

    let mut secrets =
        Secrets::from_yaml(&secrets_text).map_err(|e| with_path(e, secrets_path))?;
    secrets.resolve_placeholders(ctx);
    secrets.merge_into(&mut config);

    info!(
        config = %config_path.display(),
        products = config.products.len(),
        "Configuration loaded"
    );
    Ok(config)
}

fn read_required(path: &Path) -> ConfigResult<String> {
    if !path.exists() {
        error!(path = %path.display(), "File not found");
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn with_path(err: ConfigError, path: &Path) -> ConfigError {
    match err {
        ConfigError::Yaml(source) => ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    }
}
