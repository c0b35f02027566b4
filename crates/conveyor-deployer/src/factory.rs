//! Construction of deployment targets from configuration.

use conveyor_config::{ProductConfig, TargetSettings};
use conveyor_core::deployer::DeploymentTarget;
use tracing::warn;

use crate::{ArtifactoryTarget, NexusTarget, S3Target};

/// Known target kinds, in deployment order.
pub const TARGET_KINDS: [&str; 3] = ["artifactory", "nexus", "s3"];

/// Build the target for `kind` if it is known and enabled.
///
/// `kind` is matched case-insensitively. A disabled or unknown target is
/// `None`, which callers skip.
pub fn create_deployment_target(
    kind: &str,
    settings: &TargetSettings,
) -> Option<Box<dyn DeploymentTarget>> {
    if !settings.enabled {
        return None;
    }

    let credentials_ref = settings.credentials_ref.clone();
    let credentials = settings.credentials.clone();

    match kind.to_ascii_lowercase().as_str() {
        "artifactory" => Some(Box::new(ArtifactoryTarget::new(credentials_ref, credentials))),
        "nexus" => Some(Box::new(NexusTarget::new(credentials_ref, credentials))),
        "s3" => Some(Box::new(S3Target::new(credentials_ref, credentials))),
        _ => None,
    }
}

/// Build every enabled target of a product, in [`TARGET_KINDS`] order.
///
/// Configuration keys must be spelled exactly as in [`TARGET_KINDS`].
/// Enabled entries under any other key are skipped with a warning.
pub fn init_deployment_targets(product: &ProductConfig) -> Vec<Box<dyn DeploymentTarget>> {
    let mut targets = Vec::new();

    for kind in TARGET_KINDS {
        let settings = product.repositories.get(kind);
        if let Some(target) = settings.and_then(|s| create_deployment_target(kind, s)) {
            targets.push(target);
        }
    }

    for (kind, settings) in &product.repositories {
        if settings.enabled && !TARGET_KINDS.contains(&kind.as_str()) {
            warn!(
                product = %product.product_name,
                %kind,
                "Ignoring unrecognised deployment target"
            );
        }
    }

    targets
}
