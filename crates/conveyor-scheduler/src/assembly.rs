//! Building a runnable product from its configuration.

use conveyor_config::{ConfigResult, ProductConfig};
use conveyor_core::Product;
use conveyor_deployer::init_deployment_targets;
use conveyor_notifier::init_notification_channels;
use tracing::debug;

/// Assemble `config` into a product scheduled for now.
///
/// `branch_override` wins over the configured default branch.
pub fn assemble_product(
    config: &ProductConfig,
    branch_override: Option<&str>,
) -> ConfigResult<Product> {
    let branch = config.resolve_branch(branch_override)?;

    let product = Product::new(&config.product_name, &config.git_repository, branch)
        .with_targets(init_deployment_targets(config))
        .with_channels(init_notification_channels(config));

    debug!(?product, "Assembled product");
    Ok(product)
}
