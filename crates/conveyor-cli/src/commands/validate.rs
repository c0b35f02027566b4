//! Configuration validation command.

use anyhow::Result;
use conveyor_scheduler::assemble_product;
use std::process::ExitCode;

use super::ConfigArgs;

/// Load the configuration and assemble every product.
///
/// Products without a default branch are assembled against a placeholder
/// branch, since `run` requires `--target-branch` for them anyway.
pub fn validate(args: &ConfigArgs) -> Result<ExitCode> {
    let config = args.load()?;

    for product_config in &config.products {
        let branch_override = match product_config.default_target_branch {
            Some(_) => None,
            None => {
                println!(
                    "note: product '{}' has no default branch; run needs --target-branch",
                    product_config.product_name
                );
                Some("HEAD")
            }
        };
        let product = assemble_product(product_config, branch_override)?;
        println!(
            "✓ {} ({} target(s), {} channel(s))",
            product.name(),
            product.deploy_targets().len(),
            product.notification_channels().len()
        );
    }

    println!("Configuration is valid");
    Ok(ExitCode::SUCCESS)
}
