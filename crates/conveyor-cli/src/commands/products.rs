//! Product listing command.

use anyhow::Result;
use std::process::ExitCode;

use super::ConfigArgs;

pub fn list(args: &ConfigArgs) -> Result<ExitCode> {
    let config = args.load()?;

    for product in &config.products {
        let branch = product.default_target_branch.as_deref().unwrap_or("-");
        let targets: Vec<_> = product.enabled_targets().collect();
        let channels: Vec<_> = product.enabled_channels().collect();
        println!(
            "{}  branch={}  targets=[{}]  channels=[{}]",
            product.product_name,
            branch,
            targets.join(","),
            channels.join(",")
        );
    }

    Ok(ExitCode::SUCCESS)
}
