//! Deployment targets for the Conveyor delivery pipeline.
//!
//! Provides target implementations:
//! - Artifactory (binary repository)
//! - Nexus (artifact repository)
//! - S3 (object storage)

pub mod artifactory;
pub mod factory;
pub mod nexus;
pub mod s3;

mod common;

pub use artifactory::ArtifactoryTarget;
pub use conveyor_core::deployer::DeploymentTarget;
pub use factory::{TARGET_KINDS, create_deployment_target, init_deployment_targets};
pub use nexus::NexusTarget;
pub use s3::S3Target;
