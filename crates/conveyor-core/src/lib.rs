//! Core domain types and traits for the Conveyor delivery pipeline.
//!
//! This crate contains:
//! - Run identifiers and error types
//! - Stage names and dispatch policy
//! - Deployment target and notification channel traits
//! - Credentials and channel option maps
//! - The product aggregate and its stage operations

pub mod deployer;
pub mod error;
pub mod id;
pub mod notifier;
pub mod pipeline;
pub mod product;
pub mod secret;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use error::{DeliveryFailure, Error, Result};
pub use id::RunId;
pub use pipeline::{DispatchMode, DispatchPolicy, FailurePolicy, PipelineStatus, Stage};
pub use product::{Deliverable, Product};
