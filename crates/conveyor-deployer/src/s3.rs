//! S3 deployment target.

use async_trait::async_trait;
use conveyor_core::Product;
use conveyor_core::Result;
use conveyor_core::deployer::DeploymentTarget;
use conveyor_core::secret::Credentials;
use tracing::Span;

use crate::common::TargetState;

/// Uploads the product to object storage.
pub struct S3Target {
    state: TargetState,
}

impl S3Target {
    pub fn new(credentials_ref: Option<String>, credentials: Option<Credentials>) -> Self {
        Self {
            state: TargetState::new("s3", credentials_ref, credentials),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.state.span = span;
        self
    }

    /// Object key: product, branch, and the scheduled time so that
    /// repeated runs never overwrite each other.
    pub fn object_key(product: &Product) -> String {
        format!(
            "{}/{}/{}",
            product.name(),
            product.target_branch(),
            product.scheduled_time().format("%Y%m%dT%H%M%SZ")
        )
    }
}

#[async_trait]
impl DeploymentTarget for S3Target {
    fn name(&self) -> &'static str {
        "s3"
    }

    fn credentials_ref(&self) -> Option<&str> {
        self.state.credentials_ref.as_deref()
    }

    fn credentials(&self) -> Option<&Credentials> {
        self.state.credentials.as_ref()
    }

    async fn deploy(&self, product: &Product) -> Result<()> {
        self.state.deliver("S3", product, &Self::object_key(product))
    }
}
