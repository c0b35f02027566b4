//! Artifactory deployment target.

use async_trait::async_trait;
use conveyor_core::Product;
use conveyor_core::Result;
use conveyor_core::deployer::DeploymentTarget;
use conveyor_core::secret::Credentials;
use tracing::Span;

use crate::common::TargetState;

/// Pushes the product to an Artifactory binary repository.
pub struct ArtifactoryTarget {
    state: TargetState,
}

impl ArtifactoryTarget {
    pub fn new(credentials_ref: Option<String>, credentials: Option<Credentials>) -> Self {
        Self {
            state: TargetState::new("artifactory", credentials_ref, credentials),
        }
    }

    /// Log under `span` instead of the target's own span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.state.span = span;
        self
    }

    /// Repository path the product is published under.
    pub fn repository_path(product: &Product) -> String {
        format!("{}/{}", product.name(), product.target_branch())
    }
}

#[async_trait]
impl DeploymentTarget for ArtifactoryTarget {
    fn name(&self) -> &'static str {
        "artifactory"
    }

    fn credentials_ref(&self) -> Option<&str> {
        self.state.credentials_ref.as_deref()
    }

    fn credentials(&self) -> Option<&Credentials> {
        self.state.credentials.as_ref()
    }

    async fn deploy(&self, product: &Product) -> Result<()> {
        self.state
            .deliver("Artifactory", product, &Self::repository_path(product))
    }
}
