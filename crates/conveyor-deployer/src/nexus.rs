//! Nexus deployment target.

use async_trait::async_trait;
use conveyor_core::Product;
use conveyor_core::Result;
use conveyor_core::deployer::DeploymentTarget;
use conveyor_core::secret::Credentials;
use tracing::Span;

use crate::common::TargetState;

/// Pushes the product to a Nexus repository as a versioned component.
pub struct NexusTarget {
    state: TargetState,
}

impl NexusTarget {
    pub fn new(credentials_ref: Option<String>, credentials: Option<Credentials>) -> Self {
        Self {
            state: TargetState::new("nexus", credentials_ref, credentials),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.state.span = span;
        self
    }

    /// Component coordinates: `<product>:<branch>`, with path separators
    /// in the branch flattened.
    pub fn component(product: &Product) -> String {
        format!(
            "{}:{}",
            product.name(),
            product.target_branch().replace('/', "-")
        )
    }
}

#[async_trait]
impl DeploymentTarget for NexusTarget {
    fn name(&self) -> &'static str {
        "nexus"
    }

    fn credentials_ref(&self) -> Option<&str> {
        self.state.credentials_ref.as_deref()
    }

    fn credentials(&self) -> Option<&Credentials> {
        self.state.credentials.as_ref()
    }

    async fn deploy(&self, product: &Product) -> Result<()> {
        self.state.deliver("Nexus", product, &Self::component(product))
    }
}
