//! State shared by every deployment target.

use conveyor_core::secret::Credentials;
use conveyor_core::{Product, Result};
use tracing::{Span, info, info_span, warn};

pub(crate) struct TargetState {
    pub(crate) credentials_ref: Option<String>,
    pub(crate) credentials: Option<Credentials>,
    pub(crate) span: Span,
}

impl TargetState {
    pub(crate) fn new(
        kind: &'static str,
        credentials_ref: Option<String>,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            credentials_ref,
            credentials,
            span: info_span!("deploy_target", target = kind),
        }
    }

    /// Record delivery of `product` to `location` on the named system.
    pub(crate) fn deliver(&self, system: &str, product: &Product, location: &str) -> Result<()> {
        let _enter = self.span.enter();

        if let (Some(credentials_ref), None) = (&self.credentials_ref, &self.credentials) {
            warn!(%credentials_ref, "No credentials merged for reference; deploying without them");
        }
        let credential_keys: Vec<&str> = self
            .credentials
            .iter()
            .flat_map(|c| c.keys())
            .collect();

        info!(
            product = %product.name(),
            branch = %product.target_branch(),
            %location,
            credentials = ?credential_keys,
            "Deploying product '{}' to {}",
            product.name(),
            system
        );
        Ok(())
    }
}
