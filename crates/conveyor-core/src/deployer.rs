//! Deployment target trait.
//!
//! Deployment targets receive a built product (artifact repositories, object storage).

use async_trait::async_trait;

use crate::secret::Credentials;
use crate::{Product, Result};

/// A destination that receives a built product.
#[async_trait]
pub trait DeploymentTarget: Send + Sync {
    /// Name of this target kind (e.g. "artifactory").
    fn name(&self) -> &'static str;

    /// Key the credentials were looked up under, if one was configured.
    fn credentials_ref(&self) -> Option<&str>;

    /// Credentials merged from the secret store, if any.
    fn credentials(&self) -> Option<&Credentials>;

    /// Deliver the product to this target.
    async fn deploy(&self, product: &Product) -> Result<()>;
}
