//! The HTTP seam between the scrapers and an authenticated portal session.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// An authenticated session against the portal.
///
/// Implemented by the reqwest client and by in-memory fakes in tests.
#[async_trait]
pub trait PortalClient: Send + Sync {
    /// GET a page and return its raw body.
    async fn get(&self, url: &str) -> Result<Vec<u8>>;

    /// POST a JSON body and return the raw response body.
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<Vec<u8>>;
}

#[async_trait]
impl<C: PortalClient + ?Sized> PortalClient for Arc<C> {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        (**self).get(url).await
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<Vec<u8>> {
        (**self).post_json(url, body).await
    }
}
