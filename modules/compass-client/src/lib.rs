pub mod error;

pub use error::{ClientError, Result};

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use compass_core::{CompassConfig, PortalClient};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};

/// A logged-in portal session over reqwest.
///
/// The session cookie comes from an existing login; cookies the portal sets
/// afterwards are kept in the client's store.
pub struct CompassClient {
    client: reqwest::Client,
    requests: AtomicU64,
}

impl CompassClient {
    pub fn new(config: &CompassConfig, session_cookie: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = session_cookie {
            let value = HeaderValue::from_str(cookie).map_err(|e| ClientError::InvalidCookie(e.to_string()))?;
            headers.insert(COOKIE, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_store(true)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            requests: AtomicU64::new(0),
        })
    }

    /// Requests sent so far, successful or not.
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &str) -> Result<Vec<u8>> {
        let count = self.requests.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(url, count, "Portal request");

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(url, status = status.as_u16(), "Portal request failed");
            return Err(ClientError::Api {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }
}

#[async_trait]
impl PortalClient for CompassClient {
    async fn get(&self, url: &str) -> compass_core::Result<Vec<u8>> {
        Ok(self.send(self.client.get(url), url).await?)
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> compass_core::Result<Vec<u8>> {
        Ok(self.send(self.client.post(url).json(body), url).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compass_core::CompassError;

    #[test]
    fn new_client_has_sent_nothing() {
        let client = CompassClient::new(&CompassConfig::default(), Some("ASP.NET_SessionId=abc")).unwrap();
        assert_eq!(client.request_count(), 0);
    }

    #[test]
    fn control_characters_in_cookie_are_rejected() {
        let err = CompassClient::new(&CompassConfig::default(), Some("bad\ncookie")).err().unwrap();
        assert!(matches!(err, ClientError::InvalidCookie(_)));
    }

    #[tokio::test]
    async fn unreachable_portal_is_network_error_and_counted() {
        let mut config = CompassConfig::new("http://127.0.0.1:9");
        config.timeout_secs = 2;
        let client = CompassClient::new(&config, None).unwrap();

        let err = client.get(&config.url("MemberProfile.aspx?CN=1")).await.unwrap_err();
        assert!(matches!(err, CompassError::Network(_)), "got {err:?}");
        assert_eq!(client.request_count(), 1);
    }
}
