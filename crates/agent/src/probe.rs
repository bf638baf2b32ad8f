//! Reachability probes.
//!
//! A [`Probe`] answers one question: is the target up right now? Probes
//! never fail; any error while probing is a "down" reading.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

/// The probe capability injected into every unit.
#[async_trait]
pub trait Probe: Send + Sync {
    /// `true` if the target is reachable.
    async fn probe(&self) -> bool;
}

// ---------------------------------------------------------------------------
// HttpProbe
// ---------------------------------------------------------------------------

/// Sends `HEAD <url>` and reports up only on `200 OK`.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    /// Build a probe whose requests give up after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self) -> bool {
        match self.client.head(&self.url).send().await {
            Ok(response) => {
                let status = response.status();
                if status != StatusCode::OK {
                    tracing::debug!(url = %self.url, status = status.as_u16(), "Probe got non-200 status");
                }
                status == StatusCode::OK
            }
            Err(e) => {
                tracing::debug!(url = %self.url, error = %e, "Probe request failed");
                false
            }
        }
    }
}
