// Plain HTTP probes against modem/gateway devices.
//
// These are the unauthenticated half of the checking strategies: a bare
// reachability GET against the device host, JSON status-endpoint fetches,
// and the HTTP-success health probe. Short timeout for reachability and
// health, the longer API timeout for status endpoints.

use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::transport::{API_TIMEOUT, PROBE_TIMEOUT, TransportConfig};

/// HTTP prober shared by the generic and bare-reachability strategies.
pub struct ProbeClient {
    short: reqwest::Client,
    long: reqwest::Client,
}

impl ProbeClient {
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        let short = transport.clone().with_timeout(PROBE_TIMEOUT).build_client()?;
        let long = transport.clone().with_timeout(API_TIMEOUT).build_client()?;
        Ok(Self { short, long })
    }

    /// Bare reachability: a plain GET to `http://{host}/`.
    ///
    /// Any HTTP response at all counts as reachable -- most gateways
    /// answer the root path with a redirect or an error page.
    pub async fn reachable(&self, host: &str) -> bool {
        let url = format!("http://{host}/");
        match self.short.get(&url).send().await {
            Ok(_) => true,
            Err(e) => {
                debug!(%host, error = %e, "reachability probe failed");
                false
            }
        }
    }

    /// Fetch a status endpoint, returning its JSON document.
    ///
    /// `Ok(None)` means the endpoint answered but without usable JSON
    /// (non-2xx, or a non-JSON content type); `Err` means the request
    /// itself failed and is worth a breadcrumb in the check details.
    pub async fn fetch_json(&self, url: &str) -> Result<Option<Value>, Error> {
        debug!(%url, "GET status endpoint");
        let resp = self
            .long
            .get(url)
            .send()
            .await
            .map_err(|e| Error::transport(e, API_TIMEOUT))?;

        if !resp.status().is_success() {
            return Ok(None);
        }
        let is_json = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));
        if !is_json {
            return Ok(None);
        }

        let doc = resp.json().await.map_err(|e| Error::ParseFailed {
            message: e.to_string(),
        })?;
        Ok(Some(doc))
    }

    /// Probe a health-check URL, returning the HTTP status code if the
    /// request completed at all.
    pub async fn health_status(&self, url: &str) -> Option<u16> {
        match self.short.get(url).send().await {
            Ok(resp) => Some(resp.status().as_u16()),
            Err(e) => {
                debug!(%url, error = %e, "health probe failed");
                None
            }
        }
    }
}
