// Vendor controller HTTP client.
//
// Wraps `reqwest::Client` with the discovery plumbing an uncooperative
// controller deployment needs: candidate base URLs, two site-listing path
// variants, a grid of device-endpoint paths with both encoded and raw
// site identifiers, and a credential-header retry on 401. All responses
// come back as loose `serde_json::Value` documents -- controller payloads
// are too inconsistent across firmware lines to model as structs.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use crate::candidate::first_success;
use crate::error::Error;
use crate::transport::{PROBE_TIMEOUT, TransportConfig};

/// Header spellings tried for the API key. Some firmwares match the
/// header case-sensitively, so a 401 on the first spelling triggers one
/// retry with the alternate.
const API_KEY_HEADERS: [&str; 2] = ["X-API-Key", "X-API-KEY"];

/// Site-listing path variants, in order of likelihood.
const SITES_PATHS: [&str; 2] = ["/proxy/network/api/self/sites", "/api/self/sites"];

/// Raw HTTP client for a vendor network controller.
pub struct ControllerClient {
    http: reqwest::Client,
    discovery: reqwest::Client,
    api_key: SecretString,
    api_timeout: Duration,
}

impl ControllerClient {
    /// Create a controller client from a `TransportConfig`.
    ///
    /// The primary client uses the config's timeout; a second client with
    /// the short probe timeout serves site discovery.
    pub fn new(api_key: SecretString, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let discovery = transport.clone().with_timeout(PROBE_TIMEOUT).build_client()?;
        Ok(Self {
            http,
            discovery,
            api_key,
            api_timeout: transport.timeout,
        })
    }

    /// GET a controller URL, returning the decoded JSON document.
    ///
    /// Retries once with the alternate API-key header spelling on 401.
    /// A 2xx response that is not JSON is wrapped as `{"raw": <text>}`.
    /// Any other status becomes [`Error::Api`] with the message pulled
    /// out of the vendor's error envelope.
    pub async fn get_json(&self, url: &str) -> Result<Value, Error> {
        self.get_json_with(&self.http, self.api_timeout, url).await
    }

    async fn get_json_with(
        &self,
        client: &reqwest::Client,
        timeout: Duration,
        url: &str,
    ) -> Result<Value, Error> {
        let mut rejected = None;
        for header in API_KEY_HEADERS {
            debug!(%url, header, "GET controller");
            match self.attempt(client, timeout, url, header).await {
                Ok(doc) => return Ok(doc),
                // Rejected credential: retry with the alternate spelling.
                Err(e) if e.is_auth() => rejected = Some(e),
                Err(e) => return Err(e),
            }
        }
        Err(rejected.unwrap_or_else(|| Error::AuthFailed {
            message: "credential rejected for every header variant".into(),
        }))
    }

    async fn attempt(
        &self,
        client: &reqwest::Client,
        timeout: Duration,
        url: &str,
        header: &str,
    ) -> Result<Value, Error> {
        let resp = client
            .get(url)
            .header(header, self.api_key.expose_secret())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::transport(e, timeout))?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_owned();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::transport(e, timeout))?;

        if status.is_success() {
            if content_type.contains("application/json") {
                serde_json::from_str(&body).map_err(|e| Error::ParseFailed {
                    message: e.to_string(),
                })
            } else {
                Ok(serde_json::json!({ "raw": body }))
            }
        } else {
            Err(Error::Api {
                status: status.as_u16(),
                message: extract_error_message(status.as_u16(), &body),
                url: url.to_owned(),
            })
        }
    }

    /// Discover the site identifier by listing sites on each candidate
    /// base, trying both known path variants.
    ///
    /// Picks the site literally named "default" (case-insensitive) when
    /// present, else the first site returned. Falls back to the literal
    /// `"default"` when every base and path fails -- discovery is always
    /// best-effort.
    pub async fn discover_site(&self, bases: &[String]) -> String {
        for base in bases {
            for path in SITES_PATHS {
                let url = format!("{base}{path}");
                match self.get_json_with(&self.discovery, PROBE_TIMEOUT, &url).await {
                    Ok(doc) => {
                        if let Some(site) = pick_site(&doc) {
                            debug!(%site, %url, "discovered site");
                            return site;
                        }
                    }
                    Err(e) => debug!(%url, error = %e, "site listing failed"),
                }
            }
        }
        debug!("could not discover sites, using \"default\"");
        "default".to_owned()
    }

    /// Fetch the device collection, trying every (base, endpoint) pair in
    /// order and returning the first JSON (or raw-wrapped) document.
    pub async fn fetch_devices(&self, bases: &[String], site: &str) -> Result<Value, Error> {
        let endpoints = device_endpoints(site);
        let mut urls = Vec::with_capacity(bases.len() * endpoints.len());
        for base in bases {
            for endpoint in &endpoints {
                urls.push(format!("{base}{endpoint}"));
            }
        }
        first_success(urls, |url| async move { self.get_json(&url).await }).await
    }
}

/// The primary device-stats endpoint path for a site.
///
/// The gateway enricher targets this single path (with the candidate-base
/// and header fallbacks still applied) instead of the full grid.
pub fn site_device_endpoint(site: &str) -> String {
    format!("/proxy/network/api/s/{}/stat/device", encode_component(site))
}

/// Device-endpoint path variants for a site, covering both URL-encoded
/// and raw site identifiers (skipping duplicates when they coincide).
fn device_endpoints(site: &str) -> Vec<String> {
    let encoded = encode_component(site);
    let mut endpoints = vec![
        format!("/proxy/network/api/s/{encoded}/stat/device"),
        format!("/proxy/network/api/s/{encoded}/devices"),
        format!("/proxy/network/api/s/{encoded}/gateways"),
    ];
    if encoded != site {
        endpoints.insert(1, format!("/proxy/network/api/s/{site}/stat/device"));
        endpoints.push(format!("/proxy/network/api/s/{site}/devices"));
        endpoints.push(format!("/proxy/network/api/s/{site}/gateways"));
    }
    endpoints
}

/// Percent-encode a path component (site names may carry spaces and
/// punctuation).
fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(b));
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Pick a site name from a site-listing document.
fn pick_site(doc: &Value) -> Option<String> {
    let sites = doc.get("data")?.as_array()?;
    let names: Vec<&str> = sites.iter().filter_map(|s| s.get("name")?.as_str()).collect();
    names
        .iter()
        .find(|n| n.eq_ignore_ascii_case("default"))
        .or_else(|| names.first())
        .map(|n| (*n).to_owned())
}

/// Extract a human-readable message from a vendor error body.
///
/// Controller errors show up in `meta.msg`, `error.message`, or a bare
/// `message` field depending on the API surface; anything else falls back
/// to a body prefix or the bare status.
fn extract_error_message(status: u16, body: &str) -> String {
    if body.is_empty() {
        return format!("Status {status}");
    }
    match serde_json::from_str::<Value>(body) {
        Ok(doc) => doc
            .pointer("/meta/msg")
            .or_else(|| doc.pointer("/error/message"))
            .or_else(|| doc.get("message"))
            .and_then(Value::as_str)
            .map_or_else(|| doc.to_string(), ToOwned::to_owned),
        Err(_) => body.chars().take(100).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pick_site_prefers_default_case_insensitive() {
        let doc = json!({ "data": [ { "name": "branch" }, { "name": "Default" } ] });
        assert_eq!(pick_site(&doc).as_deref(), Some("Default"));
    }

    #[test]
    fn pick_site_falls_back_to_first() {
        let doc = json!({ "data": [ { "name": "branch" }, { "name": "lab" } ] });
        assert_eq!(pick_site(&doc).as_deref(), Some("branch"));
    }

    #[test]
    fn pick_site_empty_listing_is_none() {
        assert_eq!(pick_site(&json!({ "data": [] })), None);
        assert_eq!(pick_site(&json!({})), None);
    }

    #[test]
    fn endpoints_skip_duplicates_for_plain_sites() {
        let eps = device_endpoints("default");
        assert_eq!(eps.len(), 3);
        assert_eq!(eps[0], "/proxy/network/api/s/default/stat/device");
    }

    #[test]
    fn endpoints_cover_encoded_and_raw_site() {
        let eps = device_endpoints("my site");
        assert_eq!(eps.len(), 6);
        assert_eq!(eps[0], "/proxy/network/api/s/my%20site/stat/device");
        assert_eq!(eps[1], "/proxy/network/api/s/my site/stat/device");
    }

    #[test]
    fn error_message_from_envelope_variants() {
        assert_eq!(
            extract_error_message(401, r#"{"meta":{"msg":"api.err.NoSiteContext"}}"#),
            "api.err.NoSiteContext"
        );
        assert_eq!(
            extract_error_message(403, r#"{"error":{"message":"forbidden"}}"#),
            "forbidden"
        );
        assert_eq!(
            extract_error_message(500, r#"{"message":"boom"}"#),
            "boom"
        );
        assert_eq!(extract_error_message(502, ""), "Status 502");
        assert_eq!(extract_error_message(500, "<html>oops</html>"), "<html>oops</html>");
    }
}
