// ── Provider configuration ──
//
// These types describe *what* to monitor. They are decoded by the daemon
// binary (or any other loader) and handed in; core never reads disk.
// A ProviderConfig is immutable for the process lifetime.

use secrecy::SecretString;
use serde::Deserialize;

use wanwatch_api::candidate_bases;

/// Which checking strategy a provider uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Controller-API discovery against the vendor hub.
    VendorApi,
    /// Reachability gate plus JSON status endpoints with fallback.
    GenericHttp,
    /// Plain reachability probe only.
    Reachability,
}

/// Configuration for a single monitored provider.
///
/// Which fields apply depends on `kind`; unknown combinations are simply
/// ignored by the checker rather than rejected, matching how these
/// configs evolve in the field.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Unique provider name -- the key into the status store.
    pub name: String,
    pub kind: ProviderKind,

    // ── vendor_api ──
    /// Controller base address (scheme and port optional).
    pub controller_url: Option<String>,
    /// Controller API key.
    pub api_key: Option<SecretString>,
    /// Site identifier; discovered from the API when absent.
    pub site: Option<String>,
    /// Pin the physical gateway by exact MAC.
    pub gateway_mac: Option<String>,
    /// WAN port name on the target device (defaults to "wan1").
    pub wan_port: Option<String>,

    // ── generic_http / reachability ──
    /// Device host (IP or name) for the reachability gate.
    pub host: Option<String>,
    /// Primary JSON status endpoint.
    pub api_url: Option<String>,
    /// Alternate status endpoints, tried in order after the primary.
    #[serde(default)]
    pub alt_api_urls: Vec<String>,
    /// Plain HTTP health-check URL (fallback when no endpoint yields JSON).
    pub health_url: Option<String>,
    /// Field names extracted verbatim from the status payload.
    #[serde(default)]
    pub signal_keys: Vec<String>,
    /// Nested key path resolved against the payload to derive `up`.
    #[serde(default)]
    pub health_key_path: Vec<String>,
    /// Hub WAN interface carrying this provider; opts into enrichment.
    pub gateway_wan_port: Option<String>,
}

impl ProviderConfig {
    /// The WAN interface name to enrich from the hub, if any.
    pub fn enrichment_wan_port(&self) -> Option<&str> {
        self.gateway_wan_port
            .as_deref()
            .or(self.wan_port.as_deref())
    }
}

/// The hub controller used for gateway enrichment, resolved once from
/// the provider list and passed explicitly into checks.
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub bases: Vec<String>,
    pub api_key: SecretString,
    pub site: String,
}

impl HubConfig {
    /// Resolve the hub from the provider list: the first `vendor_api`
    /// provider carrying both a controller address and an API key.
    pub fn resolve(providers: &[ProviderConfig]) -> Option<Self> {
        providers
            .iter()
            .find(|p| {
                p.kind == ProviderKind::VendorApi
                    && p.controller_url.is_some()
                    && p.api_key.is_some()
            })
            .map(|p| Self {
                bases: candidate_bases(p.controller_url.as_deref().unwrap_or_default()),
                api_key: p.api_key.clone().unwrap_or_else(|| SecretString::from("")),
                site: p.site.clone().unwrap_or_else(|| "default".to_owned()),
            })
    }
}

/// Top-level monitor configuration handed to the poller.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between poll cycles.
    #[serde(default = "default_interval")]
    pub check_interval_seconds: u64,
    /// Webhook URL for transition notifications; absent disables them.
    pub webhook_url: Option<String>,
    pub providers: Vec<ProviderConfig>,
}

fn default_interval() -> u64 {
    60
}

impl MonitorConfig {
    /// Validate the invariants the engine relies on: at least one
    /// provider, and unique provider names.
    pub fn validate(&self) -> Result<(), crate::error::CoreError> {
        if self.providers.is_empty() {
            return Err(crate::error::CoreError::Config {
                message: "no providers configured".into(),
            });
        }
        let mut seen = std::collections::HashSet::new();
        for p in &self.providers {
            if !seen.insert(p.name.as_str()) {
                return Err(crate::error::CoreError::Config {
                    message: format!("duplicate provider name: {}", p.name),
                });
            }
        }
        Ok(())
    }
}
