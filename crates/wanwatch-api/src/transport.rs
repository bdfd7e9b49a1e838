// Shared transport configuration for building reqwest::Client instances.
//
// The controller and probe clients share TLS and timeout settings through
// this module. Consumer gateways and controllers commonly run self-signed
// certificates, so certificate validation defaults to disabled.

use std::time::Duration;

use crate::error::Error;

/// Timeout for bare reachability, site discovery, and health-URL probes.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for primary API calls.
pub const API_TIMEOUT: Duration = Duration::from_secs(10);

/// TLS verification mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Accept any certificate (for self-signed gateways).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::DangerAcceptInvalid,
            timeout: API_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Same transport with a different per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent("wanwatch/0.1.0");

        if self.tls == TlsMode::DangerAcceptInvalid {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}
