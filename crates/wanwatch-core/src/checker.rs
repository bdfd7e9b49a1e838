// ── Provider checking strategies ──
//
// One entry point, three strategies. `check()` never fails outward:
// every internal error is flattened into a `{up: false, details: {...}}`
// result so one misbehaving provider can never take down the poll cycle.
//
// The vendor-API strategy carries the discovery weight: candidate bases,
// site discovery, the endpoint grid, device heuristics, WAN resolution,
// and public-IP precedence. The generic strategy gates on reachability,
// then walks the configured URL list through the extractor table. The
// bare strategy is just the reachability gate.

use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, warn};

use wanwatch_api::{ControllerClient, Error, ProbeClient, TransportConfig, candidate_bases};

use crate::config::{HubConfig, ProviderConfig, ProviderKind};
use crate::enrich::{self, WanInfo};
use crate::error::CoreError;
use crate::extract::{self, Details, NOT_AVAILABLE};
use crate::ip;

/// Normalized outcome of one provider check. Produced fresh each cycle
/// and applied to the store wholesale.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub up: bool,
    pub details: Details,
}

impl CheckResult {
    fn down(key: &str, message: impl Into<String>) -> Self {
        let mut details = Details::new();
        details.insert(key.to_owned(), Value::String(message.into()));
        Self { up: false, details }
    }
}

/// Polymorphic provider checker.
///
/// Holds the shared probe client and the resolved hub configuration for
/// enrichment; vendor controller clients are built per check from the
/// provider's own credentials.
pub struct ProviderChecker {
    transport: TransportConfig,
    probe: ProbeClient,
    hub: Option<HubConfig>,
}

impl ProviderChecker {
    pub fn new(hub: Option<HubConfig>) -> Result<Self, CoreError> {
        let transport = TransportConfig::default();
        let probe = ProbeClient::new(&transport)?;
        Ok(Self {
            transport,
            probe,
            hub,
        })
    }

    /// Run the provider's check strategy. Never fails outward.
    pub async fn check(&self, cfg: &ProviderConfig) -> CheckResult {
        let result = match cfg.kind {
            ProviderKind::VendorApi => match self.check_vendor(cfg).await {
                Ok(result) => result,
                Err(e) => {
                    // Transient network blips are expected between cycles
                    // and not worth a warning.
                    if e.is_transient() {
                        debug!(provider = %cfg.name, error = %e, "vendor API check failed");
                    } else {
                        warn!(provider = %cfg.name, error = %e, "vendor API check failed");
                    }
                    CheckResult::down("api_error", e.to_string())
                }
            },
            ProviderKind::GenericHttp => self.check_generic(cfg).await,
            ProviderKind::Reachability => self.check_reachability(cfg).await,
        };
        debug!(provider = %cfg.name, up = result.up, "check complete");
        result
    }

    // ── vendor_api strategy ─────────────────────────────────────────

    async fn check_vendor(&self, cfg: &ProviderConfig) -> Result<CheckResult, Error> {
        let api_key: SecretString = cfg.api_key.clone().ok_or_else(|| Error::AuthFailed {
            message: "API key is required for vendor API monitoring".into(),
        })?;
        let controller_url = cfg.controller_url.as_deref().ok_or_else(|| Error::NotFound {
            message: "controller_url is required for vendor API monitoring".into(),
        })?;

        let client = ControllerClient::new(api_key, &self.transport)?;
        let bases = candidate_bases(controller_url);

        let site = match &cfg.site {
            Some(site) => site.clone(),
            None => client.discover_site(&bases).await,
        };

        let doc = client.fetch_devices(&bases, &site).await?;
        let devices = extract::device_collection(&doc);

        let (target, gateway) =
            select_target(&devices, cfg.gateway_mac.as_deref()).ok_or_else(|| Error::NotFound {
                message: format!(
                    "Target device not found. Available: {}",
                    available_summary(&devices)
                ),
            })?;

        let wan_port = cfg.wan_port.as_deref().unwrap_or("wan1");
        let wan = locate_wan(target, wan_port);
        let up = derive_up(target, wan);
        let details = vendor_details(target, gateway, wan, up);

        Ok(CheckResult { up, details })
    }

    // ── generic_http strategy ───────────────────────────────────────

    async fn check_generic(&self, cfg: &ProviderConfig) -> CheckResult {
        let Some(host) = cfg.host.as_deref() else {
            return CheckResult::down("error", "Gateway unreachable");
        };
        if !self.probe.reachable(host).await {
            return CheckResult::down("error", "Gateway unreachable");
        }

        let mut details = Details::new();
        details.insert("ping".to_owned(), Value::String("OK".to_owned()));

        let mut urls: Vec<&str> = Vec::new();
        if let Some(url) = cfg.api_url.as_deref() {
            urls.push(url);
        }
        urls.extend(cfg.alt_api_urls.iter().map(String::as_str));

        let mut json_seen = false;
        for url in urls {
            match self.probe.fetch_json(url).await {
                Ok(Some(doc)) => {
                    extract::extract_signal_keys(&doc, &cfg.signal_keys, &mut details);
                    extract::run_extractors(&doc, &mut details);

                    // A configured health path decides `up` outright.
                    if !cfg.health_key_path.is_empty() {
                        let up = extract::get_path(&doc, &cfg.health_key_path)
                            .is_some_and(extract::health_truthy);
                        return CheckResult { up, details };
                    }
                    json_seen = true;
                    break;
                }
                Ok(None) => {}
                Err(e) => {
                    details.insert(
                        format!("error_{}", last_path_segment(url)),
                        Value::String(e.to_string()),
                    );
                }
            }
        }

        // No JSON anywhere: a plain health URL's HTTP success stands in.
        if !json_seen {
            if let Some(health_url) = cfg.health_url.as_deref() {
                if let Some(status) = self.probe.health_status(health_url).await {
                    let mut d = Details::new();
                    d.insert("http_status".to_owned(), Value::from(status));
                    return CheckResult {
                        up: (200..300).contains(&status),
                        details: d,
                    };
                }
            }
        }

        // Best-effort hub enrichment for providers carrying a WAN hint.
        if let (Some(hub), Some(port)) = (self.hub.as_ref(), cfg.enrichment_wan_port()) {
            match enrich::gateway_wan_info(hub, &self.transport, port).await {
                Some(info) => merge_wan_info(&mut details, &info),
                None => debug!(provider = %cfg.name, "gateway enrichment unavailable"),
            }
        }

        // Reachable, and any JSON endpoint that answered implied health.
        CheckResult { up: true, details }
    }

    // ── bare reachability strategy ──────────────────────────────────

    async fn check_reachability(&self, cfg: &ProviderConfig) -> CheckResult {
        let Some(host) = cfg.host.as_deref() else {
            return CheckResult::down("error", "Gateway unreachable");
        };
        if self.probe.reachable(host).await {
            let mut details = Details::new();
            details.insert("ping".to_owned(), Value::String("OK".to_owned()));
            CheckResult { up: true, details }
        } else {
            CheckResult::down("error", "Gateway unreachable")
        }
    }
}

// ── Device heuristics ───────────────────────────────────────────────

fn field_lc(device: &Value, key: &str) -> String {
    device
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase()
}

fn mac_matches(device: &Value, pinned: Option<&str>) -> bool {
    pinned.is_some_and(|mac| device.get("mac").and_then(Value::as_str) == Some(mac))
}

/// The distinguished modem device class (cable-modem hardware reporting
/// through the controller).
fn is_modem_device(device: &Value) -> bool {
    field_lc(device, "type") == "uci" || field_lc(device, "name").contains("cable internet")
}

/// True when the modem-specific detail set applies.
fn is_distinguished(device: &Value) -> bool {
    field_lc(device, "type") == "uci"
}

/// The physical gateway sourcing the public IP (narrow match).
fn is_gateway_device(device: &Value, pinned: Option<&str>) -> bool {
    let t = field_lc(device, "type");
    t.contains("gw")
        || t.contains("udm")
        || t.contains("udr")
        || field_lc(device, "name").contains("udm")
        || mac_matches(device, pinned)
}

/// Broad gateway-like match used when no modem-class device is present.
fn is_gateway_like(device: &Value, pinned: Option<&str>) -> bool {
    let t = field_lc(device, "type");
    let name = field_lc(device, "name");
    t.contains("gw")
        || t.contains("uci")
        || t.contains("udm")
        || t.contains("udr")
        || field_lc(device, "model").contains("uci")
        || name.contains("gateway")
        || name.contains("uci")
        || mac_matches(device, pinned)
}

/// Locate the target device, and -- when the target is the distinguished
/// modem class -- separately locate the physical gateway whose IP view is
/// authoritative (the modem's own is NAT'd/internal).
fn select_target<'a>(
    devices: &[&'a Value],
    pinned_mac: Option<&str>,
) -> Option<(&'a Value, Option<&'a Value>)> {
    if let Some(modem) = devices.iter().find(|d| is_modem_device(d)) {
        if is_distinguished(modem) {
            let gateway = devices
                .iter()
                .find(|d| is_gateway_device(d, pinned_mac))
                .copied();
            return Some((modem, gateway));
        }
    }
    devices
        .iter()
        .find(|d| is_gateway_like(d, pinned_mac))
        .map(|gw| (*gw, None))
}

fn available_summary(devices: &[&Value]) -> String {
    let names: Vec<&str> = devices
        .iter()
        .filter_map(|d| {
            d.get("model")
                .or_else(|| d.get("type"))
                .or_else(|| d.get("name"))
                .and_then(Value::as_str)
        })
        .collect();
    if names.is_empty() {
        "none".to_owned()
    } else {
        names.join(", ")
    }
}

// ── WAN resolution ──────────────────────────────────────────────────

/// Locate the WAN sub-structure on a device, in fallback order.
fn locate_wan<'a>(device: &'a Value, wan_port: &str) -> Option<&'a Value> {
    if let Some(port) = device.get("wan_ports").and_then(|w| w.get(wan_port)) {
        return Some(port);
    }
    if let Some(wan) = device.get("wan").filter(|w| w.is_object()) {
        return Some(wan.get(wan_port).unwrap_or(wan));
    }
    if let Some(internet) = device.get("internet").filter(|v| v.is_object()) {
        return Some(internet);
    }
    if let Some(named) = device.get(wan_port).filter(|v| v.is_object()) {
        return Some(named);
    }
    device.get("wan1").filter(|v| v.is_object())
}

/// Derive `up` from the WAN sub-structure, or device-level flags when no
/// WAN structure was found.
fn derive_up(device: &Value, wan: Option<&Value>) -> bool {
    if let Some(wan) = wan {
        return wan.get("status").and_then(Value::as_str) == Some("connected")
            || wan.get("up").and_then(Value::as_bool) == Some(true)
            || wan.get("enabled").and_then(Value::as_bool) == Some(true)
            || wan.get("state").and_then(Value::as_i64) == Some(1)
            || wan
                .get("type")
                .and_then(Value::as_str)
                .is_some_and(|t| t != "disabled" && t != "none");
    }
    if is_distinguished(device) {
        return device.get("internet").and_then(Value::as_bool) == Some(true)
            || device.get("state").and_then(Value::as_i64) == Some(1)
            || device.get("adopted").and_then(Value::as_bool) == Some(true);
    }
    device.get("state").and_then(Value::as_i64) == Some(1)
        || device.get("adopted").and_then(Value::as_bool) == Some(true)
        || device.pointer("/connectivity/status").and_then(Value::as_str) == Some("connected")
}

// ── Public-IP precedence ────────────────────────────────────────────

enum DiscoveredIp {
    Public(String),
    PrivateOnly(String),
    None,
}

/// Walk the public-IP precedence chain, stopping at the first candidate
/// that classifies as public. When every candidate is private, the best
/// one is surfaced flagged -- never as `public_ip`.
fn derive_public_ip(source: &Value, wan: Option<&Value>) -> DiscoveredIp {
    let ordered = [
        source.get("last_wan_ip"),
        source.pointer("/wan/ip"),
        wan.and_then(|w| w.get("ip")),
    ];
    for candidate in ordered.into_iter().flatten() {
        if let Some(ip) = candidate.as_str() {
            if ip::is_public(ip) {
                return DiscoveredIp::Public(ip.to_owned());
            }
        }
    }

    // Port-table scan: any WAN-named network carrying a public address.
    if let Some(ports) = source.get("port_table").and_then(Value::as_array) {
        for port in ports {
            let is_wan = port
                .get("network_name")
                .and_then(Value::as_str)
                .is_some_and(|n| n.to_lowercase().contains("wan"));
            if !is_wan {
                continue;
            }
            if let Some(ip) = port.get("ip").and_then(Value::as_str) {
                if ip::is_public(ip) {
                    return DiscoveredIp::Public(ip.to_owned());
                }
            }
        }
    }

    // Last resort: any IP field at all, flagged if private.
    let fallback = [
        wan.and_then(|w| w.get("ip")),
        source.get("last_wan_ip"),
        source.get("ip"),
        source.get("ip-addr"),
    ];
    for candidate in fallback.into_iter().flatten() {
        if let Some(ip) = candidate.as_str() {
            if ip::is_public(ip) {
                return DiscoveredIp::Public(ip.to_owned());
            }
            return DiscoveredIp::PrivateOnly(ip.to_owned());
        }
    }
    DiscoveredIp::None
}

// ── Detail population ───────────────────────────────────────────────

fn vendor_details(
    target: &Value,
    gateway: Option<&Value>,
    wan: Option<&Value>,
    up: bool,
) -> Details {
    let mut details = Details::new();

    let device_type = target
        .get("type")
        .or_else(|| target.get("model"))
        .cloned()
        .unwrap_or_else(|| Value::String("unknown".to_owned()));
    details.insert("device_type".to_owned(), device_type);
    extract::put_or_na(&mut details, "device_name", target.get("name"));
    extract::put_or_na(&mut details, "device_mac", target.get("mac"));

    let wan_status = wan
        .and_then(|w| w.get("status").or_else(|| w.get("state")))
        .cloned()
        .unwrap_or_else(|| Value::String(if up { "connected" } else { "unknown" }.to_owned()));
    details.insert("wan_status".to_owned(), wan_status);

    // The physical gateway's IP view wins over the modem's own.
    let ip_source = gateway.unwrap_or(target);
    match derive_public_ip(ip_source, wan) {
        DiscoveredIp::Public(ip) => {
            details.insert("public_ip".to_owned(), Value::String(ip));
        }
        DiscoveredIp::PrivateOnly(ip) => {
            details.insert("ip".to_owned(), Value::String(ip));
            details.insert("behind_nat".to_owned(), Value::Bool(true));
        }
        DiscoveredIp::None => {
            details.insert(
                "public_ip".to_owned(),
                Value::String(NOT_AVAILABLE.to_owned()),
            );
        }
    }

    extract::put_or_na(
        &mut details,
        "uptime",
        target
            .get("uptime")
            .or_else(|| target.pointer("/system-stats/uptime")),
    );
    extract::put_or_na(&mut details, "latency", wan.and_then(|w| w.get("latency")));
    extract::put_or_na(
        &mut details,
        "speeds",
        wan.and_then(|w| w.get("speeds").or_else(|| w.get("speed"))),
    );
    extract::put(&mut details, "state", target.get("state"));
    extract::put(&mut details, "adopted", target.get("adopted"));

    if is_distinguished(target) {
        modem_details(target, &mut details);
    }

    details
}

/// The extended detail set for the distinguished modem device class.
/// Every field is included only when present in the payload; missing
/// fields are omitted, never defaulted into the map.
fn modem_details(device: &Value, details: &mut Details) {
    if let Some(ci) = device.get("ci_state_table") {
        extract::put_or_na(details, "cable_state", ci.get("ci_state"));
        extract::put_or_na(details, "cable_mode", ci.get("ci_mode"));
        extract::put_or_na(details, "cable_version", ci.get("ci_version"));
        extract::put_or_na(details, "cable_cmts_mac", ci.get("ci_cmts_mac"));
        extract::put_or_na(details, "cable_reinit_reason", ci.get("ci_reinit_reason"));
        extract::put(details, "cable_sw_dl_status", ci.get("ci_sw_dl_status"));
    }

    if let Some(stats) = device.get("system-stats") {
        extract::put_or_na(details, "cpu_percent", stats.get("cpu"));
        extract::put_or_na(details, "memory_percent", stats.get("mem"));
    }

    if let Some(sys) = device.get("sys_stats") {
        extract::put_or_na(details, "load_avg_1", sys.get("loadavg_1"));
        extract::put_or_na(details, "load_avg_5", sys.get("loadavg_5"));
        extract::put_or_na(details, "load_avg_15", sys.get("loadavg_15"));
        if let Some(total) = sys.get("mem_total").and_then(Value::as_f64) {
            let used = sys.get("mem_used").and_then(Value::as_f64).unwrap_or(0.0);
            let buffer = sys.get("mem_buffer").and_then(Value::as_f64).unwrap_or(0.0);
            details.insert("memory_total_mb".to_owned(), extract::bytes_to_mb(total));
            details.insert("memory_used_mb".to_owned(), extract::bytes_to_mb(used));
            details.insert(
                "memory_free_mb".to_owned(),
                extract::bytes_to_mb(total - used),
            );
            details.insert("memory_buffer_mb".to_owned(), extract::bytes_to_mb(buffer));
        }
    }

    extract::put(details, "firmware_version", device.get("version"));
    extract::put(details, "firmware_display", device.get("displayable_version"));
    extract::put(details, "kernel_version", device.get("kernel_version"));
    extract::put(details, "isp_name", device.get("isp_name"));
    extract::put(details, "wan_port_name", device.get("wan_port"));
    extract::put(details, "wan_network_group", device.get("wan_networkgroup"));

    // Primary port statistics (the modem exposes a single uplink port).
    if let Some(port) = device
        .get("port_table")
        .and_then(Value::as_array)
        .and_then(|p| p.first())
    {
        extract::put_or_na(details, "port_speed_mbps", port.get("speed"));
        extract::put_or_na(details, "port_media", port.get("media"));
        extract::put_bool_or_false(details, "port_full_duplex", port.get("full_duplex"));
        for (field, total_key, gb_key) in [
            ("rx_bytes", "rx_bytes_total", "rx_bytes_gb"),
            ("tx_bytes", "tx_bytes_total", "tx_bytes_gb"),
        ] {
            if let Some(v) = port.get(field) {
                details.insert(total_key.to_owned(), v.clone());
                if let Some(gb) = extract::bytes_to_gb(v) {
                    details.insert(gb_key.to_owned(), gb);
                }
            }
        }
        extract::put(details, "rx_packets_total", port.get("rx_packets"));
        extract::put(details, "tx_packets_total", port.get("tx_packets"));
        extract::put(details, "rx_errors", port.get("rx_errors"));
        extract::put(details, "tx_errors", port.get("tx_errors"));
    }

    for (field, key) in [
        ("rx_bytes", "total_rx_bytes_gb"),
        ("tx_bytes", "total_tx_bytes_gb"),
        ("bytes", "total_bytes_gb"),
    ] {
        if let Some(gb) = device.get(field).and_then(|v| extract::bytes_to_gb(v)) {
            details.insert(key.to_owned(), gb);
        }
    }

    for (field, key) in [("connected_at", "connected_at"), ("last_seen", "last_seen")] {
        if let Some(iso) = device
            .get(field)
            .and_then(Value::as_i64)
            .and_then(extract::epoch_to_iso)
        {
            details.insert(key.to_owned(), Value::String(iso));
        }
    }
    extract::put(details, "internet_access", device.get("internet"));

    // Downlink: the modem's wired connection toward the gateway.
    if let Some(downlink) = device
        .get("downlink_table")
        .and_then(Value::as_array)
        .and_then(|d| d.first())
    {
        extract::put_or_na(details, "downlink_mac", downlink.get("mac"));
        extract::put_or_na(details, "downlink_speed_mbps", downlink.get("speed"));
        extract::put_bool_or_false(details, "downlink_full_duplex", downlink.get("full_duplex"));
        let port_label = downlink
            .get("port_idx")
            .and_then(Value::as_i64)
            .map_or_else(
                || Value::String(NOT_AVAILABLE.to_owned()),
                |idx| Value::String(format!("Port {idx}")),
            );
        details.insert("downlink_port".to_owned(), port_label);
    }

    extract::put(details, "serial_number", device.get("serial"));
    extract::put(details, "architecture", device.get("architecture"));
    extract::put(details, "adoption_completed", device.get("adoption_completed"));
    if let Some(iso) = device
        .get("adopted_at")
        .and_then(Value::as_i64)
        .and_then(extract::epoch_to_iso)
    {
        details.insert("adopted_at".to_owned(), Value::String(iso));
    }
}

// ── Enrichment merge ────────────────────────────────────────────────

/// Merge hub WAN info into the details, never overwriting a field
/// already set with a real value (the "N/A" sentinel may be filled).
fn merge_wan_info(details: &mut Details, info: &WanInfo) {
    details.insert(
        "gateway_wan_status".to_owned(),
        Value::String(info.port_status.clone()),
    );
    details.insert(
        "gateway_wan_port".to_owned(),
        Value::String(info.port_name.clone()),
    );
    for (key, value) in &info.stats {
        details.insert(format!("gateway_{key}"), value.clone());
    }

    if let Some(ip) = info.public_ip.as_deref().filter(|ip| ip::is_public(ip)) {
        let unset = details
            .get("public_ip")
            .and_then(Value::as_str)
            .is_none_or(|existing| existing == NOT_AVAILABLE);
        if unset {
            details.insert("public_ip".to_owned(), Value::String(ip.to_owned()));
        }
    } else if info.behind_nat {
        details.insert("behind_nat".to_owned(), Value::Bool(true));
        if let Some(private) = &info.private_ip {
            details.insert(
                "gateway_private_ip".to_owned(),
                Value::String(private.clone()),
            );
        }
    }

    let pinged = details.get("ping").and_then(Value::as_str) == Some("OK");
    if info.up && pinged {
        details.insert("gateway_verified".to_owned(), Value::Bool(true));
    }
}

fn last_path_segment(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    // ── Device selection ────────────────────────────────────────────

    #[test]
    fn modem_target_splits_off_physical_gateway() {
        let payload = json!([
            { "type": "usw", "name": "office switch" },
            { "type": "uci", "name": "Cable Internet", "internet": true },
            { "type": "udm", "name": "Dream Machine", "last_wan_ip": "203.0.113.7" },
        ]);
        let devices = extract::device_collection(&payload);
        let (target, gateway) = select_target(&devices, None).expect("target found");
        assert_eq!(target["type"], "uci");
        assert_eq!(gateway.expect("gateway found")["type"], "udm");
    }

    #[test]
    fn gateway_like_target_without_modem() {
        let payload = json!([
            { "type": "usw", "name": "switch" },
            { "type": "ugw3", "name": "Security Gateway" },
        ]);
        let devices = extract::device_collection(&payload);
        let (target, gateway) = select_target(&devices, None).expect("target found");
        assert_eq!(target["type"], "ugw3");
        assert!(gateway.is_none());
    }

    #[test]
    fn pinned_mac_selects_gateway() {
        let payload = json!([
            { "type": "uci", "name": "Cable Internet" },
            { "type": "usw", "mac": "aa:bb:cc:dd:ee:ff", "last_wan_ip": "8.8.8.8" },
        ]);
        let devices = extract::device_collection(&payload);
        let (_, gateway) =
            select_target(&devices, Some("aa:bb:cc:dd:ee:ff")).expect("target found");
        assert_eq!(gateway.expect("pinned")["mac"], "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn no_matching_device_is_none() {
        let payload = json!([{ "type": "usw", "name": "switch" }]);
        let devices = extract::device_collection(&payload);
        assert!(select_target(&devices, None).is_none());
    }

    // ── WAN resolution ──────────────────────────────────────────────

    #[test]
    fn wan_lookup_order() {
        let device = json!({
            "wan_ports": { "wan2": { "up": true } },
            "wan": { "status": "connected" },
            "wan1": { "enabled": true },
        });
        assert_eq!(locate_wan(&device, "wan2"), Some(&json!({ "up": true })));

        let device = json!({ "wan": { "status": "connected" } });
        assert_eq!(
            locate_wan(&device, "wan1"),
            Some(&json!({ "status": "connected" }))
        );

        let device = json!({ "internet": { "state": 1 } });
        assert_eq!(locate_wan(&device, "wan1"), Some(&json!({ "state": 1 })));

        // A boolean `internet` flag is not a WAN sub-structure.
        let device = json!({ "internet": true });
        assert_eq!(locate_wan(&device, "wan1"), None);
    }

    #[test]
    fn up_derivation_or_chain() {
        for wan in [
            json!({ "status": "connected" }),
            json!({ "up": true }),
            json!({ "enabled": true }),
            json!({ "state": 1 }),
            json!({ "type": "dhcp" }),
        ] {
            assert!(derive_up(&json!({}), Some(&wan)), "{wan}");
        }
        for wan in [
            json!({ "status": "disconnected" }),
            json!({ "up": false }),
            json!({ "type": "disabled" }),
            json!({ "type": "none" }),
            json!({}),
        ] {
            assert!(!derive_up(&json!({}), Some(&wan)), "{wan}");
        }
    }

    #[test]
    fn device_level_up_fallbacks() {
        assert!(derive_up(&json!({ "type": "uci", "internet": true }), None));
        assert!(derive_up(&json!({ "state": 1 }), None));
        assert!(derive_up(
            &json!({ "connectivity": { "status": "connected" } }),
            None
        ));
        assert!(!derive_up(&json!({ "type": "uci", "internet": false }), None));
    }

    // ── Public-IP precedence ────────────────────────────────────────

    #[test]
    fn last_wan_ip_wins_when_public() {
        let source = json!({ "last_wan_ip": "203.0.113.7", "wan": { "ip": "8.8.8.8" } });
        match derive_public_ip(&source, None) {
            DiscoveredIp::Public(ip) => assert_eq!(ip, "203.0.113.7"),
            _ => panic!("expected public"),
        }
    }

    #[test]
    fn private_last_wan_ip_is_skipped() {
        let source = json!({ "last_wan_ip": "192.168.1.2", "wan": { "ip": "8.8.8.8" } });
        match derive_public_ip(&source, None) {
            DiscoveredIp::Public(ip) => assert_eq!(ip, "8.8.8.8"),
            _ => panic!("expected public"),
        }
    }

    #[test]
    fn port_table_scan_finds_wan_network() {
        let source = json!({ "port_table": [
            { "network_name": "lan", "ip": "8.8.4.4" },
            { "network_name": "WAN2", "ip": "198.51.100.9" },
        ]});
        match derive_public_ip(&source, None) {
            DiscoveredIp::Public(ip) => assert_eq!(ip, "198.51.100.9"),
            _ => panic!("expected public"),
        }
    }

    #[test]
    fn private_only_is_flagged_never_public() {
        let source = json!({ "ip": "10.0.0.5" });
        match derive_public_ip(&source, None) {
            DiscoveredIp::PrivateOnly(ip) => assert_eq!(ip, "10.0.0.5"),
            _ => panic!("expected private-only"),
        }
        assert!(matches!(derive_public_ip(&json!({}), None), DiscoveredIp::None));
    }

    // ── Detail population ───────────────────────────────────────────

    #[test]
    fn vendor_details_private_only_omits_public_ip() {
        let target = json!({ "type": "ugw", "name": "gw", "ip": "192.168.1.1" });
        let details = vendor_details(&target, None, None, true);
        assert!(!details.contains_key("public_ip"));
        assert_eq!(details["behind_nat"], json!(true));
        assert_eq!(details["ip"], json!("192.168.1.1"));
    }

    #[test]
    fn vendor_details_modem_extended_fields_only_when_present() {
        let target = json!({
            "type": "uci",
            "name": "Cable Internet",
            "mac": "00:11:22:33:44:55",
            "internet": true,
            "ci_state_table": { "ci_state": "OPERATIONAL" },
            "sys_stats": { "mem_total": 2_147_483_648_u64, "mem_used": 1_073_741_824_u64 },
            "version": "3.1.15",
        });
        let gateway = json!({ "type": "udm", "last_wan_ip": "203.0.113.7" });
        let details = vendor_details(&target, Some(&gateway), None, true);

        assert_eq!(details["public_ip"], json!("203.0.113.7"));
        assert_eq!(details["cable_state"], json!("OPERATIONAL"));
        assert_eq!(details["memory_total_mb"], json!(2048));
        assert_eq!(details["memory_used_mb"], json!(1024));
        assert_eq!(details["memory_free_mb"], json!(1024));
        assert_eq!(details["firmware_version"], json!("3.1.15"));
        // Absent blocks contribute nothing.
        assert!(!details.contains_key("cpu_percent"));
        assert!(!details.contains_key("downlink_mac"));
    }

    #[test]
    fn vendor_details_port_counters_convert() {
        let target = json!({
            "type": "uci",
            "internet": true,
            "port_table": [ { "speed": 1000, "rx_bytes": 3_221_225_472_u64 } ],
        });
        let details = vendor_details(&target, None, None, true);
        assert_eq!(details["port_speed_mbps"], json!(1000));
        assert_eq!(details["rx_bytes_total"], json!(3_221_225_472_u64));
        assert_eq!(details["rx_bytes_gb"], json!("3.00"));
        assert_eq!(details["port_media"], json!(NOT_AVAILABLE));
    }

    // ── Enrichment merge ────────────────────────────────────────────

    fn wan_info(public_ip: Option<&str>, private_ip: Option<&str>) -> WanInfo {
        WanInfo {
            up: true,
            port_status: "connected".to_owned(),
            port_name: "wan2".to_owned(),
            public_ip: public_ip.map(ToOwned::to_owned),
            private_ip: private_ip.map(ToOwned::to_owned),
            behind_nat: public_ip.is_none() && private_ip.is_some(),
            stats: Details::new(),
        }
    }

    #[test]
    fn merge_fills_unset_public_ip_only() {
        let mut details = Details::new();
        details.insert("ping".to_owned(), json!("OK"));
        merge_wan_info(&mut details, &wan_info(Some("198.51.100.4"), None));
        assert_eq!(details["public_ip"], json!("198.51.100.4"));
        assert_eq!(details["gateway_verified"], json!(true));

        let mut details = Details::new();
        details.insert("public_ip".to_owned(), json!("203.0.113.7"));
        merge_wan_info(&mut details, &wan_info(Some("198.51.100.4"), None));
        assert_eq!(details["public_ip"], json!("203.0.113.7"));
    }

    #[test]
    fn merge_behind_nat_flags_instead_of_public_ip() {
        let mut details = Details::new();
        merge_wan_info(&mut details, &wan_info(None, Some("10.83.0.2")));
        assert!(!details.contains_key("public_ip"));
        assert_eq!(details["behind_nat"], json!(true));
        assert_eq!(details["gateway_private_ip"], json!("10.83.0.2"));
    }
}
