// ── Hub gateway WAN enrichment ──
//
// Providers checked over plain HTTP can't see the upstream picture: which
// physical WAN port carries them, whether that port is up, what public IP
// the gateway holds. When a hub controller is configured, this module
// asks the gateway directly and folds the answer into the provider's
// details. Everything here is best-effort; a failure to enrich never
// fails the check.

use serde_json::Value;
use tracing::debug;

use wanwatch_api::{ControllerClient, TransportConfig, first_success, site_device_endpoint};

use crate::config::HubConfig;
use crate::extract::{self, Details};
use crate::ip;

/// The gateway's view of one WAN port.
#[derive(Debug, Clone)]
pub struct WanInfo {
    pub up: bool,
    pub port_status: String,
    pub port_name: String,
    pub public_ip: Option<String>,
    pub private_ip: Option<String>,
    pub behind_nat: bool,
    pub stats: Details,
}

/// Fetch the gateway's WAN info for a named port from the hub controller.
///
/// Returns `None` when the hub is unreachable, the gateway is not in the
/// device list, or the port cannot be resolved.
pub async fn gateway_wan_info(
    hub: &HubConfig,
    transport: &TransportConfig,
    wan_port: &str,
) -> Option<WanInfo> {
    let client = match ControllerClient::new(hub.api_key.clone(), transport) {
        Ok(client) => client,
        Err(e) => {
            debug!(error = %e, "could not build hub client");
            return None;
        }
    };

    let endpoint = site_device_endpoint(&hub.site);
    let urls: Vec<String> = hub.bases.iter().map(|b| format!("{b}{endpoint}")).collect();
    let client = &client;
    let doc = match first_success(urls, |url| async move { client.get_json(&url).await }).await {
        Ok(doc) => doc,
        Err(e) => {
            debug!(error = %e, "hub device fetch failed");
            return None;
        }
    };

    let devices = extract::device_collection(&doc);
    let gateway = devices.iter().find(|d| is_gateway(d))?;
    build_wan_info(gateway, wan_port)
}

fn is_gateway(device: &Value) -> bool {
    let t = device
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase();
    t.contains("gw") || t.contains("udm") || t.contains("udr")
}

/// `wan` and `wan1` name the same physical port on most gateways.
fn port_names_match(network_name: &str, wan_port: &str) -> bool {
    let name = network_name.to_lowercase();
    let port = wan_port.to_lowercase();
    name == port || (matches!(name.as_str(), "wan" | "wan1") && matches!(port.as_str(), "wan" | "wan1"))
}

/// The `last_wan_interfaces` key for a port name: `WAN` for the primary
/// port, `WAN{n}` for the rest.
fn interface_key(wan_port: &str) -> String {
    let lower = wan_port.to_lowercase();
    if lower == "wan" || lower == "wan1" {
        "WAN".to_owned()
    } else {
        lower.to_uppercase()
    }
}

/// Resolve one WAN port's status from a gateway device document.
///
/// Pure so the resolution rules are testable without a controller. Pulls
/// from three views when present: the matching `port_table` entry, the
/// direct `wan`/`wan2` object, and the `last_wan_interfaces` entry, which
/// is preferred for addressing because the direct objects go stale when a
/// port flaps.
pub fn build_wan_info(gateway: &Value, wan_port: &str) -> Option<WanInfo> {
    let port_entry = gateway
        .get("port_table")
        .and_then(Value::as_array)
        .and_then(|ports| {
            ports.iter().find(|p| {
                p.get("network_name")
                    .and_then(Value::as_str)
                    .is_some_and(|n| port_names_match(n, wan_port))
            })
        });

    let direct = {
        let lower = wan_port.to_lowercase();
        let swap = match lower.as_str() {
            "wan1" => "wan",
            "wan" => "wan1",
            _ => "",
        };
        gateway
            .get(&lower)
            .or_else(|| gateway.get(swap))
            .filter(|v| v.is_object())
    };

    let interface = gateway
        .pointer(&format!("/last_wan_interfaces/{}", interface_key(wan_port)))
        .filter(|v| v.is_object());

    if port_entry.is_none() && direct.is_none() && interface.is_none() {
        return None;
    }

    // Addressing: the interface record first, then the direct object,
    // then the port entry, then the device-level fallback for the
    // primary port.
    let mut raw_ip = [interface, direct, port_entry]
        .into_iter()
        .flatten()
        .find_map(|v| v.get("ip").and_then(Value::as_str));
    if raw_ip.is_none() && matches!(wan_port.to_lowercase().as_str(), "wan" | "wan1") {
        raw_ip = gateway.get("last_wan_ip").and_then(Value::as_str);
    }

    let (public_ip, private_ip, behind_nat) = match raw_ip {
        Some(ip) if ip::is_public(ip) => (Some(ip.to_owned()), None, false),
        Some(ip) if ip::is_private(ip) => (None, Some(ip.to_owned()), true),
        _ => (None, None, false),
    };

    let up = direct
        .and_then(|w| w.get("up").and_then(Value::as_bool))
        .or_else(|| port_entry.and_then(|p| p.get("up").and_then(Value::as_bool)))
        .unwrap_or_else(|| gateway.get("state").and_then(Value::as_i64) == Some(1));

    let port_status = if up { "connected" } else { "disconnected" };
    let port_name = port_entry
        .and_then(|p| p.get("ifname").and_then(Value::as_str))
        .unwrap_or(wan_port)
        .to_owned();

    let mut stats = Details::new();
    if let Some(port) = port_entry {
        extract::put(&mut stats, "port_speed_mbps", port.get("speed"));
        extract::put(&mut stats, "port_media", port.get("media"));
        extract::put(&mut stats, "port_full_duplex", port.get("full_duplex"));
        extract::put(&mut stats, "port_ifname", port.get("ifname"));
        extract::put(&mut stats, "port_mac", port.get("mac"));
        for (field, key) in [("rx_bytes", "rx_bytes_gb"), ("tx_bytes", "tx_bytes_gb")] {
            if let Some(gb) = port.get(field).and_then(|v| extract::bytes_to_gb(v)) {
                stats.insert(key.to_owned(), gb);
            }
        }
        extract::put(&mut stats, "rx_packets", port.get("rx_packets"));
        extract::put(&mut stats, "tx_packets", port.get("tx_packets"));
        extract::put(&mut stats, "rx_errors", port.get("rx_errors"));
        extract::put(&mut stats, "tx_errors", port.get("tx_errors"));
        extract::put(&mut stats, "rx_dropped", port.get("rx_dropped"));
        extract::put(&mut stats, "tx_dropped", port.get("tx_dropped"));
        // Gateways report realtime throughput as `rx_rate`; some firmware
        // lines use `rx_bytes-r` instead.
        for (field, alt, key) in [
            ("rx_rate", "rx_bytes-r", "rx_rate_mbps"),
            ("tx_rate", "tx_bytes-r", "tx_rate_mbps"),
        ] {
            let rate = port.get(field).or_else(|| port.get(alt));
            if let Some(mbps) = rate.and_then(|v| extract::rate_to_mbps(v)) {
                stats.insert(key.to_owned(), mbps);
            }
        }
        for (field, key) in [
            ("rx_rate-max", "rx_rate_max_mbps"),
            ("tx_rate-max", "tx_rate_max_mbps"),
        ] {
            if let Some(mbps) = port.get(field).and_then(|v| extract::rate_to_mbps(v)) {
                stats.insert(key.to_owned(), mbps);
            }
        }
    }

    // Addressing metadata lives on the port entry; the interface record
    // is a fallback.
    for source in [port_entry, interface].into_iter().flatten() {
        if !stats.contains_key("netmask") {
            extract::put(&mut stats, "netmask", source.get("netmask"));
        }
        if !stats.contains_key("dns_servers") {
            if let Some(dns) = source.get("dns").and_then(Value::as_array) {
                let joined = dns
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                if !joined.is_empty() {
                    stats.insert("dns_servers".to_owned(), Value::String(joined));
                }
            }
        }
    }

    Some(WanInfo {
        up,
        port_status: port_status.to_owned(),
        port_name,
        public_ip,
        private_ip,
        behind_nat,
        stats,
    })
}
