// ── Best-effort field extraction from vendor status payloads ──
//
// Modem status endpoints disagree on everything: field names, nesting,
// boolean encodings. Instead of ad hoc existence checks scattered through
// the checker, each known payload shape gets one extractor block: a pure
// function `(document, details) -> ()` that checks for its expected
// sub-structure and contributes fields only when it is present. Blocks
// are independent and order-insensitive, except the public-IP scan which
// runs last and only fills `public_ip` when nothing set it earlier.

use chrono::DateTime;
use indexmap::IndexMap;
use serde_json::Value;

/// Ordered details mapping carried in every check result.
pub type Details = IndexMap<String, Value>;

/// Sentinel for a field whose block was present but whose value was not.
pub const NOT_AVAILABLE: &str = "N/A";

type ExtractorFn = fn(&Value, &mut Details);

/// The extractor table. Names are for logging and tests only.
pub const EXTRACTORS: &[(&str, ExtractorFn)] = &[
    ("device_block", extract_device_block),
    ("signal_5g", extract_signal_5g),
    ("signal_generic", extract_signal_generic),
    ("time_block", extract_time_block),
    ("flat_status", extract_flat_status),
    ("flat_device", extract_flat_device),
    ("public_ip_scan", extract_public_ip),
];

/// Run every extractor block against the document.
pub fn run_extractors(doc: &Value, details: &mut Details) {
    for (_, extractor) in EXTRACTORS {
        extractor(doc, details);
    }
}

/// Extract the configured signal keys verbatim, with case-insensitive
/// fallback (exact, then lowercase, then uppercase) and the
/// "not available" sentinel for absent keys.
pub fn extract_signal_keys(doc: &Value, keys: &[String], details: &mut Details) {
    for key in keys {
        let value = lookup_key_insensitive(doc, key)
            .cloned()
            .unwrap_or_else(na);
        details.insert(key.clone(), value);
    }
}

// ── Lookup helpers ──────────────────────────────────────────────────

/// Case-insensitive top-level key lookup: exact, lowercase, uppercase.
pub fn lookup_key_insensitive<'a>(doc: &'a Value, key: &str) -> Option<&'a Value> {
    doc.get(key)
        .or_else(|| doc.get(key.to_lowercase()))
        .or_else(|| doc.get(key.to_uppercase()))
}

/// Resolve a nested key path through the document.
pub fn get_path<'a>(doc: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = doc;
    for key in path {
        current = current.get(key)?;
    }
    Some(current)
}

/// Map a resolved health value to a boolean using the fixed truthy set:
/// `true`, `"true"`, `"connected"`, `"2"`.
pub fn health_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.as_str(), "true" | "connected" | "2"),
        _ => false,
    }
}

/// Humanize an uptime in seconds as `{d}d {h}h {m}m`.
pub fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    format!("{days}d {hours}h {minutes}m")
}

/// Convert an epoch-seconds value to an ISO-8601 timestamp.
pub fn epoch_to_iso(secs: i64) -> Option<String> {
    Some(DateTime::from_timestamp(secs, 0)?.to_rfc3339())
}

/// Unwrap a controller response into a device collection.
///
/// Accepts an array at top level, an array nested under any of the known
/// keys, or -- if nothing matches -- the whole payload as a single device.
pub fn device_collection(doc: &Value) -> Vec<&Value> {
    if let Some(arr) = doc.as_array() {
        if !arr.is_empty() {
            return arr.iter().collect();
        }
    }
    for key in ["data", "devices", "gateways"] {
        if let Some(arr) = doc.get(key).and_then(Value::as_array) {
            if !arr.is_empty() {
                return arr.iter().collect();
            }
        }
    }
    vec![doc]
}

// ── Unit conversions ────────────────────────────────────────────────

/// Byte counter to a `"12.34"` gigabyte string.
pub fn bytes_to_gb(value: &Value) -> Option<Value> {
    let bytes = value.as_f64()?;
    Some(Value::String(format!(
        "{:.2}",
        bytes / 1024.0 / 1024.0 / 1024.0
    )))
}

/// Bytes-per-second rate to a `"12.34"` megabit-per-second string.
pub fn rate_to_mbps(value: &Value) -> Option<Value> {
    let bps = value.as_f64()?;
    Some(Value::String(format!("{:.2}", bps / 1024.0 / 1024.0 * 8.0)))
}

/// Byte counter to rounded whole megabytes.
#[allow(clippy::cast_possible_truncation)]
pub fn bytes_to_mb(bytes: f64) -> Value {
    Value::from((bytes / 1024.0 / 1024.0).round() as i64)
}

pub(crate) fn na() -> Value {
    Value::String(NOT_AVAILABLE.to_owned())
}

pub(crate) fn put(details: &mut Details, key: &str, value: Option<&Value>) {
    if let Some(v) = value {
        details.insert(key.to_owned(), v.clone());
    }
}

pub(crate) fn put_or_na(details: &mut Details, key: &str, value: Option<&Value>) {
    details.insert(key.to_owned(), value.cloned().unwrap_or_else(na));
}

pub(crate) fn put_bool_or_false(details: &mut Details, key: &str, value: Option<&Value>) {
    let v = value.and_then(Value::as_bool).unwrap_or(false);
    details.insert(key.to_owned(), Value::Bool(v));
}

/// JavaScript-style truthiness, for vendors that encode flags loosely.
fn loosely_true(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "false" && s != "0",
        Value::Null => false,
        _ => true,
    }
}

// ── Extractor blocks ────────────────────────────────────────────────

/// Nested `device` identity block (vendor-T shape).
fn extract_device_block(doc: &Value, details: &mut Details) {
    let Some(dev) = doc.get("device").filter(|d| d.is_object()) else {
        return;
    };
    put_or_na(details, "device_model", dev.get("model"));
    put_or_na(details, "device_manufacturer", dev.get("manufacturer"));
    put_or_na(details, "device_serial", dev.get("serial"));
    put_or_na(details, "device_mac", dev.get("macId"));
    put_or_na(details, "firmware_version", dev.get("softwareVersion"));
    put_or_na(details, "hardware_version", dev.get("hardwareVersion"));
    put_or_na(
        details,
        "device_name",
        dev.get("name").or_else(|| dev.get("friendlyName")),
    );
    put_or_na(details, "update_state", dev.get("updateState"));
    put_bool_or_false(details, "is_mesh_supported", dev.get("isMeshSupported"));
}

/// Nested `signal.5g` block.
fn extract_signal_5g(doc: &Value, details: &mut Details) {
    let Some(sig) = doc.pointer("/signal/5g") else {
        return;
    };
    put_or_na(details, "signal_bars", sig.get("bars"));
    put_or_na(details, "signal_rsrp", sig.get("rsrp"));
    put_or_na(details, "signal_rsrq", sig.get("rsrq"));
    put_or_na(details, "signal_rssi", sig.get("rssi"));
    put_or_na(details, "signal_sinr", sig.get("sinr"));

    let bands = match sig.get("bands") {
        Some(Value::Array(items)) => Some(Value::String(
            items
                .iter()
                .map(|b| b.as_str().map_or_else(|| b.to_string(), ToOwned::to_owned))
                .collect::<Vec<_>>()
                .join(", "),
        )),
        other => other.cloned(),
    };
    put_or_na(details, "signal_bands", bands.as_ref());
    put_or_na(details, "signal_cid", sig.get("cid"));
    put_or_na(details, "signal_gnb_id", sig.get("gNBID"));
    put_or_na(details, "signal_antenna", sig.get("antennaUsed"));
}

/// Nested `signal.generic` connection block.
fn extract_signal_generic(doc: &Value, details: &mut Details) {
    let Some(generic) = doc.pointer("/signal/generic") else {
        return;
    };
    put_or_na(details, "apn", generic.get("apn"));
    put_bool_or_false(details, "has_ipv6", generic.get("hasIPv6"));
    put_or_na(details, "registration_status", generic.get("registration"));
    put_bool_or_false(details, "is_roaming", generic.get("roaming"));
}

/// Nested `time` block: uptime and clock information.
fn extract_time_block(doc: &Value, details: &mut Details) {
    let Some(time) = doc.get("time").filter(|t| t.is_object()) else {
        return;
    };
    put_or_na(details, "uptime_seconds", time.get("upTime"));
    if let Some(secs) = time.get("upTime").and_then(Value::as_u64) {
        details.insert(
            "uptime_formatted".to_owned(),
            Value::String(format_uptime(secs)),
        );
    }
    if let Some(iso) = time
        .get("localTime")
        .and_then(Value::as_i64)
        .and_then(epoch_to_iso)
    {
        details.insert("local_time".to_owned(), Value::String(iso));
    }
    put_or_na(details, "timezone", time.get("localTimeZone"));
    if let Some(dst) = time.get("daylightSavings") {
        put_bool_or_false(details, "daylight_savings", dst.get("isUsed"));
    }
}

/// Flat top-level status fields (vendor-A shape): `ConnUP`, `RSRP`, ...
fn extract_flat_status(doc: &Value, details: &mut Details) {
    if let Some(conn) = doc.get("ConnUP") {
        let status = if loosely_true(conn) { "Connected" } else { "Disconnected" };
        details.insert("connection_status".to_owned(), Value::String(status.to_owned()));
    }
    put(details, "signal_rsrp", doc.get("RSRP"));
    put(details, "signal_rsrq", doc.get("RSRQ"));
    put(details, "signal_sinr", doc.get("SINR"));
    put(details, "signal_band", doc.get("Band"));
}

/// Flat top-level device fields (vendor-A shape).
fn extract_flat_device(doc: &Value, details: &mut Details) {
    put(details, "device_type", doc.get("DeviceType"));
    put(details, "device_model", doc.get("Model"));
    put(details, "firmware_version", doc.get("Firmware"));
    put(details, "device_serial", doc.get("Serial"));
}

/// Fields where modems have been seen to expose their public address.
const PUBLIC_IP_FIELDS: &[&str] = &[
    "publicIp",
    "public_ip",
    "wanIp",
    "wan_ip",
    "externalIp",
    "external_ip",
    "internetIp",
    "internet_ip",
    "ipv4",
    "ipAddress",
    "ip_address",
    "WanIP",
    "WANIP",
    "PublicIP",
    "PUBLICIP",
];

/// Scan for a public IP across known field names and sub-objects.
///
/// Only fills `public_ip` when no earlier block set it, and never accepts
/// a private-range address.
fn extract_public_ip(doc: &Value, details: &mut Details) {
    let already_set = details
        .get("public_ip")
        .and_then(Value::as_str)
        .is_some_and(|ip| ip != NOT_AVAILABLE);
    if already_set {
        return;
    }

    let scopes = [
        Some(doc),
        doc.get("device"),
        doc.get("signal"),
        doc.get("connection"),
    ];
    for scope in scopes.into_iter().flatten() {
        for field in PUBLIC_IP_FIELDS {
            if let Some(ip) = scope.get(*field).and_then(Value::as_str) {
                if crate::ip::is_public(ip) {
                    details.insert("public_ip".to_owned(), Value::String(ip.to_owned()));
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn signal_keys_fall_back_across_cases() {
        let doc = json!({ "RSRP": -90, "sinr": 12 });
        let mut details = Details::new();
        extract_signal_keys(
            &doc,
            &["rsrp".to_owned(), "SINR".to_owned(), "rsrq".to_owned()],
            &mut details,
        );

        assert_eq!(details["rsrp"], json!(-90));
        assert_eq!(details["SINR"], json!(12));
        assert_eq!(details["rsrq"], json!(NOT_AVAILABLE));
    }

    #[test]
    fn flat_status_maps_connection_boolean() {
        let mut details = Details::new();
        extract_flat_status(&json!({ "ConnUP": true, "RSRP": -90 }), &mut details);
        assert_eq!(details["connection_status"], json!("Connected"));
        assert_eq!(details["signal_rsrp"], json!(-90));

        let mut details = Details::new();
        extract_flat_status(&json!({ "ConnUP": false }), &mut details);
        assert_eq!(details["connection_status"], json!("Disconnected"));
    }

    #[test]
    fn blocks_skip_absent_substructures() {
        let mut details = Details::new();
        run_extractors(&json!({ "unrelated": 1 }), &mut details);
        assert!(details.is_empty());
    }

    #[test]
    fn device_block_defaults_missing_fields_to_sentinel() {
        let mut details = Details::new();
        extract_device_block(
            &json!({ "device": { "model": "ARC-XCI55AX", "friendlyName": "Gateway" } }),
            &mut details,
        );
        assert_eq!(details["device_model"], json!("ARC-XCI55AX"));
        assert_eq!(details["device_name"], json!("Gateway"));
        assert_eq!(details["device_serial"], json!(NOT_AVAILABLE));
        assert_eq!(details["is_mesh_supported"], json!(false));
    }

    #[test]
    fn signal_bands_joined_when_array() {
        let mut details = Details::new();
        extract_signal_5g(
            &json!({ "signal": { "5g": { "bands": ["n41", "n71"], "rsrp": -95 } } }),
            &mut details,
        );
        assert_eq!(details["signal_bands"], json!("n41, n71"));
        assert_eq!(details["signal_rsrp"], json!(-95));
    }

    #[test]
    fn time_block_formats_uptime_and_local_time() {
        let mut details = Details::new();
        extract_time_block(
            &json!({ "time": { "upTime": 90_061, "localTime": 1_700_000_000 } }),
            &mut details,
        );
        assert_eq!(details["uptime_formatted"], json!("1d 1h 1m"));
        assert!(
            details["local_time"]
                .as_str()
                .is_some_and(|t| t.starts_with("2023-11-14T"))
        );
    }

    #[test]
    fn public_ip_scan_rejects_private_and_respects_existing() {
        let mut details = Details::new();
        extract_public_ip(
            &json!({ "wanIp": "192.168.0.20", "device": { "publicIp": "203.0.113.7" } }),
            &mut details,
        );
        assert_eq!(details["public_ip"], json!("203.0.113.7"));

        // An earlier block's value wins.
        let mut details = Details::new();
        details.insert("public_ip".to_owned(), json!("8.8.8.8"));
        extract_public_ip(&json!({ "wanIp": "203.0.113.7" }), &mut details);
        assert_eq!(details["public_ip"], json!("8.8.8.8"));

        // The sentinel counts as unset.
        let mut details = Details::new();
        details.insert("public_ip".to_owned(), json!(NOT_AVAILABLE));
        extract_public_ip(&json!({ "wanIp": "203.0.113.7" }), &mut details);
        assert_eq!(details["public_ip"], json!("203.0.113.7"));
    }

    #[test]
    fn health_truthy_literal_set() {
        for v in [json!(true), json!("true"), json!("connected"), json!("2")] {
            assert!(health_truthy(&v), "{v}");
        }
        for v in [json!(false), json!("up"), json!(2), json!(null), json!("TRUE")] {
            assert!(!health_truthy(&v), "{v}");
        }
    }

    #[test]
    fn path_resolution_walks_nesting() {
        let doc = json!({ "Global": { "net_status": "2" } });
        let path = vec!["Global".to_owned(), "net_status".to_owned()];
        assert_eq!(get_path(&doc, &path), Some(&json!("2")));
        assert!(health_truthy(get_path(&doc, &path).unwrap_or(&Value::Null)));
        assert_eq!(get_path(&doc, &["missing".to_owned()]), None);
    }
}
