// ── Webhook notifications ──
//
// One embed per transition, posted to a Discord-compatible webhook.
// Delivery is fire-and-forget from the poller's perspective: a failed
// post is logged and dropped, never retried, and never blocks or fails
// the poll cycle.

use chrono::Utc;
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use wanwatch_api::TransportConfig;
use wanwatch_api::error::Error;

use crate::extract::Details;
use crate::store::TransitionEvent;

const COLOR_UP: u32 = 0x0048_bb78;
const COLOR_DOWN: u32 = 0x00f5_6565;

/// Maximum detail lines included in an embed description.
const MAX_SUMMARY_FIELDS: usize = 10;

/// Posts transition embeds to a webhook, if one is configured.
pub struct Notifier {
    http: reqwest::Client,
    webhook_url: Option<Url>,
}

impl Notifier {
    pub fn new(webhook_url: Option<Url>, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            webhook_url,
        })
    }

    /// Post a transition notification. Failures are logged and discarded.
    pub async fn notify(&self, event: &TransitionEvent, details: &Details) {
        let Some(url) = &self.webhook_url else {
            debug!(provider = %event.provider, "no webhook configured, skipping notification");
            return;
        };

        let embed = build_embed(event, details);
        let body = json!({ "embeds": [embed] });
        match self.http.post(url.clone()).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(provider = %event.provider, up = event.up, "notification delivered");
            }
            Ok(resp) => {
                warn!(
                    provider = %event.provider,
                    status = resp.status().as_u16(),
                    "webhook rejected notification"
                );
            }
            Err(e) => {
                warn!(provider = %event.provider, error = %e, "webhook delivery failed");
            }
        }
    }
}

/// Build the embed document for a transition.
fn build_embed(event: &TransitionEvent, details: &Details) -> Value {
    let (title, lede, color) = if event.up {
        (
            "✅ Service Restored",
            format!("**{}** is back UP!", event.provider),
            COLOR_UP,
        )
    } else {
        (
            "🚨 Service Down",
            format!("**{}** is DOWN!", event.provider),
            COLOR_DOWN,
        )
    };

    // Detail context accompanies alerts only; recoveries stay terse.
    let mut description = lede;
    if !event.up {
        let summary = details_summary(details);
        if !summary.is_empty() {
            description.push_str("\n\n");
            description.push_str(&summary);
        }
    }

    json!({
        "title": title,
        "description": description,
        "color": color,
        "timestamp": Utc::now().to_rfc3339(),
    })
}

/// Render the first few details as `**key name**: value` lines.
/// Underscores in keys become spaces; string values print unquoted.
fn details_summary(details: &Details) -> String {
    details
        .iter()
        .take(MAX_SUMMARY_FIELDS)
        .map(|(key, value)| {
            let label = key.replace('_', " ");
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("**{label}**: {rendered}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
