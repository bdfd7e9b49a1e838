// ── Status store ──
//
// One record per provider, replaced wholesale each cycle (details never
// merge across cycles -- a field absent from the new result disappears).
// Readers get lock-free snapshots via `ArcSwap`; the poller is the only
// writer.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::checker::CheckResult;
use crate::extract::Details;

/// Latest known state for one provider.
#[derive(Debug, Clone, Serialize)]
pub struct StatusRecord {
    pub up: bool,
    pub details: Details,
    pub last_check: DateTime<Utc>,
}

/// Redacted view: availability and freshness, no detail fields.
#[derive(Debug, Clone, Serialize)]
pub struct PublicStatus {
    pub up: bool,
    pub last_check: DateTime<Utc>,
}

/// An up/down edge observed when recording a check result.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionEvent {
    pub provider: String,
    pub previous_up: bool,
    pub up: bool,
}

type StatusMap = IndexMap<String, Arc<StatusRecord>>;

/// Shared provider-status map.
pub struct StatusStore {
    map: ArcSwap<StatusMap>,
}

impl StatusStore {
    /// Seed the store with an up placeholder per provider, so the first
    /// real check can only notify when something is actually down.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let now = Utc::now();
        let map: StatusMap = names
            .into_iter()
            .map(|name| {
                (
                    name.into(),
                    Arc::new(StatusRecord {
                        up: true,
                        details: Details::new(),
                        last_check: now,
                    }),
                )
            })
            .collect();
        Self {
            map: ArcSwap::from_pointee(map),
        }
    }

    /// Record a check result, returning the transition event when the
    /// availability flipped.
    pub fn record(&self, provider: &str, result: &CheckResult) -> Option<TransitionEvent> {
        let current = self.map.load();
        // Unknown providers baseline as up, same as the seeded placeholder.
        let previous_up = current.get(provider).is_none_or(|r| r.up);

        let mut next: StatusMap = (**current).clone();
        next.insert(
            provider.to_owned(),
            Arc::new(StatusRecord {
                up: result.up,
                details: result.details.clone(),
                last_check: Utc::now(),
            }),
        );
        self.map.store(Arc::new(next));

        (previous_up != result.up).then(|| TransitionEvent {
            provider: provider.to_owned(),
            previous_up,
            up: result.up,
        })
    }

    /// Latest record for one provider.
    pub fn get(&self, provider: &str) -> Option<Arc<StatusRecord>> {
        self.map.load().get(provider).cloned()
    }

    /// Snapshot of every provider's full record.
    pub fn snapshot(&self) -> Arc<StatusMap> {
        self.map.load_full()
    }

    /// Snapshot of every provider, details redacted.
    pub fn public_view(&self) -> IndexMap<String, PublicStatus> {
        self.map
            .load()
            .iter()
            .map(|(name, record)| {
                (
                    name.clone(),
                    PublicStatus {
                        up: record.up,
                        last_check: record.last_check,
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn result(up: bool, details: Details) -> CheckResult {
        CheckResult { up, details }
    }

    #[test]
    fn seeded_providers_start_up() {
        let store = StatusStore::new(["alpha", "beta"]);
        assert!(store.get("alpha").expect("seeded").up);
        assert_eq!(store.snapshot().len(), 2);
        assert!(store.get("alpha").expect("seeded").details.is_empty());
    }

    #[test]
    fn transitions_fire_exactly_on_edges() {
        let store = StatusStore::new(["isp"]);
        let mut transitions = Vec::new();
        for up in [true, true, false, false, true] {
            if let Some(t) = store.record("isp", &result(up, Details::new())) {
                transitions.push((t.previous_up, t.up));
            }
        }
        assert_eq!(transitions, vec![(true, false), (false, true)]);
    }

    #[test]
    fn first_check_down_notifies_against_placeholder() {
        let store = StatusStore::new(["isp"]);
        let t = store
            .record("isp", &result(false, Details::new()))
            .expect("transition");
        assert!(t.previous_up);
        assert!(!t.up);
    }

    #[test]
    fn details_replace_never_merge() {
        let store = StatusStore::new(["isp"]);
        let mut first = Details::new();
        first.insert("a".to_owned(), json!(1));
        first.insert("b".to_owned(), json!(2));
        store.record("isp", &result(true, first));

        let mut second = Details::new();
        second.insert("a".to_owned(), json!(1));
        store.record("isp", &result(true, second));

        let record = store.get("isp").expect("recorded");
        assert_eq!(record.details.len(), 1);
        assert!(!record.details.contains_key("b"));
    }

    #[test]
    fn public_view_redacts_details() {
        let store = StatusStore::new(["isp"]);
        let mut details = Details::new();
        details.insert("public_ip".to_owned(), json!("203.0.113.7"));
        store.record("isp", &result(true, details));

        let view = store.public_view();
        let rendered = serde_json::to_string(&view).expect("serializes");
        assert!(!rendered.contains("203.0.113.7"));
        assert!(view["isp"].up);
    }
}
