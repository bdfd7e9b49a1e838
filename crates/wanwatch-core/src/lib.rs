// wanwatch-core: probing, reconciliation, and transition engine.
//
// The daemon binary hands this crate a decoded provider list and it
// produces a status map plus notification calls. How the map is served
// or how providers were loaded is not this crate's concern.

pub mod checker;
pub mod config;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod ip;
pub mod notify;
pub mod poller;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use checker::{CheckResult, ProviderChecker};
pub use config::{HubConfig, MonitorConfig, ProviderConfig, ProviderKind};
pub use error::CoreError;
pub use extract::Details;
pub use notify::Notifier;
pub use poller::Poller;
pub use store::{PublicStatus, StatusRecord, StatusStore, TransitionEvent};
