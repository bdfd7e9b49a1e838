// wanwatch-api: HTTP transport and vendor-controller access for wanwatch.

pub mod candidate;
pub mod controller;
pub mod error;
pub mod probe;
pub mod transport;

pub use candidate::{candidate_bases, first_success};
pub use controller::{ControllerClient, site_device_endpoint};
pub use error::Error;
pub use probe::ProbeClient;
pub use transport::{TlsMode, TransportConfig};
