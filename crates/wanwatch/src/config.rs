// Monitor configuration loading: TOML file merged with `WANWATCH_`
// environment overrides. The decoded types live in wanwatch-core; this
// module only does the disk and env plumbing.

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};

use wanwatch_core::MonitorConfig;

use crate::error::DaemonError;

/// Load the monitor configuration from `path` plus environment overrides.
pub fn load(path: &Path) -> Result<MonitorConfig, DaemonError> {
    let figment = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("WANWATCH_"));

    let config: MonitorConfig = figment.extract()?;
    Ok(config)
}
