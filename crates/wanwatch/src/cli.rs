use std::path::PathBuf;

use clap::Parser;

/// ISP gateway monitoring daemon.
///
/// Polls every configured provider on an interval, tracks up/down
/// transitions, and posts webhook notifications when availability flips.
#[derive(Debug, Parser)]
#[command(name = "wanwatch", version, about)]
pub struct Cli {
    /// Path to the monitor configuration file.
    #[arg(short, long, default_value = "wanwatch.toml", env = "WANWATCH_CONFIG")]
    pub config: PathBuf,

    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
