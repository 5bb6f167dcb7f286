mod config;
pub use config::{get_base_dir, get_default_config_file, Config, LedgerConfig};

#[cfg(test)]
pub mod tests;

pub mod delegate;
pub mod serde_utils;
pub mod store;
pub mod types;

mod errors;
pub use errors::{Error, Result};

use git_version::git_version;
use std::time;

const GIT_VERSION: &str = git_version!(fallback = "unknown");

pub fn get_git_version() -> &'static str {
    GIT_VERSION
}

pub fn now_timestamp_as_millis_u64() -> u64 {
    time::SystemTime::now()
        .duration_since(time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
