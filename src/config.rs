//! Runtime configuration, read from the environment
//!
//! | Variable             | Default                |
//! |----------------------|------------------------|
//! | `ICURL_ADDR`         | `127.0.0.1:3000`       |
//! | `ICURL_DATA_DIR`     | `~/.icurl`             |
//! | `ICURL_LOG_DIR`      | the data directory     |
//! | `ICURL_TIMEOUT_SECS` | unset, no timeout      |
//! | `ICURL_LOG_STDERR`   | unset, log to file     |

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::constants::{DATA_DIR_NAME, DEFAULT_BIND_ADDR};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Upstream timeout for forwarded requests
    pub timeout: Option<Duration>,
    pub log_to_stderr: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_dir = lookup("ICURL_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let log_dir = lookup("ICURL_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.clone());

        let timeout = match lookup("ICURL_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| anyhow!("ICURL_TIMEOUT_SECS must be a whole number, got '{}'", raw))?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Config {
            bind_addr: lookup("ICURL_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            data_dir,
            log_dir,
            timeout,
            log_to_stderr: lookup("ICURL_LOG_STDERR").is_some_and(|v| !v.is_empty() && v != "0"),
        })
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}
