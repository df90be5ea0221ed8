//! Server configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::DEFAULT_CAPACITY;

pub const DEFAULT_STROKE_UPSTREAM: &str =
    "https://829091573dd46381a321-9e8a43b8d3436eaf4353af683c892840.ssl.cf1.rackcdn.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Root the storage keys are resolved against.
    pub data_dir: PathBuf,
    pub port: u16,
    /// Base URL stroke-order JSON is proxied from.
    pub stroke_upstream: String,
    pub entry_cache_capacity: usize,
    pub list_cache_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            port: 3000,
            stroke_upstream: DEFAULT_STROKE_UPSTREAM.to_string(),
            entry_cache_capacity: DEFAULT_CAPACITY,
            list_cache_ttl: Duration::from_secs(3600),
        }
    }
}

impl ServerConfig {
    /// `DICT_DATA_DIR`, `PORT`, `STROKE_UPSTREAM`, `ENTRY_CACHE_CAPACITY`,
    /// `LIST_CACHE_TTL_SECS`. Unset or unparsable values keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |name: &str| lookup(name).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            data_dir: lookup("DICT_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            port: parsed("PORT").and_then(|p| u16::try_from(p).ok()).unwrap_or(defaults.port),
            stroke_upstream: lookup("STROKE_UPSTREAM")
                .map(|u| u.trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty())
                .unwrap_or(defaults.stroke_upstream),
            entry_cache_capacity: parsed("ENTRY_CACHE_CAPACITY")
                .and_then(|c| usize::try_from(c).ok())
                .filter(|c| *c > 0)
                .unwrap_or(defaults.entry_cache_capacity),
            list_cache_ttl: parsed("LIST_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.list_cache_ttl),
        }
    }
}
