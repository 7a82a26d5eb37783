//! Process configuration, read once from the environment at startup.
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://www.omdbapi.com";
pub const DEFAULT_POSTER_URL: &str = "http://img.omdbapi.com";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_PUBLIC_DIR: &str = "public";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// OMDb credential. `None` keeps the server up but every upstream call fails with a config error.
    pub api_key: Option<String>,
    pub api_url: String,
    pub poster_url: String,
    pub port: u16,
    pub public_dir: String,
    pub upstream_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            poster_url: DEFAULT_POSTER_URL.to_string(),
            port: DEFAULT_PORT,
            public_dir: DEFAULT_PUBLIC_DIR.to_string(),
            upstream_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source so tests never touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match non_empty("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT must be a valid port number, got '{raw}'"))?,
            None => DEFAULT_PORT,
        };
        let timeout_secs = match non_empty("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .with_context(|| {
                    format!("UPSTREAM_TIMEOUT_SECS must be a positive number of seconds, got '{raw}'")
                })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key: non_empty("OMDB_API_KEY"),
            api_url: trim_base(non_empty("OMDB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into())),
            poster_url: trim_base(
                non_empty("OMDB_POSTER_URL").unwrap_or_else(|| DEFAULT_POSTER_URL.into()),
            ),
            port,
            public_dir: non_empty("PUBLIC_DIR").unwrap_or_else(|| DEFAULT_PUBLIC_DIR.into()),
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
