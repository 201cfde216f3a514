use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use dotenvy::dotenv;

use crate::engine::DuplicateClockInPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    MySql,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,

    // Employee directory
    pub directory_seed: Option<PathBuf>,
    pub directory_cache_ttl: Duration,

    pub duplicate_clock_in_policy: DuplicateClockInPolicy,

    // Rate limiting
    pub rate_scan_per_min: u32,
    pub rate_api_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source; `from_env` passes the process
    /// environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let server_addr = get("SERVER_ADDR").context("SERVER_ADDR must be set")?;

        let store_backend = match get("STORE_BACKEND").as_deref().unwrap_or("mysql") {
            "mysql" => StoreBackend::MySql,
            "memory" => StoreBackend::Memory,
            other => bail!("STORE_BACKEND must be 'mysql' or 'memory', got '{other}'"),
        };

        let database_url = get("DATABASE_URL");
        if store_backend == StoreBackend::MySql && database_url.is_none() {
            bail!("DATABASE_URL must be set when STORE_BACKEND=mysql");
        }

        let duplicate_clock_in_policy = match get("DUPLICATE_CLOCK_IN_POLICY") {
            Some(raw) => DuplicateClockInPolicy::from_str(&raw).with_context(|| {
                format!(
                    "DUPLICATE_CLOCK_IN_POLICY must be 'latest_wins' or 'earliest_wins', got '{raw}'"
                )
            })?,
            None => DuplicateClockInPolicy::default(),
        };

        Ok(Self {
            server_addr,
            store_backend,
            database_url,
            directory_seed: get("DIRECTORY_SEED").map(PathBuf::from),
            directory_cache_ttl: Duration::from_secs(parse_or(&get, "DIRECTORY_CACHE_TTL_SECS", 30)?),
            duplicate_clock_in_policy,
            rate_scan_per_min: parse_or(&get, "RATE_SCAN_PER_MIN", 120)?,
            rate_api_per_min: parse_or(&get, "RATE_API_PER_MIN", 1000)?,
            api_prefix: get("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            log_dir: get("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
