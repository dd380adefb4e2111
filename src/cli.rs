//! Command-line interface parsing for the suggestion proxy
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! the configuration the server starts with.

use std::net::SocketAddr;
use std::time::Duration as StdDuration;

use clap::Parser;
use thiserror::Error;

use crate::cache::MaintenanceConfig;
use crate::config::{CredentialSource, ServiceConfig, DEFAULT_CREDENTIAL_ENV};
use crate::data::client::DEFAULT_BASE_URL;

/// Upper bound for hour-valued flags (100 years)
pub const MAX_HOURS: u64 = 100 * 365 * 24;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The maintenance interval must be positive
    #[error("Invalid maintenance interval: must be between 1 and {} hours", MAX_HOURS)]
    InvalidMaintenanceInterval,

    /// The cache TTL does not fit in a duration
    #[error("Invalid cache TTL: '{0}' hours. Must be at most {}", MAX_HOURS)]
    InvalidCacheTtl(u64),

    /// The cache budget must be a positive number of megabytes
    #[error("Invalid cache size limit: '{0}'. Must be greater than 0")]
    InvalidCacheLimit(f64),
}

/// Suggest Proxy - Search suggestions with cached entity enrichment
#[derive(Parser, Debug)]
#[command(name = "suggest-proxy")]
#[command(about = "Search suggestion proxy with cached entity enrichment")]
#[command(version)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "SUGGEST_PROXY_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Base URL of the upstream search API
    #[arg(long, env = "SUGGEST_PROXY_UPSTREAM", default_value = DEFAULT_BASE_URL)]
    pub upstream_url: String,

    /// Environment variable holding the upstream credential, read per request
    #[arg(long, value_name = "VAR", default_value = DEFAULT_CREDENTIAL_ENV)]
    pub credential_env: String,

    /// Lifetime of cached enrichments in hours (0 keeps them until flushed)
    #[arg(long, default_value_t = 24)]
    pub cache_ttl_hours: u64,

    /// Cache size in megabytes above which maintenance flushes it
    #[arg(long, default_value_t = 128.0)]
    pub max_cache_mb: f64,

    /// Hours between cache maintenance passes
    #[arg(long, default_value_t = 24)]
    pub maintenance_interval_hours: u64,
}

/// Configuration derived from CLI arguments for server startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Address to listen on
    pub bind: SocketAddr,
    /// Base URL of the upstream search API
    pub upstream_url: String,
    /// Request handling settings
    pub service: ServiceConfig,
    /// Cache maintenance schedule
    pub maintenance: MaintenanceConfig,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if an interval or limit is out of range
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let interval = match cli.maintenance_interval_hours {
            0 => None,
            hours if hours > MAX_HOURS => None,
            hours => hours.checked_mul(60 * 60).map(StdDuration::from_secs),
        }
        .ok_or(CliError::InvalidMaintenanceInterval)?;

        if cli.max_cache_mb.is_nan() || cli.max_cache_mb <= 0.0 {
            return Err(CliError::InvalidCacheLimit(cli.max_cache_mb));
        }

        let cache_ttl = match cli.cache_ttl_hours {
            0 => None,
            hours => Some(
                i64::try_from(hours)
                    .ok()
                    .filter(|_| hours <= MAX_HOURS)
                    .and_then(chrono::Duration::try_hours)
                    .ok_or(CliError::InvalidCacheTtl(hours))?,
            ),
        };

        Ok(StartupConfig {
            bind: cli.bind,
            upstream_url: cli.upstream_url.clone(),
            service: ServiceConfig {
                credential: CredentialSource::Env(cli.credential_env.clone()),
                cache_ttl,
            },
            maintenance: MaintenanceConfig {
                interval,
                max_megabytes: cli.max_cache_mb,
                enabled: true,
            },
        })
    }
}
