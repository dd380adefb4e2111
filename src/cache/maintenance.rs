//! Background cache maintenance
//!
//! Periodically purges expired entries and flushes the whole cache once its
//! estimated footprint passes a size budget. There is no partial eviction.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::SuggestionCache;

/// Configuration for the maintenance schedule
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// Interval between maintenance passes
    pub interval: Duration,
    /// Footprint above which the cache is flushed
    pub max_megabytes: f64,
    /// Whether the background task runs at all
    pub enabled: bool,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(24 * 60 * 60), // daily
            max_megabytes: 128.0,
            enabled: true,
        }
    }
}

/// Result of a single maintenance pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaintenanceOutcome {
    /// The cache was over budget and has been cleared
    Flushed { megabytes: f64 },
    /// The cache was within budget and left alone
    Retained { megabytes: f64 },
}

/// Runs one maintenance pass against `cache`
pub fn run_maintenance(cache: &dyn SuggestionCache, max_megabytes: f64) -> MaintenanceOutcome {
    let purged = cache.purge_expired();
    let stats = cache.stats();
    let megabytes = stats.megabytes();

    if megabytes > max_megabytes {
        cache.clear();
        tracing::info!(
            megabytes,
            max_megabytes,
            keys = stats.keys,
            purged,
            "Cache over budget, flushed"
        );
        MaintenanceOutcome::Flushed { megabytes }
    } else {
        tracing::info!(
            megabytes,
            max_megabytes,
            keys = stats.keys,
            hits = stats.hits,
            misses = stats.misses,
            purged,
            "Cache within budget"
        );
        MaintenanceOutcome::Retained { megabytes }
    }
}

/// Handle for controlling the background maintenance task
pub struct MaintenanceHandle {
    /// Flag to signal shutdown
    shutdown_tx: mpsc::Sender<()>,
}

impl MaintenanceHandle {
    /// Spawns the maintenance task on the current tokio runtime
    ///
    /// The first pass runs one full interval after spawning.
    pub fn spawn(cache: Arc<dyn SuggestionCache>, config: MaintenanceConfig) -> Self {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        if config.enabled {
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(config.interval);
                // Skip the first tick (immediate)
                interval.tick().await;

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            run_maintenance(cache.as_ref(), config.max_megabytes);
                        }
                        _ = shutdown_rx.recv() => {
                            tracing::debug!("Cache maintenance stopped");
                            break;
                        }
                    }
                }
            });
        }

        Self { shutdown_tx }
    }

    /// Shuts down the background maintenance task
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}
