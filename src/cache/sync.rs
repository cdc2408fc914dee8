//! # Cache Reconciliation
//!
//! One-time startup synchronization between the primary store and the
//! cache, invoked after both connections are established.
//!
//! A cache that already holds product entries is trusted as-is; no
//! incremental diffing happens at startup. An empty cache is treated as
//! cold: the namespace is cleared outright (in case a stale partial index
//! survived), every product is loaded from the primary store, and the
//! search index is recreated. Any failure is absorbed - the process keeps
//! serving primary-store-backed reads rather than refusing to start.

use tracing::{debug, info, warn};

use crate::cache::{CacheError, CacheHealth, CacheStore};
use crate::error::StoreError;
use crate::logging::log_cache_operation;
use crate::store::ProductStore;

#[derive(Debug, PartialEq, Eq)]
enum ReconcileOutcome {
    /// Entries already present; nothing written
    AlreadyWarm,
    /// Cold cache rebuilt with this many entries
    Rebuilt(usize),
}

#[derive(Debug, thiserror::Error)]
enum ReconcileError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Reconcile the cache against the primary store.
///
/// Health transitions: a successful cold rebuild proves connectivity and
/// flips the flag healthy; a warm cache leaves the flag untouched; any
/// failure flips it unhealthy.
pub async fn reconcile(
    products: &dyn ProductStore,
    cache: &dyn CacheStore,
    health: &CacheHealth,
) {
    match try_reconcile(products, cache).await {
        Ok(ReconcileOutcome::AlreadyWarm) => {
            debug!("Cache already warm; reconciliation skipped");
        }
        Ok(ReconcileOutcome::Rebuilt(count)) => {
            health.set_healthy(true);
            info!(entries = count, "🗄️ Cache rebuilt from the primary store");
        }
        Err(err) => {
            health.set_healthy(false);
            log_cache_operation("reconcile", "failed", Some(&err.to_string()));
            warn!(error = %err, "Cache reconciliation failed; serving primary-store reads");
        }
    }
}

async fn try_reconcile(
    products: &dyn ProductStore,
    cache: &dyn CacheStore,
) -> Result<ReconcileOutcome, ReconcileError> {
    if cache.has_any_entries().await? {
        return Ok(ReconcileOutcome::AlreadyWarm);
    }

    // Cold cache: clear the namespace entirely in case a stale partial
    // index is lingering, then rebuild from the authoritative store.
    cache.flush_all().await?;

    let all_products = products.all().await?;
    for product in &all_products {
        cache.set(product).await?;
    }
    cache.create_index().await?;

    Ok(ReconcileOutcome::Rebuilt(all_products.len()))
}
