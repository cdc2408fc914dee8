//! # Cache Health Flag
//!
//! Process-wide signal of whether the cache store is currently safe to use.
//!
//! The flag starts unhealthy and is flipped healthy only by an explicit
//! successful (re)connect event - never by a single successful operation,
//! so transient per-call successes amid systemic failure cannot make it
//! flicker. Any failed cache operation flips it unhealthy. Staleness of a
//! few milliseconds is acceptable, so this is a plain atomic rather than a
//! critical section.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

/// Shared, atomically updated cache health state.
///
/// Clone freely: clones share the same underlying flag. Components take
/// this as a constructor dependency so tests can observe and drive it.
#[derive(Debug, Clone, Default)]
pub struct CacheHealth {
    healthy: Arc<AtomicBool>,
}

impl CacheHealth {
    /// A new flag, unhealthy until proven otherwise
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    pub fn set_healthy(&self, healthy: bool) {
        let previous = self.healthy.swap(healthy, Ordering::AcqRel);
        if previous != healthy {
            if healthy {
                info!("🟢 Cache marked healthy - reads will be served from the cache");
            } else {
                warn!("🔴 Cache marked unhealthy - reads fall back to the primary store");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unhealthy() {
        assert!(!CacheHealth::new().is_healthy());
    }

    #[test]
    fn clones_share_state() {
        let health = CacheHealth::new();
        let clone = health.clone();
        health.set_healthy(true);
        assert!(clone.is_healthy());
        clone.set_healthy(false);
        assert!(!health.is_healthy());
    }
}
