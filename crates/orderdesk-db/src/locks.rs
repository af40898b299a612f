//! # Per-Product Lock Manager
//!
//! Serializes concurrent order placements that touch the same products.
//!
//! ## Locking Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Why Ordered Lock Acquisition                     │
//! │                                                                     │
//! │  Order A wants products {3, 7}      Order B wants products {7, 3}   │
//! │                                                                     │
//! │  ❌ Naive (request order):                                          │
//! │     A locks 3, B locks 7, A waits for 7, B waits for 3 → DEADLOCK   │
//! │                                                                     │
//! │  ✅ Fixed ascending order:                                          │
//! │     Both sort to [3, 7]; whoever gets 3 first also gets 7 first.    │
//! │     The loser queues behind the whole sequence. No cycle possible.  │
//! │                                                                     │
//! │  Orders over disjoint product sets never contend at all.            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The wait for the full lock sequence shares one deadline; if it expires
//! the acquisition fails with no locks held and no other side effects, so
//! the caller can report a retryable conflict instead of blocking forever.
//!
//! ## Thread Safety
//! The registry itself is a `std::sync::Mutex` (held only for map
//! lookups, never across an await); the per-product locks are
//! `tokio::sync::Mutex` handles shared via `Arc`, so guards can be held
//! across the placement transaction's await points.

use std::collections::HashMap;
use std::sync::Mutex as StdMutex;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::{timeout, Instant};
use tracing::debug;

/// Registry of per-product async mutexes, keyed by product id.
///
/// Lock entries are created on first contact and kept for the process
/// lifetime; the working set is bounded by the catalog size.
#[derive(Debug, Default)]
pub(crate) struct ProductLocks {
    entries: StdMutex<HashMap<i64, Arc<AsyncMutex<()>>>>,
}

/// Guards for one acquired lock sequence. Locks release on drop.
pub(crate) type LockSet = Vec<OwnedMutexGuard<()>>;

impl ProductLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the shared mutex for a product, creating it on first use.
    fn handle(&self, product_id: i64) -> Arc<AsyncMutex<()>> {
        let mut entries = self.entries.lock().expect("Product lock registry poisoned");
        Arc::clone(
            entries
                .entry(product_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }

    /// Acquires the locks for every id, in ascending id order, under one
    /// shared deadline.
    ///
    /// ## Arguments
    /// * `product_ids` - distinct product ids, already sorted ascending
    /// * `wait` - total time budget for the whole sequence
    ///
    /// ## Returns
    /// * `Ok(LockSet)` - all locks held; they release when the set drops
    /// * `Err(())` - deadline expired; nothing is held
    pub(crate) async fn lock_all(
        &self,
        product_ids: &[i64],
        wait: Duration,
    ) -> Result<LockSet, ()> {
        debug_assert!(product_ids.windows(2).all(|w| w[0] < w[1]));

        let deadline = Instant::now() + wait;
        let mut guards = Vec::with_capacity(product_ids.len());

        for &id in product_ids {
            let handle = self.handle(id);
            let remaining = deadline.saturating_duration_since(Instant::now());

            match timeout(remaining, handle.lock_owned()).await {
                Ok(guard) => guards.push(guard),
                Err(_) => {
                    debug!(product_id = id, "Lock wait expired");
                    // guards drop here, releasing everything acquired so far
                    return Err(());
                }
            }
        }

        Ok(guards)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
