//! # Order Placement
//!
//! The order placement transaction: validate, lock, re-check, decrement,
//! price, persist — atomically for the whole item list.
//!
//! ## Placement Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     place_order(user, items)                        │
//! │                                                                     │
//! │  1. Validate request shape (quantities, list size) — advisory,      │
//! │     no I/O, no side effects on failure                              │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  2. Lock every distinct product, ascending id, bounded wait         │
//! │     (timeout → retryable LockTimeout, nothing held)                 │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  3. BEGIN transaction                                               │
//! │     for each line:                                                  │
//! │       fetch product        → missing? abort (ProductNotFound)       │
//! │       conditional decrement → short?  abort (InsufficientStock)     │
//! │       price line at `now` via active promotions                     │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  4. INSERT order (Pending) + item snapshot, COMMIT                  │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  5. Locks release on drop; order is durable and visible             │
//! │                                                                     │
//! │  Any abort rolls the transaction back: no partial decrement,        │
//! │  no partial order. Ever.                                            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency Model
//! Orders over disjoint product sets proceed in parallel; overlapping
//! sets serialize on the shared per-product locks, acquired in fixed
//! ascending order so no two placements can deadlock. The conditional
//! decrement keeps stock non-negative even against writers outside this
//! lock map, so the locks are a serialization courtesy, not the safety
//! net.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbError;
use crate::locks::ProductLocks;
use crate::repository::{catalog, order, promotion};
use orderdesk_core::validation::validate_order_request;
use orderdesk_core::{pricing, CoreError, Money, OrderItemRequest, PlacedOrder};

/// Default bound on the wait for the full product lock sequence.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);

// =============================================================================
// Placement Error
// =============================================================================

/// Outcome of a failed placement.
///
/// Every variant means the order was aborted wholesale: no stock moved,
/// no order row exists.
#[derive(Debug, thiserror::Error)]
pub enum PlaceOrderError {
    /// The request violated a business rule (bad quantity, unknown
    /// product, insufficient stock). Carries the first violated
    /// constraint with its context.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    /// The product locks could not be acquired within the bounded wait.
    /// Retryable: the same request may succeed once contention clears.
    #[error("timed out waiting for product locks after {waited_ms} ms; retry the order")]
    LockTimeout { waited_ms: u64 },

    /// The store failed underneath the transaction. Fatal for this
    /// request; nothing was written.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl PlaceOrderError {
    /// Whether the caller may simply retry the identical request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PlaceOrderError::LockTimeout { .. })
    }
}

// =============================================================================
// Order Placement
// =============================================================================

/// Handle for placing orders. Cheap to clone; clones share the same
/// per-product lock registry.
#[derive(Debug, Clone)]
pub struct OrderPlacement {
    pool: SqlitePool,
    locks: Arc<ProductLocks>,
    lock_wait: Duration,
}

impl OrderPlacement {
    pub(crate) fn new(pool: SqlitePool, locks: Arc<ProductLocks>) -> Self {
        OrderPlacement {
            pool,
            locks,
            lock_wait: DEFAULT_LOCK_WAIT,
        }
    }

    /// Sets the bound on the product lock wait.
    pub fn with_lock_wait(mut self, wait: Duration) -> Self {
        self.lock_wait = wait;
        self
    }

    /// Places an order for `user_id` covering the requested lines.
    ///
    /// On success every product's stock has dropped by exactly the
    /// requested quantity and the returned order carries the purchase-time
    /// snapshot: frozen names, frozen prices, total equal to the sum of
    /// line prices at this instant.
    ///
    /// ## Errors
    /// See [`PlaceOrderError`]; every failure leaves the store untouched.
    pub async fn place_order(
        &self,
        user_id: i64,
        items: &[OrderItemRequest],
    ) -> Result<PlacedOrder, PlaceOrderError> {
        validate_order_request(items)?;

        // Distinct ids, ascending: the fixed lock order.
        let mut product_ids: Vec<i64> = items.iter().map(|i| i.product_id).collect();
        product_ids.sort_unstable();
        product_ids.dedup();

        debug!(user_id, products = ?product_ids, "Acquiring product locks");

        let _locks = self
            .locks
            .lock_all(&product_ids, self.lock_wait)
            .await
            .map_err(|()| PlaceOrderError::LockTimeout {
                waited_ms: self.lock_wait.as_millis() as u64,
            })?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let now = Utc::now();

        let mut total = Money::zero();
        let mut lines = Vec::with_capacity(items.len());

        for item in items {
            let product = catalog::fetch_product(&mut tx, item.product_id)
                .await?
                .ok_or(CoreError::ProductNotFound(item.product_id))?;

            // Authoritative stock check: condition and write in one
            // statement, under the product lock. `product.stock` was read
            // in this same transaction, so on failure it names the real
            // availability.
            let decremented =
                catalog::try_decrement_stock(&mut tx, item.product_id, item.quantity).await?;
            if !decremented {
                return Err(CoreError::InsufficientStock {
                    product_id: item.product_id,
                    available: product.stock,
                    requested: item.quantity,
                }
                .into());
            }

            let promotions = promotion::active_for_product(&mut tx, item.product_id, now).await?;
            let unit_sale = pricing::unit_sale_price(&product, &promotions, now);
            let line_total = unit_sale.multiply_quantity(item.quantity);
            total += line_total;

            lines.push(order::LineDraft {
                product_id: product.id,
                name_snapshot: product.name,
                unit_price_cents: product.price_cents,
                unit_sale_price_cents: unit_sale.cents(),
                quantity: item.quantity,
                line_total_cents: line_total.cents(),
            });
        }

        let placed = order::insert_order(&mut tx, user_id, total.cents(), now, &lines).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(
            order_id = placed.order.id,
            user_id,
            total = %placed.order.total(),
            items = placed.items.len(),
            "Order placed"
        );

        Ok(placed)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{seed_product, seed_promotion, test_db};
    use orderdesk_core::{DiscountType, OrderStatus};

    fn req(product_id: i64, quantity: i64) -> OrderItemRequest {
        OrderItemRequest {
            product_id,
            quantity,
        }
    }

    async fn stock_of(db: &crate::Database, id: i64) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_successful_placement_decrements_and_prices() {
        let db = test_db().await;
        let widget = seed_product(&db, "Widget", 1000, 10).await;
        let gadget = seed_product(&db, "Gadget", 2500, 4).await;

        let placed = db
            .placement()
            .place_order(1, &[req(widget.id, 3), req(gadget.id, 2)])
            .await
            .unwrap();

        assert_eq!(placed.order.status, OrderStatus::Pending);
        assert_eq!(placed.order.user_id, 1);
        // no promotions: total = 3×10.00 + 2×25.00 = 80.00
        assert_eq!(placed.order.total_cents, 8000);
        assert_eq!(placed.items.len(), 2);
        assert_eq!(placed.items[0].name_snapshot, "Widget");
        assert_eq!(placed.items[0].line_total_cents, 3000);

        assert_eq!(stock_of(&db, widget.id).await, 7);
        assert_eq!(stock_of(&db, gadget.id).await, 2);

        // durable and visible through the order store
        let fetched = db.orders().get_by_id(placed.order.id).await.unwrap().unwrap();
        assert_eq!(fetched.order.total_cents, 8000);
        assert_eq!(fetched.items.len(), 2);
    }

    #[tokio::test]
    async fn test_best_promotion_wins_at_placement() {
        let db = test_db().await;
        // price 100.00; Fixed 30.00 and Percentage 50% both active → 50% wins
        let product = seed_product(&db, "Deluxe", 10_000, 10).await;
        seed_promotion(&db, &[product.id], DiscountType::Fixed, 3000).await;
        seed_promotion(&db, &[product.id], DiscountType::Percentage, 5000).await;

        let placed = db
            .placement()
            .place_order(1, &[req(product.id, 2)])
            .await
            .unwrap();

        // 2 × (100.00 − 50.00) = 100.00
        assert_eq!(placed.order.total_cents, 10_000);
        assert_eq!(placed.items[0].unit_price_cents, 10_000);
        assert_eq!(placed.items[0].unit_sale_price_cents, 5000);
        assert_eq!(stock_of(&db, product.id).await, 8);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rejected_without_side_effects() {
        let db = test_db().await;
        let product = seed_product(&db, "Scarce", 1000, 2).await;

        let err = db
            .placement()
            .place_order(1, &[req(product.id, 3)])
            .await
            .unwrap_err();

        match err {
            PlaceOrderError::Rejected(CoreError::InsufficientStock {
                product_id,
                available,
                requested,
            }) => {
                assert_eq!(product_id, product.id);
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        assert_eq!(stock_of(&db, product.id).await, 2);
        assert_eq!(db.orders().count_for_user(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_multi_item_failure_rolls_back_everything() {
        let db = test_db().await;
        let plenty = seed_product(&db, "Plenty", 1000, 5).await;
        let scarce = seed_product(&db, "Scarce", 1000, 1).await;

        let err = db
            .placement()
            .place_order(1, &[req(plenty.id, 2), req(scarce.id, 3)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PlaceOrderError::Rejected(CoreError::InsufficientStock { .. })
        ));

        // the first line's decrement must have been rolled back
        assert_eq!(stock_of(&db, plenty.id).await, 5);
        assert_eq!(stock_of(&db, scarce.id).await, 1);
        assert_eq!(db.orders().count_for_user(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_product_rejected() {
        let db = test_db().await;
        let product = seed_product(&db, "Widget", 1000, 5).await;

        let err = db
            .placement()
            .place_order(1, &[req(product.id, 1), req(424242, 1)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PlaceOrderError::Rejected(CoreError::ProductNotFound(424242))
        ));

        assert_eq!(stock_of(&db, product.id).await, 5);
        assert_eq!(db.orders().count_for_user(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_nonpositive_quantity_rejected() {
        let db = test_db().await;
        let product = seed_product(&db, "Widget", 1000, 5).await;

        for qty in [0, -2] {
            let err = db
                .placement()
                .place_order(1, &[req(product.id, qty)])
                .await
                .unwrap_err();
            assert!(
                matches!(err, PlaceOrderError::Rejected(CoreError::Validation(_))),
                "quantity {qty} should be rejected"
            );
        }

        assert_eq!(stock_of(&db, product.id).await, 5);
        assert_eq!(db.orders().count_for_user(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_request_rejected() {
        let db = test_db().await;
        let err = db.placement().place_order(1, &[]).await.unwrap_err();
        assert!(matches!(
            err,
            PlaceOrderError::Rejected(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_product_lines_decrement_cumulatively() {
        let db = test_db().await;
        let product = seed_product(&db, "Widget", 1000, 3).await;

        let placed = db
            .placement()
            .place_order(1, &[req(product.id, 2), req(product.id, 1)])
            .await
            .unwrap();

        assert_eq!(placed.items.len(), 2);
        assert_eq!(placed.order.total_cents, 3000);
        assert_eq!(stock_of(&db, product.id).await, 0);

        // a second pair exceeding the remainder must fail wholesale
        let err = db
            .placement()
            .place_order(1, &[req(product.id, 1), req(product.id, 1)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PlaceOrderError::Rejected(CoreError::InsufficientStock { .. })
        ));
        assert_eq!(stock_of(&db, product.id).await, 0);
    }

    #[tokio::test]
    async fn test_order_snapshot_is_immutable() {
        let db = test_db().await;
        let product = seed_product(&db, "Widget", 10_000, 5).await;
        let promo = seed_promotion(&db, &[product.id], DiscountType::Percentage, 5000).await;

        let placed = db
            .placement()
            .place_order(1, &[req(product.id, 1)])
            .await
            .unwrap();
        assert_eq!(placed.order.total_cents, 5000);

        // mutate the catalog and retire the promotion
        db.products().update(product.id, "Widget XL", 99_900).await.unwrap();
        db.promotions().delete(promo.id).await.unwrap();

        let fetched = db.orders().get_by_id(placed.order.id).await.unwrap().unwrap();
        assert_eq!(fetched.order.total_cents, 5000);
        assert_eq!(fetched.items[0].name_snapshot, "Widget");
        assert_eq!(fetched.items[0].unit_price_cents, 10_000);
        assert_eq!(fetched.items[0].unit_sale_price_cents, 5000);
    }

    #[tokio::test]
    async fn test_lock_timeout_is_retryable_with_no_side_effects() {
        let db = test_db().await;
        let product = seed_product(&db, "Contended", 1000, 5).await;

        let locks = Arc::new(ProductLocks::new());
        let placement = OrderPlacement::new(db.pool().clone(), Arc::clone(&locks))
            .with_lock_wait(Duration::from_millis(50));

        // hold the product's lock so placement cannot acquire it
        let held = locks
            .lock_all(&[product.id], Duration::from_millis(50))
            .await
            .unwrap();

        let err = placement
            .place_order(1, &[req(product.id, 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, PlaceOrderError::LockTimeout { .. }));
        assert!(err.is_retryable());
        drop(held);

        assert_eq!(stock_of(&db, product.id).await, 5);
        assert_eq!(db.orders().count_for_user(1).await.unwrap(), 0);

        // contention cleared: the identical request now succeeds
        placement
            .place_order(1, &[req(product.id, 1)])
            .await
            .unwrap();
        assert_eq!(stock_of(&db, product.id).await, 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_oversell_race_exactly_depletes_stock() {
        let db = test_db().await;
        let product = seed_product(&db, "Drop", 1000, 5).await;

        let mut handles = Vec::new();
        for user in 0..8i64 {
            let db = db.clone();
            let product_id = product.id;
            handles.push(tokio::spawn(async move {
                db.placement().place_order(user, &[req(product_id, 1)]).await
            }));
        }

        let mut succeeded = 0;
        let mut conflicted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(PlaceOrderError::Rejected(CoreError::InsufficientStock { .. })) => {
                    conflicted += 1
                }
                Err(other) => panic!("unexpected failure: {other:?}"),
            }
        }

        // stock 5, 8 buyers: exactly 5 win, 3 lose, shelf is empty
        assert_eq!(succeeded, 5);
        assert_eq!(conflicted, 3);
        assert_eq!(stock_of(&db, product.id).await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_product_sets_never_deadlock() {
        let db = test_db().await;
        let a = seed_product(&db, "A", 100, 1000).await;
        let b = seed_product(&db, "B", 100, 1000).await;
        let c = seed_product(&db, "C", 100, 1000).await;

        // requests deliberately list products in clashing orders
        let shapes = [
            vec![req(a.id, 1), req(b.id, 1)],
            vec![req(b.id, 1), req(a.id, 1)],
            vec![req(b.id, 1), req(c.id, 1)],
            vec![req(c.id, 1), req(b.id, 1)],
            vec![req(c.id, 1), req(a.id, 1)],
        ];

        let mut handles = Vec::new();
        for round in 0..4 {
            for (i, shape) in shapes.iter().enumerate() {
                let db = db.clone();
                let items = shape.clone();
                let user = (round * shapes.len() + i) as i64;
                handles.push(tokio::spawn(async move {
                    db.placement().place_order(user, &items).await
                }));
            }
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // 20 two-line orders of one unit each: 40 units spent in total
        let spent: i64 = 3000
            - stock_of(&db, a.id).await
            - stock_of(&db, b.id).await
            - stock_of(&db, c.id).await;
        assert_eq!(spent, 40);
    }
}
