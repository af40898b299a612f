//! # orderdesk-db: Database Layer for Orderdesk
//!
//! SQLite persistence and the order placement transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                 Caller (HTTP layer, admin tooling)                  │
//! └──────────────────────────────┬──────────────────────────────────────┘
//! ┌──────────────────────────────▼──────────────────────────────────────┐
//! │                  ★ orderdesk-db (THIS CRATE) ★                      │
//! │                                                                     │
//! │   ┌───────────┐  ┌──────────────┐  ┌───────────┐  ┌────────────┐   │
//! │   │   pool    │  │ repositories │  │ placement │  │   locks    │   │
//! │   │ Database  │  │ catalog /    │  │ the order │  │ per-product│   │
//! │   │ DbConfig  │  │ promotion /  │  │ workflow  │  │ mutexes    │   │
//! │   │           │  │ order        │  │           │  │            │   │
//! │   └───────────┘  └──────────────┘  └───────────┘  └────────────┘   │
//! │                                                                     │
//! │              uses orderdesk-core for pricing and rules              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`pool`] - Connection pool, configuration, the [`Database`] handle
//! - [`repository`] - Catalog store, promotion index, order store
//! - [`placement`] - The order placement transaction
//! - [`migrations`] - Embedded schema migrations
//! - [`error`] - Database error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
mod locks;
pub mod migrations;
pub mod placement;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{DbError, DbResult};
pub use placement::{OrderPlacement, PlaceOrderError, DEFAULT_LOCK_WAIT};
pub use pool::{Database, DbConfig};
pub use repository::{OrderRepository, ProductRepository, PromotionRepository};

// =============================================================================
// Test Utilities
// =============================================================================

#[cfg(test)]
pub(crate) mod testutil {
    use chrono::{Duration, Utc};

    use crate::pool::{Database, DbConfig};
    use orderdesk_core::{DiscountType, NewProduct, NewPromotion, Product, Promotion};

    /// Fresh in-memory database with migrations applied.
    pub(crate) async fn test_db() -> Database {
        // RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database")
    }

    /// Inserts a product.
    pub(crate) async fn seed_product(
        db: &Database,
        name: &str,
        price_cents: i64,
        stock: i64,
    ) -> Product {
        db.products()
            .insert(&NewProduct {
                name: name.to_string(),
                price_cents,
                stock,
            })
            .await
            .expect("seed product")
    }

    /// Inserts a promotion covering the given products, active from an
    /// hour ago until tomorrow.
    pub(crate) async fn seed_promotion(
        db: &Database,
        product_ids: &[i64],
        discount_type: DiscountType,
        value_minor: i64,
    ) -> Promotion {
        let now = Utc::now();
        db.promotions()
            .insert(&NewPromotion {
                name: format!("promo-{discount_type:?}-{value_minor}"),
                discount_type,
                value_minor,
                starts_at: now - Duration::hours(1),
                ends_at: now + Duration::days(1),
                applicable_products: product_ids.to_vec(),
            })
            .await
            .expect("seed promotion")
    }
}
