//! # Catalog Repository
//!
//! Database operations for products.
//!
//! ## Stock Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                            │
//! │                                                                     │
//! │  ❌ WRONG: read-then-write (double-sell under concurrency)          │
//! │     SELECT stock FROM products WHERE id = ?                         │
//! │     UPDATE products SET stock = <stock - qty> WHERE id = ?          │
//! │                                                                     │
//! │  ✅ CORRECT: conditional decrement (single atomic statement)        │
//! │     UPDATE products SET stock = stock - ?qty                        │
//! │     WHERE id = ? AND stock >= ?qty                                  │
//! │                                                                     │
//! │  rows_affected = 0 → the authoritative stock check failed.          │
//! │  Two racing decrements can never take stock below zero.             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use orderdesk_core::validation::validate_product_input;
use orderdesk_core::{NewProduct, Product, ValidationError};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let created = repo.insert(&new_product).await?;
/// let product = repo.get_by_id(created.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product after validating the input.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with its assigned id
    /// * `Err(DbError::InvalidInput)` - Input failed validation
    pub async fn insert(&self, input: &NewProduct) -> DbResult<Product> {
        validate_product_input(input)?;

        debug!(name = %input.name, "Inserting product");

        let now = Utc::now();
        let name = input.name.trim().to_string();

        let result = sqlx::query(
            r#"
            INSERT INTO products (name, price_cents, stock, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&name)
        .bind(input.price_cents)
        .bind(input.stock)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Product {
            id: result.last_insert_rowid(),
            name,
            price_cents: input.price_cents,
            stock: input.stock,
            created_at: now,
            updated_at: now,
        })
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    /// Lists products sorted by name.
    ///
    /// Pagination (limit/offset) is driven by the caller.
    pub async fn list(&self, limit: i64, offset: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price_cents, stock, created_at, updated_at
            FROM products
            ORDER BY name, id
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Updates a product's name and price after validating the input.
    ///
    /// Stock is deliberately not writable here: all stock movement goes
    /// through [`ProductRepository::adjust_stock`] or the placement
    /// transaction's conditional decrement.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, id: i64, name: &str, price_cents: i64) -> DbResult<()> {
        validate_product_input(&NewProduct {
            name: name.to_string(),
            price_cents,
            stock: 0,
        })?;

        debug!(id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                price_cents = ?3,
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(name.trim())
        .bind(price_cents)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Adjusts stock by a signed delta (restocking, corrections).
    ///
    /// The guard `stock + delta >= 0` rides in the statement itself, so a
    /// negative correction can never take stock below zero.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    /// * `Err(DbError::InvalidInput)` - Adjustment would drive stock negative
    pub async fn adjust_stock(&self, id: i64, delta: i64) -> DbResult<()> {
        debug!(id, delta, "Adjusting stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?2, updated_at = ?3
            WHERE id = ?1 AND stock + ?2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get_by_id(id).await? {
                None => Err(DbError::not_found("Product", id)),
                Some(_) => Err(DbError::InvalidInput(ValidationError::MustBeNonNegative {
                    field: "stock".to_string(),
                })),
            };
        }

        Ok(())
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================
// Used by the placement transaction, which runs several statements on one
// connection so an abort rolls everything back together.

/// Fetches a product on the given connection.
pub(crate) async fn fetch_product(
    conn: &mut SqliteConnection,
    id: i64,
) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, name, price_cents, stock, created_at, updated_at
        FROM products
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

/// Atomically decrements stock if and only if enough is available.
///
/// This is the authoritative stock check: the condition and the write are
/// one statement, so no interleaving can take stock negative.
///
/// ## Returns
/// * `Ok(true)` - stock was decremented by `quantity`
/// * `Ok(false)` - product missing or stock insufficient; nothing changed
pub(crate) async fn try_decrement_stock(
    conn: &mut SqliteConnection,
    id: i64,
    quantity: i64,
) -> DbResult<bool> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock - ?2, updated_at = ?3
        WHERE id = ?1 AND stock >= ?2
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_db;

    fn widget(stock: i64) -> NewProduct {
        NewProduct {
            name: "Widget".to_string(),
            price_cents: 1099,
            stock,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo.insert(&widget(5)).await.unwrap();
        assert!(created.id > 0);

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Widget");
        assert_eq!(fetched.price_cents, 1099);
        assert_eq!(fetched.stock, 5);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let db = test_db().await;
        assert!(db.products().get_by_id(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_input() {
        let db = test_db().await;
        let repo = db.products();

        let err = repo
            .insert(&NewProduct {
                name: "".to_string(),
                price_cents: 100,
                stock: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidInput(_)));

        let err = repo
            .insert(&NewProduct {
                name: "Widget".to_string(),
                price_cents: -1,
                stock: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_update_product() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo.insert(&widget(5)).await.unwrap();
        repo.update(created.id, "Widget Pro", 1299).await.unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Widget Pro");
        assert_eq!(fetched.price_cents, 1299);
        // stock untouched by update
        assert_eq!(fetched.stock, 5);
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let db = test_db().await;
        let err = db.products().update(424242, "Ghost", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_adjust_stock() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo.insert(&widget(5)).await.unwrap();
        repo.adjust_stock(created.id, 10).await.unwrap();
        repo.adjust_stock(created.id, -3).await.unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.stock, 12);

        // would go negative → rejected, stock unchanged
        let err = repo.adjust_stock(created.id, -100).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidInput(_)));
        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.stock, 12);
    }

    #[tokio::test]
    async fn test_conditional_decrement() {
        let db = test_db().await;
        let repo = db.products();
        let created = repo.insert(&widget(3)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();

        assert!(try_decrement_stock(&mut conn, created.id, 2).await.unwrap());
        // only 1 left; requesting 2 must fail and change nothing
        assert!(!try_decrement_stock(&mut conn, created.id, 2).await.unwrap());
        assert!(try_decrement_stock(&mut conn, created.id, 1).await.unwrap());

        drop(conn);
        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.stock, 0);
    }
}
