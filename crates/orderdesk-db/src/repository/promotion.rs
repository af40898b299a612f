//! # Promotion Repository
//!
//! Database operations for promotions and their product sets.
//!
//! ## The Activity Query
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │            "Which promotions are active for product P at T?"        │
//! │                                                                     │
//! │  promotion_products ──► promotions                                  │
//! │     product_id = P        starts_at <= T AND ends_at >= T           │
//! │                           (inclusive on both ends)                  │
//! │                                                                     │
//! │  Evaluated live at pricing time — a promotion's active state is     │
//! │  time-dependent and never cached. Repeated calls with the same      │
//! │  (P, T) return the same set absent catalog changes.                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use orderdesk_core::validation::validate_promotion_input;
use orderdesk_core::{NewPromotion, Promotion};

/// Repository for promotion database operations.
#[derive(Debug, Clone)]
pub struct PromotionRepository {
    pool: SqlitePool,
}

impl PromotionRepository {
    /// Creates a new PromotionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PromotionRepository { pool }
    }

    /// Inserts a promotion and its product set in one transaction.
    ///
    /// ## Returns
    /// * `Ok(Promotion)` - Inserted promotion with its assigned id
    /// * `Err(DbError::InvalidInput)` - Input failed validation
    /// * `Err(DbError::ForeignKeyViolation)` - A product id doesn't exist
    pub async fn insert(&self, input: &NewPromotion) -> DbResult<Promotion> {
        validate_promotion_input(input)?;

        debug!(name = %input.name, "Inserting promotion");

        let now = Utc::now();
        let name = input.name.trim().to_string();
        let product_ids = normalized_product_ids(&input.applicable_products);

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO promotions (name, discount_type, value_minor, starts_at, ends_at, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&name)
        .bind(input.discount_type)
        .bind(input.value_minor)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_rowid();
        link_products(&mut tx, id, &product_ids).await?;

        tx.commit().await?;

        Ok(Promotion {
            id,
            name,
            discount_type: input.discount_type,
            value_minor: input.value_minor,
            starts_at: input.starts_at,
            ends_at: input.ends_at,
            created_at: now,
            updated_at: now,
            applicable_products: product_ids,
        })
    }

    /// Gets a promotion by ID, with its product set loaded.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Promotion>> {
        let promotion = sqlx::query_as::<_, Promotion>(
            r#"
            SELECT id, name, discount_type, value_minor, starts_at, ends_at, created_at, updated_at
            FROM promotions
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match promotion {
            None => Ok(None),
            Some(mut promotion) => {
                let mut conn = self.pool.acquire().await?;
                promotion.applicable_products = load_product_ids(&mut conn, id).await?;
                Ok(Some(promotion))
            }
        }
    }

    /// Replaces a promotion's fields and product set in one transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Promotion doesn't exist
    pub async fn update(&self, id: i64, input: &NewPromotion) -> DbResult<()> {
        validate_promotion_input(input)?;

        debug!(id, "Updating promotion");

        let now = Utc::now();
        let product_ids = normalized_product_ids(&input.applicable_products);

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE promotions SET
                name = ?2,
                discount_type = ?3,
                value_minor = ?4,
                starts_at = ?5,
                ends_at = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(input.discount_type)
        .bind(input.value_minor)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Promotion", id));
        }

        sqlx::query("DELETE FROM promotion_products WHERE promotion_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        link_products(&mut tx, id, &product_ids).await?;

        tx.commit().await?;

        Ok(())
    }

    /// Deletes a promotion; join rows cascade.
    ///
    /// Orders priced under this promotion keep their frozen totals.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting promotion");

        let result = sqlx::query("DELETE FROM promotions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Promotion", id));
        }

        Ok(())
    }

    /// Promotions covering the product whose window contains `at`.
    pub async fn active_for_product(
        &self,
        product_id: i64,
        at: DateTime<Utc>,
    ) -> DbResult<Vec<Promotion>> {
        let mut conn = self.pool.acquire().await?;
        active_for_product(&mut conn, product_id, at).await
    }
}

/// Sorted, deduplicated product id set for the join table.
fn normalized_product_ids(ids: &[i64]) -> Vec<i64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

async fn link_products(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    promotion_id: i64,
    product_ids: &[i64],
) -> DbResult<()> {
    for &product_id in product_ids {
        sqlx::query("INSERT INTO promotion_products (promotion_id, product_id) VALUES (?1, ?2)")
            .bind(promotion_id)
            .bind(product_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

async fn load_product_ids(conn: &mut SqliteConnection, promotion_id: i64) -> DbResult<Vec<i64>> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT product_id FROM promotion_products WHERE promotion_id = ?1 ORDER BY product_id",
    )
    .bind(promotion_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(ids)
}

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// The live activity query, on the given connection.
///
/// Window containment is inclusive on both ends. Results come back in
/// promotion id order with their full product sets loaded, so callers see
/// a deterministic snapshot.
pub(crate) async fn active_for_product(
    conn: &mut SqliteConnection,
    product_id: i64,
    at: DateTime<Utc>,
) -> DbResult<Vec<Promotion>> {
    let mut promotions = sqlx::query_as::<_, Promotion>(
        r#"
        SELECT p.id, p.name, p.discount_type, p.value_minor,
               p.starts_at, p.ends_at, p.created_at, p.updated_at
        FROM promotions p
        INNER JOIN promotion_products pp ON pp.promotion_id = p.id
        WHERE pp.product_id = ?1
          AND p.starts_at <= ?2
          AND p.ends_at >= ?2
        ORDER BY p.id
        "#,
    )
    .bind(product_id)
    .bind(at)
    .fetch_all(&mut *conn)
    .await?;

    for promotion in &mut promotions {
        promotion.applicable_products = load_product_ids(conn, promotion.id).await?;
    }

    Ok(promotions)
}

// =============================================================================
// Unit Tests
// =============================================================================
