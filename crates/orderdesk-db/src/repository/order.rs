//! # Order Repository
//!
//! Database operations for orders and their item snapshots.
//!
//! ## Write Path
//! Orders are written exactly once, inside the placement transaction
//! ([`crate::placement`]); there is no update path. Reads therefore need
//! no synchronization — a committed order never changes.
//!
//! ## Snapshot Pattern
//! Each line freezes the product name, the catalog price, and the charged
//! price at purchase time. Later catalog edits, promotion changes, or
//! promotion deletions do not reach stored orders.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use orderdesk_core::{Order, OrderItem, OrderStatus, PlacedOrder};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by ID, with its item snapshot.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<PlacedOrder>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, status, total_cents, created_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match order {
            None => Ok(None),
            Some(order) => {
                let mut conn = self.pool.acquire().await?;
                let items = fetch_items(&mut conn, order.id).await?;
                Ok(Some(PlacedOrder { order, items }))
            }
        }
    }

    /// Lists a user's orders, newest first (stable tiebreak on id).
    ///
    /// Pagination (limit/offset) is driven by the caller.
    pub async fn list_for_user(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, status, total_cents, created_at
            FROM orders
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Counts a user's orders (for diagnostics and pagination totals).
    pub async fn count_for_user(&self, user_id: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// One priced line, ready to be frozen onto an order.
#[derive(Debug, Clone)]
pub(crate) struct LineDraft {
    pub product_id: i64,
    pub name_snapshot: String,
    pub unit_price_cents: i64,
    pub unit_sale_price_cents: i64,
    pub quantity: i64,
    pub line_total_cents: i64,
}

/// Inserts an order and its items on the given connection.
///
/// Runs inside the placement transaction: either the order and every item
/// land together, or the rollback removes all of them.
pub(crate) async fn insert_order(
    conn: &mut SqliteConnection,
    user_id: i64,
    total_cents: i64,
    created_at: DateTime<Utc>,
    lines: &[LineDraft],
) -> DbResult<PlacedOrder> {
    debug!(user_id, total_cents, lines = lines.len(), "Inserting order");

    let status = OrderStatus::Pending;

    let result = sqlx::query(
        r#"
        INSERT INTO orders (user_id, status, total_cents, created_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(user_id)
    .bind(status)
    .bind(total_cents)
    .bind(created_at)
    .execute(&mut *conn)
    .await?;

    let order_id = result.last_insert_rowid();
    let mut items = Vec::with_capacity(lines.len());

    for line in lines {
        let result = sqlx::query(
            r#"
            INSERT INTO order_items (
                order_id, product_id, name_snapshot,
                unit_price_cents, unit_sale_price_cents,
                quantity, line_total_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(order_id)
        .bind(line.product_id)
        .bind(&line.name_snapshot)
        .bind(line.unit_price_cents)
        .bind(line.unit_sale_price_cents)
        .bind(line.quantity)
        .bind(line.line_total_cents)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;

        items.push(OrderItem {
            id: result.last_insert_rowid(),
            order_id,
            product_id: line.product_id,
            name_snapshot: line.name_snapshot.clone(),
            unit_price_cents: line.unit_price_cents,
            unit_sale_price_cents: line.unit_sale_price_cents,
            quantity: line.quantity,
            line_total_cents: line.line_total_cents,
            created_at,
        });
    }

    Ok(PlacedOrder {
        order: Order {
            id: order_id,
            user_id,
            status,
            total_cents,
            created_at,
        },
        items,
    })
}

/// Loads an order's items in insertion order.
pub(crate) async fn fetch_items(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> DbResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        r#"
        SELECT id, order_id, product_id, name_snapshot,
               unit_price_cents, unit_sale_price_cents,
               quantity, line_total_cents, created_at
        FROM order_items
        WHERE order_id = ?1
        ORDER BY id
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

// =============================================================================
// Unit Tests
// =============================================================================
