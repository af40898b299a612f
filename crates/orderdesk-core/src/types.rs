//! # Domain Types
//!
//! Core domain types used throughout Orderdesk.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌────────────────┐   ┌────────────────┐   ┌────────────────┐      │
//! │  │    Product     │   │   Promotion    │   │     Order      │      │
//! │  │  ────────────  │   │  ────────────  │   │  ────────────  │      │
//! │  │  id (i64)      │   │  id (i64)      │   │  id (i64)      │      │
//! │  │  name          │   │  discount_type │   │  user_id       │      │
//! │  │  price_cents   │   │  value_minor   │   │  status        │      │
//! │  │  stock         │   │  starts/ends   │   │  total_cents   │      │
//! │  └────────────────┘   └────────────────┘   └────────────────┘      │
//! │                                                                     │
//! │  ┌────────────────┐   ┌────────────────┐   ┌────────────────┐      │
//! │  │  DiscountType  │   │  OrderStatus   │   │   OrderItem    │      │
//! │  │  ────────────  │   │  ────────────  │   │  ────────────  │      │
//! │  │  Fixed         │   │  Pending ...   │   │  frozen price  │      │
//! │  │  Percentage    │   │  Canceled      │   │  snapshot      │      │
//! │  └────────────────┘   └────────────────┘   └────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! An [`OrderItem`] copies the product name and prices at purchase time.
//! Later catalog or promotion changes never touch a stored order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product available for purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (database rowid).
    pub id: i64,

    /// Display name shown to buyers and frozen onto order lines.
    pub name: String,

    /// Unit price in cents (smallest currency unit). Never negative.
    pub price_cents: i64,

    /// Units currently on hand. Never negative; only mutated through
    /// race-free operations.
    pub stock: i64,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether current stock covers a requested quantity.
    ///
    /// Advisory only: the authoritative check happens inside the placement
    /// transaction, where stock cannot move underneath the caller.
    #[inline]
    pub fn can_fill(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
}

// =============================================================================
// Discount Type
// =============================================================================

/// How a promotion's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// A flat per-unit amount off, in cents.
    Fixed,
    /// A fraction of the unit price, in basis points (5000 = 50%).
    Percentage,
}

// =============================================================================
// Promotion
// =============================================================================

/// A time-bounded discount over a set of products.
///
/// ## Value Encoding
/// `value_minor` carries two implied decimals either way:
/// - `Fixed`: cents (3000 = 30.00 off per unit)
/// - `Percentage`: basis points (5000 = 50.00%)
///
/// ## Activity
/// A promotion is active when `starts_at <= now <= ends_at`, both ends
/// inclusive. Activity is evaluated live at pricing time, never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Promotion {
    pub id: i64,
    pub name: String,
    pub discount_type: DiscountType,

    /// Discount value in minor units (see type-level docs).
    pub value_minor: i64,

    /// First instant the promotion applies (inclusive).
    pub starts_at: DateTime<Utc>,

    /// Last instant the promotion applies (inclusive).
    pub ends_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Products this promotion applies to. Loaded from the join table,
    /// always non-empty for a persisted promotion.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub applicable_products: Vec<i64>,
}

impl Promotion {
    /// Whether the promotion is active at the given instant.
    ///
    /// Both window boundaries count as active.
    #[inline]
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.starts_at <= at && at <= self.ends_at
    }

    /// Whether the promotion covers the given product.
    #[inline]
    pub fn applies_to(&self, product_id: i64) -> bool {
        self.applicable_products.contains(&product_id)
    }

    /// Per-unit deduction this promotion grants on the given unit price.
    ///
    /// Does not check activity or applicability; the pricing engine does.
    pub fn unit_deduction(&self, unit_price: Money) -> Money {
        match self.discount_type {
            DiscountType::Fixed => Money::from_cents(self.value_minor),
            DiscountType::Percentage => unit_price.percent_of(self.value_minor),
        }
    }
}

/// Input for creating or replacing a promotion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPromotion {
    pub name: String,
    pub discount_type: DiscountType,
    pub value_minor: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub applicable_products: Vec<i64>,
}

// =============================================================================
// Order Status
// =============================================================================

/// The lifecycle status of an order.
///
/// Placement always creates orders as `Pending`; later transitions are
/// driven by fulfilment tooling outside this codebase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Canceled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

// =============================================================================
// Order
// =============================================================================

/// A placed order.
///
/// Immutable once created: items and total are a snapshot of purchase-time
/// pricing, decoupled from later catalog or promotion changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Returns the order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line item in an order.
/// Uses snapshot pattern to freeze product data at purchase time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,

    /// Product name at purchase time (survives later renames or deletes).
    pub name_snapshot: String,

    /// Catalog unit price in cents at purchase time (frozen).
    pub unit_price_cents: i64,

    /// Unit price actually charged after the best deduction (frozen).
    pub unit_sale_price_cents: i64,

    /// Quantity purchased.
    pub quantity: i64,

    /// Line total (unit sale price × quantity).
    pub line_total_cents: i64,

    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Returns the frozen catalog unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the frozen charged unit price as Money.
    #[inline]
    pub fn unit_sale_price(&self) -> Money {
        Money::from_cents(self.unit_sale_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Placement DTOs
// =============================================================================

/// One requested line in a placement request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: i64,
    pub quantity: i64,
}

/// A committed order together with its item snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

// =============================================================================
// Unit Tests
// =============================================================================
