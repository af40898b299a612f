//! # Pricing Engine
//!
//! Best-discount selection and line pricing.
//!
//! ## How a Line Gets Priced
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Pricing a Line at Instant T                     │
//! │                                                                     │
//! │  promotions covering the product                                    │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  keep those active at T (starts_at <= T <= ends_at, inclusive)      │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  per-unit deduction for each:                                       │
//! │    Fixed      → value cents                                         │
//! │    Percentage → unit_price × bps / 10000                            │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  best deduction = MAXIMUM (best single discount, no stacking)       │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  unit sale price = max(unit_price − deduction, 0)                   │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  line price = unit sale price × quantity                            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All arithmetic is integer cents; the only rounding step is inside
//! [`Money::percent_of`], so accumulating line totals introduces no drift.
//!
//! Promotions tying on deduction are interchangeable: only the amount
//! reaches the price, so no winner needs to be singled out.

use chrono::{DateTime, Utc};

use crate::money::Money;
use crate::types::{Product, Promotion};

/// Largest per-unit deduction among promotions active for the product
/// at the given instant.
///
/// Promotions that don't cover the product or aren't active at `at`
/// contribute nothing. Returns zero when no promotion applies.
///
/// ## Example
/// ```text
/// price 100.00, active: Fixed 30.00 and Percentage 50%
/// → deductions 30.00 and 50.00 → best 50.00
/// ```
pub fn best_deduction(product: &Product, promotions: &[Promotion], at: DateTime<Utc>) -> Money {
    promotions
        .iter()
        .filter(|p| p.is_active_at(at) && p.applies_to(product.id))
        .map(|p| p.unit_deduction(product.price()))
        .max()
        .unwrap_or(Money::zero())
}

/// Per-unit price actually charged: catalog price minus the best
/// deduction, floored at zero.
///
/// A deduction can never drive the price negative.
pub fn unit_sale_price(product: &Product, promotions: &[Promotion], at: DateTime<Utc>) -> Money {
    product
        .price()
        .sub_to_floor(best_deduction(product, promotions, at))
}

/// Total charged for one line entry: unit sale price × quantity.
pub fn line_price(
    product: &Product,
    promotions: &[Promotion],
    quantity: i64,
    at: DateTime<Utc>,
) -> Money {
    unit_sale_price(product, promotions, at).multiply_quantity(quantity)
}

// =============================================================================
// Unit Tests
// =============================================================================
