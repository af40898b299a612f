//! # orderdesk-core: Pure Business Logic for Orderdesk
//!
//! This crate is the **heart** of Orderdesk. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Orderdesk Architecture                         │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │               Caller (HTTP layer, admin tooling)              │ │
//! │  │      place order ──► list orders ──► manage catalog           │ │
//! │  └──────────────────────────────┬────────────────────────────────┘ │
//! │                                 │                                   │
//! │  ┌──────────────────────────────▼────────────────────────────────┐ │
//! │  │            ★ orderdesk-core (THIS CRATE) ★                    │ │
//! │  │                                                               │ │
//! │  │  ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌────────────┐       │ │
//! │  │  │  types   │ │  money   │ │ pricing  │ │ validation │       │ │
//! │  │  │ Product  │ │  Money   │ │ best     │ │   rules    │       │ │
//! │  │  │ Order    │ │ (cents)  │ │ discount │ │   checks   │       │ │
//! │  │  └──────────┘ └──────────┘ └──────────┘ └────────────┘       │ │
//! │  │                                                               │ │
//! │  │  NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │ │
//! │  └──────────────────────────────┬────────────────────────────────┘ │
//! │                                 │                                   │
//! │  ┌──────────────────────────────▼────────────────────────────────┐ │
//! │  │               orderdesk-db (Database Layer)                   │ │
//! │  │    SQLite repositories, migrations, order placement           │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Promotion, Order, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Best-discount selection and line pricing
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic for a given instant
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use orderdesk_core::Money` instead of
// `use orderdesk_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line entries allowed in a single order request.
///
/// ## Business Reason
/// Prevents runaway requests and keeps the placement transaction (and the
/// number of product locks it holds) bounded.
pub const MAX_ORDER_ITEMS: usize = 100;

/// Maximum quantity of a single product per line entry.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
