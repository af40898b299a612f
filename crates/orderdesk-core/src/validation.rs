//! # Validation Module
//!
//! Input validation for Orderdesk.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                              │
//! │                                                                     │
//! │  Layer 1: Caller (HTTP layer)                                       │
//! │  ├── Shape checks (deserialization)                                 │
//! │  └── Immediate user feedback                                        │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 2: THIS MODULE — business rule validation                    │
//! │  ├── quantities positive and bounded                                │
//! │  ├── promotion windows ordered, percentage capped                   │
//! │  └── no side effects on failure                                     │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 3: Database (SQLite)                                         │
//! │  ├── NOT NULL / CHECK constraints                                   │
//! │  └── Foreign key constraints                                        │
//! │                                                                     │
//! │  Defense in depth: multiple layers catch different errors           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use orderdesk_core::validation::validate_order_request;
//! use orderdesk_core::types::OrderItemRequest;
//!
//! let items = [OrderItemRequest { product_id: 1, quantity: 2 }];
//! validate_order_request(&items).unwrap();
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{DiscountType, NewProduct, NewPromotion, OrderItemRequest};
use crate::{MAX_ITEM_QUANTITY, MAX_ORDER_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Basis points in 100% — the cap for percentage promotion values.
pub const MAX_PERCENTAGE_BPS: i64 = 10_000;

// =============================================================================
// Order Request Validation
// =============================================================================

/// Validates the shape of a placement request.
///
/// ## Rules
/// - at least one line entry, at most [`MAX_ORDER_ITEMS`]
/// - every quantity strictly positive and at most [`MAX_ITEM_QUANTITY`]
///
/// Advisory only with respect to stock: existence and availability are
/// re-checked authoritatively inside the placement transaction.
pub fn validate_order_request(items: &[OrderItemRequest]) -> CoreResult<()> {
    if items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        }
        .into());
    }

    if items.len() > MAX_ORDER_ITEMS {
        return Err(CoreError::OrderTooLarge {
            max: MAX_ORDER_ITEMS,
        });
    }

    for (idx, item) in items.iter().enumerate() {
        if item.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: format!("items[{idx}].quantity"),
            }
            .into());
        }
        if item.quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: item.quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Catalog Validation
// =============================================================================

/// Validates product input before insert/update.
///
/// ## Rules
/// - name non-empty, at most 200 characters
/// - price not negative
/// - stock not negative
pub fn validate_product_input(product: &NewProduct) -> ValidationResult<()> {
    let name = product.name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    if product.price_cents < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "price_cents".to_string(),
        });
    }

    if product.stock < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "stock".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Promotion Validation
// =============================================================================

/// Validates promotion input before insert/update.
///
/// ## Rules
/// - name non-empty, at most 200 characters
/// - value not negative; percentage value at most 100% (10000 bps)
/// - `ends_at` not before `starts_at`
/// - applicable product set non-empty
pub fn validate_promotion_input(promotion: &NewPromotion) -> ValidationResult<()> {
    let name = promotion.name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    if promotion.value_minor < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "value_minor".to_string(),
        });
    }

    if promotion.discount_type == DiscountType::Percentage
        && promotion.value_minor > MAX_PERCENTAGE_BPS
    {
        return Err(ValidationError::OutOfRange {
            field: "value_minor".to_string(),
            min: 0,
            max: MAX_PERCENTAGE_BPS,
        });
    }

    if promotion.ends_at < promotion.starts_at {
        return Err(ValidationError::InvalidFormat {
            field: "ends_at".to_string(),
            reason: "must not be before starts_at".to_string(),
        });
    }

    if promotion.applicable_products.is_empty() {
        return Err(ValidationError::Required {
            field: "applicable_products".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn req(product_id: i64, quantity: i64) -> OrderItemRequest {
        OrderItemRequest {
            product_id,
            quantity,
        }
    }

    #[test]
    fn test_valid_order_request() {
        assert!(validate_order_request(&[req(1, 1), req(2, 999)]).is_ok());
    }

    #[test]
    fn test_empty_order_rejected() {
        let err = validate_order_request(&[]).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_zero_and_negative_quantity_rejected() {
        for qty in [0, -1, -50] {
            let err = validate_order_request(&[req(1, qty)]).unwrap_err();
            assert!(
                matches!(err, CoreError::Validation(ValidationError::MustBePositive { .. })),
                "quantity {qty} should be rejected"
            );
        }
    }

    #[test]
    fn test_quantity_cap() {
        let err = validate_order_request(&[req(1, MAX_ITEM_QUANTITY + 1)]).unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { .. }));
    }

    #[test]
    fn test_too_many_items() {
        let items: Vec<_> = (0..=MAX_ORDER_ITEMS as i64).map(|i| req(i, 1)).collect();
        let err = validate_order_request(&items).unwrap_err();
        assert!(matches!(err, CoreError::OrderTooLarge { .. }));
    }

    #[test]
    fn test_product_input() {
        let good = NewProduct {
            name: "Widget".to_string(),
            price_cents: 0,
            stock: 0,
        };
        assert!(validate_product_input(&good).is_ok());

        let bad = NewProduct {
            name: "  ".to_string(),
            ..good.clone()
        };
        assert!(validate_product_input(&bad).is_err());

        let bad = NewProduct {
            price_cents: -1,
            ..good.clone()
        };
        assert!(validate_product_input(&bad).is_err());

        let bad = NewProduct { stock: -1, ..good };
        assert!(validate_product_input(&bad).is_err());
    }

    fn promo_input() -> NewPromotion {
        let now = Utc::now();
        NewPromotion {
            name: "Summer".to_string(),
            discount_type: DiscountType::Percentage,
            value_minor: 5000,
            starts_at: now,
            ends_at: now + Duration::days(30),
            applicable_products: vec![1],
        }
    }

    #[test]
    fn test_promotion_input_valid() {
        assert!(validate_promotion_input(&promo_input()).is_ok());
    }

    #[test]
    fn test_promotion_percentage_capped_at_100() {
        let mut p = promo_input();
        p.value_minor = MAX_PERCENTAGE_BPS;
        assert!(validate_promotion_input(&p).is_ok());

        p.value_minor = MAX_PERCENTAGE_BPS + 1;
        let err = validate_promotion_input(&p).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }

    #[test]
    fn test_promotion_fixed_value_not_capped_at_100() {
        let mut p = promo_input();
        p.discount_type = DiscountType::Fixed;
        p.value_minor = 50_000; // 500.00 off is fine for a fixed discount
        assert!(validate_promotion_input(&p).is_ok());
    }

    #[test]
    fn test_promotion_window_must_be_ordered() {
        let mut p = promo_input();
        p.ends_at = p.starts_at - Duration::seconds(1);
        let err = validate_promotion_input(&p).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));

        // zero-length window is allowed (single-instant promotion)
        let mut p = promo_input();
        p.ends_at = p.starts_at;
        assert!(validate_promotion_input(&p).is_ok());
    }

    #[test]
    fn test_promotion_needs_products() {
        let mut p = promo_input();
        p.applicable_products.clear();
        let err = validate_promotion_input(&p).unwrap_err();
        assert!(matches!(err, ValidationError::Required { .. }));
    }
}
