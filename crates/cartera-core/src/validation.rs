//! # Validation Module
//!
//! Input validation utilities for Cartera.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Application screens (outside this workspace)                 │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Ledger operations (Rust)                                     │
//! │  ├── THIS MODULE: input validation before any write                    │
//! │  └── Status/balance rules in types.rs                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (codes, one commission per collection)         │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_LINE_QUANTITY, MAX_SALE_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a registry name (representative, client, or product).
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

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

    Ok(())
}

/// Validates a carrier tracking reference.
///
/// ## Rules
/// - Must not be empty (assigning tracking is what ships a sale)
/// - Must be at most 100 characters
///
/// ## Returns
/// The trimmed reference.
pub fn validate_tracking_ref(tracking: &str) -> ValidationResult<String> {
    let tracking = tracking.trim();

    if tracking.is_empty() {
        return Err(ValidationError::Required {
            field: "tracking_ref".to_string(),
        });
    }

    if tracking.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "tracking_ref".to_string(),
            max: 100,
        });
    }

    Ok(tracking.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (9999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (samples and promotional stock)
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a collection tender (cash and check portions).
///
/// ## Rules
/// - Neither portion may be negative
/// - The combined total must be positive: a collection that moves no
///   money is meaningless
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Collection Entry                                                       │
/// │                                                                         │
/// │  cash: $150.00   check: $250.00                                         │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_tender(15000, 25000) ← THIS FUNCTION                          │
/// │       │                                                                 │
/// │       ├── either < 0?  → Error: out of range                            │
/// │       │                                                                 │
/// │       ├── sum == 0?    → Error: "collection total must be positive"     │
/// │       │                                                                 │
/// │       └── OK → proceed to the overpayment guard                         │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_tender(cash_cents: i64, check_cents: i64) -> ValidationResult<()> {
    if cash_cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "cash amount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    if check_cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "check amount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    if cash_cents + check_cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "collection total".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of line items on a sale.
///
/// ## Rules
/// - At least one line (an empty sale has no total to collect)
/// - Must not exceed MAX_SALE_LINES (100)
pub fn validate_sale_lines(line_count: usize) -> ValidationResult<()> {
    if line_count == 0 {
        return Err(ValidationError::Required {
            field: "line items".to_string(),
        });
    }

    if line_count > MAX_SALE_LINES {
        return Err(ValidationError::OutOfRange {
            field: "line items".to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Rules
/// - Must be a valid UUID format
/// - 36 characters with hyphens: xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx
///
/// ## Example
/// ```rust
/// use cartera_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Farmacia San Rafael").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_tracking_ref() {
        assert_eq!(validate_tracking_ref("  TRK-88 ").unwrap(), "TRK-88");
        assert!(validate_tracking_ref("").is_err());
        assert!(validate_tracking_ref(&"X".repeat(150)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(9_999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(10_000).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(2_500).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_tender() {
        assert!(validate_tender(15_000, 25_000).is_ok());
        assert!(validate_tender(15_000, 0).is_ok());
        assert!(validate_tender(0, 25_000).is_ok());

        // Zero-money collection
        assert!(validate_tender(0, 0).is_err());
        // Negative portions, even when the sum is positive
        assert!(validate_tender(-100, 200).is_err());
        assert!(validate_tender(200, -100).is_err());
    }

    #[test]
    fn test_validate_sale_lines() {
        assert!(validate_sale_lines(1).is_ok());
        assert!(validate_sale_lines(100).is_ok());

        assert!(validate_sale_lines(0).is_err());
        assert!(validate_sale_lines(101).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
        assert!(validate_uuid("123").is_err());
    }
}
