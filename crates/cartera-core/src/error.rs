//! # Error Types
//!
//! Domain-specific error types for cartera-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cartera-core errors (this file)                                       │
//! │  ├── CoreError        - Ledger rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  cartera-db errors (separate crate)                                    │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── LedgerError      - Domain | Storage, what repository callers see  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → Caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, amounts, states)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Ledger rule violations.
///
/// These errors represent business rule failures the caller can act on.
/// A rejected operation leaves no partial writes behind.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A collection would push a sale's outstanding balance below zero.
    ///
    /// ## When This Occurs
    /// - Creating a collection larger than the sale's available remainder
    ///   (outstanding minus other still-pending collections)
    /// - Confirming a collection after a racing confirmation already
    ///   consumed the balance
    ///
    /// ## User Workflow
    /// ```text
    /// Sale V000000042: outstanding $500.00
    ///      │
    ///      ▼
    /// Collection for $600.00
    ///      │
    ///      ▼
    /// Overpayment { sale_id, outstanding_cents: 50000, requested_cents: 60000 }
    ///      │
    ///      ▼
    /// Entry screen shows: "only $500.00 remains on this sale"
    /// ```
    #[error(
        "collection of {requested_cents} exceeds remaining {outstanding_cents} on sale {sale_id}"
    )]
    Overpayment {
        sale_id: String,
        outstanding_cents: i64,
        requested_cents: i64,
    },

    /// A sale line requested more units than the product has in stock.
    /// Any line failing this check aborts the whole sale creation.
    #[error("insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// The entity is not in a state that allows the requested transition.
    ///
    /// ## When This Occurs
    /// - Moving a sale backward (shipped → pending)
    /// - Requesting completed while money is still owed
    /// - Confirming or voiding a non-pending collection
    /// - Reversing a collection that was never confirmed
    #[error("{entity} {id} is {from}, cannot move to {to}")]
    InvalidTransition {
        entity: &'static str,
        id: String,
        from: &'static str,
        to: &'static str,
    },

    /// Days elapsed between sale and collection fall outside every aging
    /// bucket. Never silently defaulted; the confirmation aborts.
    #[error("{days} days since sale fit no aging bucket (0-120 supported)")]
    UnclassifiedAging { days: i64 },

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before ledger logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::Overpayment {
            sale_id: "V000000042".to_string(),
            outstanding_cents: 50_000,
            requested_cents: 60_000,
        };
        assert_eq!(
            err.to_string(),
            "collection of 60000 exceeds remaining 50000 on sale V000000042"
        );

        let err = CoreError::InvalidTransition {
            entity: "sale",
            id: "s1".to_string(),
            from: "voided",
            to: "shipped",
        };
        assert_eq!(err.to_string(), "sale s1 is voided, cannot move to shipped");

        let err = CoreError::UnclassifiedAging { days: 121 };
        assert_eq!(
            err.to_string(),
            "121 days since sale fit no aging bucket (0-120 supported)"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "line items".to_string(),
        };
        assert_eq!(err.to_string(), "line items is required");

        let err = ValidationError::MustBePositive {
            field: "collection total".to_string(),
        };
        assert_eq!(err.to_string(), "collection total must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "client_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
