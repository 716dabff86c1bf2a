//! # Aging Buckets & Rate Schedule
//!
//! Classifies how old a sale is when a collection lands on it, and maps
//! that age class to the commission rate a representative earns.
//!
//! ## The Bucket Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  days = collected_on − issued_on (whole days)                           │
//! │                                                                         │
//! │  Bucket A    0-30 days    "fresh"              default rate 10.00%     │
//! │  Bucket B   31-60 days    "aging"              default rate  7.00%     │
//! │  Bucket C   61-90 days    "overdue"            default rate  5.00%     │
//! │  Bucket D  91-120 days    "severely overdue"   default rate  2.00%     │
//! │                                                                         │
//! │  Anything else is an UnclassifiedAging ERROR.                          │
//! │  Collecting faster pays more; that is the whole incentive scheme.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why an Error Instead of a Default Bucket?
//! A collection dated before its sale, or more than 120 days after it, is
//! bad data. Paying bucket D (or worse, bucket A) on it would silently
//! corrupt settlements, so classification refuses and the confirmation
//! aborts. Someone has to look at the record.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::types::CommissionRate;

// =============================================================================
// Aging Bucket
// =============================================================================

/// Day-range class of a sale's age at collection time.
///
/// Stored on every commission as a snapshot, so reports can show which
/// band a payout came from even after the schedule changes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum AgingBucket {
    /// 0-30 days: fresh.
    A,
    /// 31-60 days: aging.
    B,
    /// 61-90 days: overdue.
    C,
    /// 91-120 days: severely overdue.
    D,
}

impl AgingBucket {
    /// Classifies a day count into its bucket.
    ///
    /// ## Example
    /// ```rust
    /// use cartera_core::aging::AgingBucket;
    ///
    /// assert_eq!(AgingBucket::classify(10).unwrap(), AgingBucket::A);
    /// assert_eq!(AgingBucket::classify(45).unwrap(), AgingBucket::B);
    /// assert!(AgingBucket::classify(121).is_err());
    /// ```
    pub fn classify(days: i64) -> CoreResult<Self> {
        match days {
            0..=30 => Ok(AgingBucket::A),
            31..=60 => Ok(AgingBucket::B),
            61..=90 => Ok(AgingBucket::C),
            91..=120 => Ok(AgingBucket::D),
            _ => Err(CoreError::UnclassifiedAging { days }),
        }
    }

    /// Human label for reports.
    pub const fn label(self) -> &'static str {
        match self {
            AgingBucket::A => "fresh",
            AgingBucket::B => "aging",
            AgingBucket::C => "overdue",
            AgingBucket::D => "severely overdue",
        }
    }
}

impl fmt::Display for AgingBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            AgingBucket::A => "A",
            AgingBucket::B => "B",
            AgingBucket::C => "C",
            AgingBucket::D => "D",
        };
        f.write_str(letter)
    }
}

// =============================================================================
// Rate Schedule
// =============================================================================

/// Commission rate per aging bucket, in basis points.
///
/// Deployments provide this as JSON configuration with bucket-letter keys:
///
/// ```json
/// { "A": 1000, "B": 700, "C": 500, "D": 200 }
/// ```
///
/// The engine never hardcodes rates; [`RateSchedule::default`] exists for
/// development and tests. Rates are frozen onto each commission at
/// confirmation time, so editing the schedule only affects future
/// confirmations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSchedule {
    #[serde(rename = "A")]
    a_bps: u32,
    #[serde(rename = "B")]
    b_bps: u32,
    #[serde(rename = "C")]
    c_bps: u32,
    #[serde(rename = "D")]
    d_bps: u32,
}

impl RateSchedule {
    /// Builds a schedule from per-bucket rates in basis points.
    pub const fn new(a_bps: u32, b_bps: u32, c_bps: u32, d_bps: u32) -> Self {
        RateSchedule {
            a_bps,
            b_bps,
            c_bps,
            d_bps,
        }
    }

    /// Returns the rate for a bucket.
    ///
    /// Total over all buckets: a classified collection always has a rate.
    pub const fn rate_for(&self, bucket: AgingBucket) -> CommissionRate {
        let bps = match bucket {
            AgingBucket::A => self.a_bps,
            AgingBucket::B => self.b_bps,
            AgingBucket::C => self.c_bps,
            AgingBucket::D => self.d_bps,
        };
        CommissionRate::from_bps(bps)
    }
}

/// Development/test schedule: 10% / 7% / 5% / 2%.
impl Default for RateSchedule {
    fn default() -> Self {
        RateSchedule::new(1000, 700, 500, 200)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Boundary grid: both ends of every band, plus the two rejects.
    #[test]
    fn test_classify_boundaries() {
        assert_eq!(AgingBucket::classify(0).unwrap(), AgingBucket::A);
        assert_eq!(AgingBucket::classify(30).unwrap(), AgingBucket::A);
        assert_eq!(AgingBucket::classify(31).unwrap(), AgingBucket::B);
        assert_eq!(AgingBucket::classify(60).unwrap(), AgingBucket::B);
        assert_eq!(AgingBucket::classify(61).unwrap(), AgingBucket::C);
        assert_eq!(AgingBucket::classify(90).unwrap(), AgingBucket::C);
        assert_eq!(AgingBucket::classify(91).unwrap(), AgingBucket::D);
        assert_eq!(AgingBucket::classify(120).unwrap(), AgingBucket::D);
    }

    #[test]
    fn test_classify_rejects_out_of_range() {
        let err = AgingBucket::classify(121).unwrap_err();
        assert!(matches!(err, CoreError::UnclassifiedAging { days: 121 }));

        // Collection dated before the sale
        let err = AgingBucket::classify(-1).unwrap_err();
        assert!(matches!(err, CoreError::UnclassifiedAging { days: -1 }));
    }

    #[test]
    fn test_labels() {
        assert_eq!(AgingBucket::A.label(), "fresh");
        assert_eq!(AgingBucket::D.label(), "severely overdue");
        assert_eq!(AgingBucket::B.to_string(), "B");
    }

    #[test]
    fn test_default_schedule_rates() {
        let schedule = RateSchedule::default();
        assert_eq!(schedule.rate_for(AgingBucket::A).bps(), 1000);
        assert_eq!(schedule.rate_for(AgingBucket::B).bps(), 700);
        assert_eq!(schedule.rate_for(AgingBucket::C).bps(), 500);
        assert_eq!(schedule.rate_for(AgingBucket::D).bps(), 200);
    }

    #[test]
    fn test_custom_schedule() {
        let schedule = RateSchedule::new(1000, 700, 0, 0);
        assert_eq!(schedule.rate_for(AgingBucket::A).percentage(), 10.0);
        assert_eq!(schedule.rate_for(AgingBucket::B).percentage(), 7.0);
        assert!(schedule.rate_for(AgingBucket::C).is_zero());
    }

    /// The deployment configuration contract: bucket-letter keys.
    #[test]
    fn test_schedule_deserializes_from_config_json() {
        let schedule: RateSchedule =
            serde_json::from_str(r#"{ "A": 1200, "B": 800, "C": 400, "D": 100 }"#).unwrap();
        assert_eq!(schedule, RateSchedule::new(1200, 800, 400, 100));
    }
}
