//! Data-transfer quota classification.
//!
//! The brokerage meters each account's daily data transfer. `UsageSnapshot::classify`
//! turns the raw `(bytes_used, limit_bytes)` pair into the figures the API reports and
//! `QuotaLevel` decides the response status: over the limit, running low, or healthy.
//!
//! Edge cases:
//! - `bytes_used == limit_bytes` counts as over the limit.
//! - A zero or negative limit reports 0% remaining instead of dividing by zero.
use serde::{Deserialize, Serialize};

/// Remaining share (in percent) below which the quota is reported as running low.
pub const LOW_QUOTA_PERCENT: f64 = 10.0;

/// Raw quota counters as reported by the brokerage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaStatus {
    /// Bytes consumed today.
    pub bytes: i64,
    /// Daily byte budget.
    pub limit_bytes: i64,
}

/// Derived view of the quota at the time of a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    /// Bytes consumed.
    pub bytes_used: i64,
    /// Byte budget.
    pub limit_bytes: i64,
    /// `limit_bytes - bytes_used`; negative once over the limit.
    pub remaining_bytes: i64,
    /// Remaining share of the budget, 0-100, rounded to two decimals.
    pub remaining_percent: f64,
    /// Whether the budget is used up.
    pub is_over_limit: bool,
    /// Human-readable notice, set only when over the limit.
    pub warning: Option<String>,
}

/// Coarse quota state driving the API response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaLevel {
    /// Enough budget left.
    Healthy,
    /// Under [`LOW_QUOTA_PERCENT`] left.
    Low,
    /// Budget exhausted.
    Exceeded,
}

impl UsageSnapshot {
    /// Classify the given counters.
    pub fn classify(bytes_used: i64, limit_bytes: i64) -> Self {
        let remaining_bytes = limit_bytes - bytes_used;
        let remaining_percent = if limit_bytes > 0 {
            round2(remaining_bytes as f64 / limit_bytes as f64 * 100.0)
        } else {
            0.0
        };
        let is_over_limit = bytes_used >= limit_bytes;
        let warning = is_over_limit
            .then(|| format!("quota exceeded: {}/{}", bytes_used, limit_bytes));

        UsageSnapshot {
            bytes_used,
            limit_bytes,
            remaining_bytes,
            remaining_percent,
            is_over_limit,
            warning,
        }
    }

    /// Quota state for this snapshot.
    pub fn level(&self) -> QuotaLevel {
        if self.is_over_limit {
            QuotaLevel::Exceeded
        } else if self.remaining_percent < LOW_QUOTA_PERCENT {
            QuotaLevel::Low
        } else {
            QuotaLevel::Healthy
        }
    }
}

impl From<QuotaStatus> for UsageSnapshot {
    fn from(status: QuotaStatus) -> Self {
        UsageSnapshot::classify(status.bytes, status.limit_bytes)
    }
}

/// Round to two decimal places, ties to even on the exact binary value.
///
/// `value * 100.0` can land on a `.5` that the exact product does not; the fused
/// residual tells which side of the tie the true product lies on.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    let residual = value.mul_add(100.0, -scaled);
    let mut rounded = scaled.round_ties_even();
    let diff = scaled - rounded;
    if diff == 0.5 && residual > 0.0 {
        rounded += 1.0;
    } else if diff == -0.5 && residual < 0.0 {
        rounded -= 1.0;
    }
    rounded / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_percent_matches_rounded_ratio() {
        let cases = [
            (0, 100, 100.0),
            (1, 3, 66.67),
            (95, 100, 5.0),
            (2, 7, 71.43),
            (512, 1024, 50.0),
            (150, 100, -50.0),
        ];
        for (used, limit, expected) in cases {
            let snapshot = UsageSnapshot::classify(used, limit);
            assert_eq!(snapshot.remaining_percent, expected, "{}/{}", used, limit);
            assert_eq!(snapshot.remaining_bytes, limit - used);
        }
    }

    #[test]
    fn two_decimal_rounding() {
        assert_eq!(UsageSnapshot::classify(1, 3).remaining_percent, 66.67);
        assert_eq!(UsageSnapshot::classify(2, 3).remaining_percent, 33.33);
    }

    #[test]
    fn halfway_percentages_round_to_even() {
        assert_eq!(UsageSnapshot::classify(799, 800).remaining_percent, 0.12);
        assert_eq!(UsageSnapshot::classify(3, 800).remaining_percent, 99.62);
        assert_eq!(UsageSnapshot::classify(1, 800).remaining_percent, 99.88);
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
    }

    #[test]
    fn non_positive_limit_reports_zero_percent() {
        for (used, limit) in [(0, 0), (5, 0), (-10, -5), (-1, 0)] {
            let snapshot = UsageSnapshot::classify(used, limit);
            assert_eq!(snapshot.remaining_percent, 0.0);
            assert_eq!(snapshot.is_over_limit, used >= limit);
        }
    }

    #[test]
    fn equality_is_over_limit() {
        let snapshot = UsageSnapshot::classify(100, 100);
        assert!(snapshot.is_over_limit);
        assert_eq!(snapshot.warning.as_deref(), Some("quota exceeded: 100/100"));
        assert_eq!(snapshot.level(), QuotaLevel::Exceeded);
    }

    #[test]
    fn levels_follow_thresholds() {
        assert_eq!(UsageSnapshot::classify(95, 100).level(), QuotaLevel::Low);
        assert_eq!(UsageSnapshot::classify(90, 100).level(), QuotaLevel::Healthy);
        assert_eq!(UsageSnapshot::classify(10, 100).level(), QuotaLevel::Healthy);
        assert!(UsageSnapshot::classify(10, 100).warning.is_none());
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let json = serde_json::to_value(UsageSnapshot::classify(95, 100)).unwrap();
        assert_eq!(json["bytesUsed"], 95);
        assert_eq!(json["remainingPercent"], 5.0);
        assert_eq!(json["isOverLimit"], false);
    }
}
