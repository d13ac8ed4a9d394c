//! Risk categories derived from a positive-class probability.

use serde::{Deserialize, Serialize};

/// Probabilities below this are low risk.
pub const LOW_RISK_BELOW: f64 = 0.33;

/// Probabilities below this (and not low) are medium risk.
pub const MEDIUM_RISK_BELOW: f64 = 0.66;

/// Discretized risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl RiskCategory {
    /// Bucket a probability. Boundaries belong to the higher bucket.
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        if probability < LOW_RISK_BELOW {
            Self::Low
        } else if probability < MEDIUM_RISK_BELOW {
            Self::Medium
        } else {
            Self::High
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// User-facing advice for this category.
    #[must_use]
    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::Low => "Low risk. Keep up a healthy lifestyle.",
            Self::Medium => "Moderate risk. Regular check-ups are recommended.",
            Self::High => "High risk! An in-person consultation is advised.",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a probability to its risk category.
#[must_use]
pub fn bucket(probability: f64) -> RiskCategory {
    RiskCategory::from_probability(probability)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(bucket(0.0), RiskCategory::Low);
        assert_eq!(bucket(0.329), RiskCategory::Low);
        assert_eq!(bucket(0.33), RiskCategory::Medium);
        assert_eq!(bucket(0.659), RiskCategory::Medium);
        assert_eq!(bucket(0.66), RiskCategory::High);
        assert_eq!(bucket(1.0), RiskCategory::High);
    }

    #[test]
    fn test_bucket_out_of_range() {
        assert_eq!(bucket(-1.0), RiskCategory::Low);
        assert_eq!(bucket(1.5), RiskCategory::High);
        assert_eq!(bucket(f64::NAN), RiskCategory::High);
    }

    #[test]
    fn test_category_wire_format() {
        assert_eq!(RiskCategory::Medium.to_string(), "medium");
        let json = serde_json::to_string(&RiskCategory::High).expect("serialize");
        assert_eq!(json, "\"high\"");
        assert!(RiskCategory::Low.recommendation().starts_with("Low risk"));
    }
}
