//! Analysis types and their feature schemas.
//!
//! The schema order is the column order the classifiers were trained on and
//! must be preserved exactly when building a row.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Requested analysis type is outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown analysis_type '{0}'")]
pub struct UnknownAnalysisType(pub String);

/// Condition a prediction request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    /// Cardiovascular disease
    Heart,
    /// Type 2 diabetes
    Diabetes,
}

/// Cardiovascular schema.
/// age, gender, height (cm), weight (kg), systolic, diastolic, cholesterol (1-3),
/// glucose (1-3), smoking, alcohol, physical activity.
pub const HEART_FEATURES: [&str; 11] = [
    "age",
    "gender",
    "height",
    "weight",
    "ap_hi",
    "ap_lo",
    "cholesterol",
    "gluc",
    "smoke",
    "alco",
    "active",
];

/// Features computed during normalization and appended after the heart schema.
pub const HEART_DERIVED_FEATURES: [&str; 1] = ["ap_diff"];

/// Diabetes schema (lipid panel plus kidney markers).
pub const DIABETES_FEATURES: [&str; 9] = [
    "Age", "Gender", "BMI", "Chol", "TG", "HDL", "LDL", "Cr", "BUN",
];

impl AnalysisType {
    /// Every supported analysis type, in registry order.
    pub const ALL: [AnalysisType; 2] = [AnalysisType::Heart, AnalysisType::Diabetes];

    /// Wire name of the analysis type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heart => "heart",
            Self::Diabetes => "diabetes",
        }
    }

    /// Ordered list of required input features.
    #[must_use]
    pub fn schema(&self) -> &'static [&'static str] {
        match self {
            Self::Heart => &HEART_FEATURES,
            Self::Diabetes => &DIABETES_FEATURES,
        }
    }

    /// Features appended to the row after the schema fields.
    #[must_use]
    pub fn derived_features(&self) -> &'static [&'static str] {
        match self {
            Self::Heart => &HEART_DERIVED_FEATURES,
            Self::Diabetes => &[],
        }
    }

    /// Number of values in a vectorized row (schema + derived).
    #[must_use]
    pub fn row_width(&self) -> usize {
        self.schema().len() + self.derived_features().len()
    }

    /// Column names of a vectorized row, in order.
    pub fn row_columns(&self) -> impl Iterator<Item = &'static str> {
        self.schema()
            .iter()
            .chain(self.derived_features().iter())
            .copied()
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = UnknownAnalysisType;

    /// Exact match on the wire name. Callers that accept user text should
    /// trim and lowercase first.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heart" => Ok(Self::Heart),
            "diabetes" => Ok(Self::Diabetes),
            other => Err(UnknownAnalysisType(other.to_string())),
        }
    }
}

/// Look up the ordered schema for an analysis type given by name.
///
/// # Errors
/// Returns `UnknownAnalysisType` if `analysis` is not a supported type.
pub fn schema_for(analysis: &str) -> Result<&'static [&'static str], UnknownAnalysisType> {
    analysis.parse::<AnalysisType>().map(|a| a.schema())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_order_is_stable() {
        let heart = schema_for("heart").expect("heart schema");
        assert_eq!(heart.len(), 11);
        assert_eq!(heart[0], "age");
        assert_eq!(heart[4], "ap_hi");
        assert_eq!(heart[10], "active");

        let diabetes = schema_for("diabetes").expect("diabetes schema");
        assert_eq!(diabetes, &["Age", "Gender", "BMI", "Chol", "TG", "HDL", "LDL", "Cr", "BUN"]);
    }

    #[test]
    fn test_unknown_analysis_type() {
        let err = schema_for("stroke").expect_err("stroke is not supported");
        assert_eq!(err, UnknownAnalysisType("stroke".into()));
        assert_eq!(err.to_string(), "unknown analysis_type 'stroke'");

        // Parsing is exact; normalization belongs to the caller.
        assert!("Heart".parse::<AnalysisType>().is_err());
    }

    #[test]
    fn test_row_layout_includes_derived_features() {
        assert_eq!(AnalysisType::Heart.row_width(), 12);
        assert_eq!(AnalysisType::Diabetes.row_width(), 9);
        assert_eq!(AnalysisType::Heart.row_columns().last(), Some("ap_diff"));
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&AnalysisType::Diabetes).expect("serialize");
        assert_eq!(json, "\"diabetes\"");
        let parsed: AnalysisType = serde_json::from_str("\"heart\"").expect("deserialize");
        assert_eq!(parsed, AnalysisType::Heart);
    }
}
