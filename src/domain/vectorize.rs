//! Row vectorization: raw feature map -> normalized feature row.
//!
//! Normalization is saturating: out-of-range values are pulled to the nearest
//! plausible bound, never rejected. Rounding is round-half-to-even.

use super::analysis::AnalysisType;
use super::coerce::{coerce, RawFeatureMap};

/// Ages below this are read as years and converted to days.
///
/// The heart model was trained on age in days. Values at or above the cutoff
/// are assumed to already be days. Inputs near 150 are ambiguous.
pub const AGE_YEARS_CUTOFF: f64 = 150.0;

const DAYS_PER_YEAR: f64 = 365.0;

/// Closed plausibility bounds.
pub mod bounds {
    pub const HEART_AGE_DAYS: (f64, f64) = (1.0, 45_000.0);
    pub const HEIGHT_CM: (f64, f64) = (50.0, 250.0);
    pub const WEIGHT_KG: (f64, f64) = (20.0, 300.0);
    pub const AP_HI: (f64, f64) = (50.0, 250.0);
    pub const AP_LO: (f64, f64) = (30.0, 200.0);
    pub const ORDINAL_LEVEL: (f64, f64) = (1.0, 3.0);
    pub const DIABETES_AGE_YEARS: (f64, f64) = (1.0, 120.0);
    pub const BMI: (f64, f64) = (10.0, 80.0);
}

// Heart row positions.
const H_AGE: usize = 0;
const H_HEIGHT: usize = 2;
const H_WEIGHT: usize = 3;
const H_AP_HI: usize = 4;
const H_AP_LO: usize = 5;
const H_CHOLESTEROL: usize = 6;
const H_GLUC: usize = 7;
const H_FLAGS: [usize; 3] = [8, 9, 10];

// Diabetes row positions.
const D_AGE: usize = 0;
const D_GENDER: usize = 1;
const D_BMI: usize = 2;

/// Normalized feature values aligned to an analysis type's row layout.
///
/// Only produced by [`vectorize`]; every value is finite and within bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    analysis: AnalysisType,
    values: Vec<f64>,
}

impl FeatureRow {
    #[must_use]
    pub fn analysis(&self) -> AnalysisType {
        self.analysis
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named column (schema or derived feature).
    #[must_use]
    pub fn get(&self, column: &str) -> Option<f64> {
        self.analysis
            .row_columns()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i).copied())
    }

    #[must_use]
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// Outcome of vectorizing a raw map.
#[derive(Debug, Clone, PartialEq)]
pub enum Vectorized {
    /// All fields present and normalized.
    Row(FeatureRow),
    /// Schema fields that were absent or uncoercible, in schema order.
    Missing(Vec<String>),
}

fn clamp(v: f64, (lo, hi): (f64, f64)) -> f64 {
    v.clamp(lo, hi)
}

fn threshold(v: f64) -> f64 {
    if v >= 0.5 {
        1.0
    } else {
        0.0
    }
}

fn normalize_heart(values: &mut Vec<f64>) {
    let mut age = clamp(values[H_AGE], bounds::HEART_AGE_DAYS);
    if age < AGE_YEARS_CUTOFF {
        // Years -> days, re-clamped so 123+ "years" cannot escape the bound.
        age = clamp(age * DAYS_PER_YEAR, bounds::HEART_AGE_DAYS);
    }
    values[H_AGE] = age;

    values[H_HEIGHT] = clamp(values[H_HEIGHT], bounds::HEIGHT_CM);
    values[H_WEIGHT] = clamp(values[H_WEIGHT], bounds::WEIGHT_KG);

    let ap_hi = clamp(values[H_AP_HI], bounds::AP_HI);
    let ap_lo = clamp(values[H_AP_LO], bounds::AP_LO).min(ap_hi - 1.0);
    values[H_AP_HI] = ap_hi;
    values[H_AP_LO] = ap_lo;

    for i in [H_CHOLESTEROL, H_GLUC] {
        values[i] = clamp(values[i].round_ties_even(), bounds::ORDINAL_LEVEL);
    }
    for i in H_FLAGS {
        values[i] = threshold(values[i]);
    }

    values.push(ap_hi - ap_lo);
}

fn normalize_diabetes(values: &mut [f64]) {
    values[D_AGE] = clamp(values[D_AGE], bounds::DIABETES_AGE_YEARS);
    values[D_GENDER] = threshold(values[D_GENDER]);
    values[D_BMI] = clamp(values[D_BMI], bounds::BMI);
}

/// Build a normalized feature row for `analysis` from a raw map.
///
/// If any schema field is absent or cannot be coerced, the missing field
/// names are returned and no normalization is applied.
#[must_use]
pub fn vectorize(analysis: AnalysisType, raw: &RawFeatureMap) -> Vectorized {
    let schema = analysis.schema();
    let mut values = Vec::with_capacity(analysis.row_width());
    let mut missing = Vec::new();

    for &field in schema {
        match raw.get(field).map(coerce) {
            Some(Ok(v)) => values.push(v),
            Some(Err(_)) | None => {
                missing.push(field.to_string());
                values.push(f64::NAN);
            }
        }
    }

    if !missing.is_empty() {
        return Vectorized::Missing(missing);
    }

    match analysis {
        AnalysisType::Heart => normalize_heart(&mut values),
        AnalysisType::Diabetes => normalize_diabetes(&mut values),
    }

    Vectorized::Row(FeatureRow { analysis, values })
}


#[cfg(test)]
mod properties {
    use super::*;
    use crate::domain::{FeatureValue, DIABETES_FEATURES, HEART_FEATURES};
    use proptest::prelude::*;

    fn finite() -> impl Strategy<Value = f64> {
        prop_oneof![
            -1_000.0..100_000.0_f64,
            proptest::num::f64::NORMAL | proptest::num::f64::SUBNORMAL | proptest::num::f64::ZERO,
        ]
    }

    fn feature_value() -> impl Strategy<Value = FeatureValue> {
        prop_oneof![
            finite().prop_map(FeatureValue::Number),
            any::<bool>().prop_map(FeatureValue::Bool),
            finite().prop_map(|v| FeatureValue::Text(format!(" {v} "))),
            finite().prop_map(|v| FeatureValue::Text(v.to_string().replace('.', ","))),
        ]
    }

    fn raw_map(schema: &'static [&'static str]) -> impl Strategy<Value = RawFeatureMap> {
        proptest::collection::vec(feature_value(), schema.len()).prop_map(move |values| {
            schema
                .iter()
                .map(|k| (*k).to_string())
                .zip(values)
                .collect()
        })
    }

    fn row_of(analysis: AnalysisType, raw: &RawFeatureMap) -> FeatureRow {
        match vectorize(analysis, raw) {
            Vectorized::Row(row) => row,
            Vectorized::Missing(m) => panic!("finite inputs reported missing: {m:?}"),
        }
    }

    fn renormalized(row: &FeatureRow) -> FeatureRow {
        let raw: RawFeatureMap = row
            .analysis()
            .schema()
            .iter()
            .zip(row.values())
            .map(|(k, v)| ((*k).to_string(), FeatureValue::Number(*v)))
            .collect();
        row_of(row.analysis(), &raw)
    }

    fn within(v: f64, (lo, hi): (f64, f64)) -> bool {
        v >= lo && v <= hi
    }

    fn column(row: &FeatureRow, name: &str) -> f64 {
        row.get(name).unwrap_or_else(|| panic!("no column {name}"))
    }

    proptest! {
        #[test]
        fn heart_fields_stay_in_bounds(raw in raw_map(&HEART_FEATURES)) {
            let row = row_of(AnalysisType::Heart, &raw);
            prop_assert_eq!(row.len(), AnalysisType::Heart.row_width());
            prop_assert!(row.values().iter().all(|v| v.is_finite()));

            prop_assert!(within(column(&row, "age"), bounds::HEART_AGE_DAYS));
            prop_assert!(within(column(&row, "height"), bounds::HEIGHT_CM));
            prop_assert!(within(column(&row, "weight"), bounds::WEIGHT_KG));
            prop_assert!(within(column(&row, "ap_hi"), bounds::AP_HI));
            prop_assert!(within(column(&row, "ap_lo"), bounds::AP_LO));
            for name in ["cholesterol", "gluc"] {
                let v = column(&row, name);
                prop_assert!(v == 1.0 || v == 2.0 || v == 3.0, "{} = {}", name, v);
            }
            for name in ["smoke", "alco", "active"] {
                let v = column(&row, name);
                prop_assert!(v == 0.0 || v == 1.0, "{} = {}", name, v);
            }
        }

        #[test]
        fn heart_pressure_ordering_and_difference(raw in raw_map(&HEART_FEATURES)) {
            let row = row_of(AnalysisType::Heart, &raw);
            let ap_hi = column(&row, "ap_hi");
            let ap_lo = column(&row, "ap_lo");
            prop_assert!(ap_lo < ap_hi, "ap_lo {} >= ap_hi {}", ap_lo, ap_hi);
            prop_assert_eq!(column(&row, "ap_diff"), ap_hi - ap_lo);
        }

        #[test]
        fn heart_vectorize_is_idempotent(raw in raw_map(&HEART_FEATURES)) {
            let first = row_of(AnalysisType::Heart, &raw);
            prop_assert_eq!(renormalized(&first), first);
        }

        #[test]
        fn diabetes_fields_stay_in_bounds(raw in raw_map(&DIABETES_FEATURES)) {
            let row = row_of(AnalysisType::Diabetes, &raw);
            prop_assert_eq!(row.len(), AnalysisType::Diabetes.row_width());
            prop_assert!(within(column(&row, "Age"), bounds::DIABETES_AGE_YEARS));
            prop_assert!(within(column(&row, "BMI"), bounds::BMI));
            let gender = column(&row, "Gender");
            prop_assert!(gender == 0.0 || gender == 1.0);
        }

        #[test]
        fn diabetes_vectorize_is_idempotent(raw in raw_map(&DIABETES_FEATURES)) {
            let first = row_of(AnalysisType::Diabetes, &raw);
            prop_assert_eq!(renormalized(&first), first);
        }
    }
}
