//! Domain layer: Core types and pure logic.
//!
//! Feature schemas, value coercion, row vectorization and risk bucketing.
//! Nothing in here performs I/O.

mod analysis;
mod artifact;
mod coerce;
mod risk;
mod vectorize;

pub use analysis::{
    schema_for, AnalysisType, UnknownAnalysisType, DIABETES_FEATURES, HEART_DERIVED_FEATURES,
    HEART_FEATURES,
};
pub use artifact::{ArtifactError, InferenceError};
pub use coerce::{coerce, CoercionError, FeatureValue, RawFeatureMap};
pub use risk::{bucket, RiskCategory, LOW_RISK_BELOW, MEDIUM_RISK_BELOW};
pub use vectorize::{bounds, vectorize, FeatureRow, Vectorized, AGE_YEARS_CUTOFF};
