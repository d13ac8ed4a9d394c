//! Assessment service: request handling on top of the model registry.
//!
//! This service coordinates:
//! - Analysis type normalization
//! - Model selection and inference
//! - Risk bucketing and advice
//!
//! Raw feature values never reach the logs, only names and outcomes.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{AnalysisType, RawFeatureMap, RiskCategory};
use crate::VitalriskError;

use super::registry::{ModelRegistry, RegistryError};

/// One prediction request as received from a front-end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub analysis_type: String,
    #[serde(default)]
    pub features: RawFeatureMap,
    #[serde(default)]
    pub model: Option<String>,
}

/// Completed risk assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub analysis_type: AnalysisType,
    pub model: String,
    pub risk: f64,
    pub risk_category: RiskCategory,
    pub recommendation: String,
}

/// Snapshot of the loaded models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub models: BTreeMap<AnalysisType, Vec<String>>,
    pub defaults: BTreeMap<AnalysisType, String>,
}

/// Service answering assessment and health queries.
#[derive(Debug, Clone)]
pub struct AssessmentService {
    registry: Arc<ModelRegistry>,
}

impl AssessmentService {
    /// Create a new assessment service.
    #[must_use]
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Run one assessment.
    ///
    /// The analysis type is matched case-insensitively after trimming.
    ///
    /// # Errors
    /// - `VitalriskError::MissingFeatures` if any schema field is absent or
    ///   uncoercible
    /// - `VitalriskError::Registry` for unknown types or models, empty
    ///   registries and inference failures
    pub fn assess(&self, request: &AssessmentRequest) -> Result<Assessment, VitalriskError> {
        let analysis_type = request.analysis_type.trim().to_ascii_lowercase();
        let model = request.model.as_deref().map(str::trim);

        let prediction = self
            .registry
            .predict(&analysis_type, model, &request.features)
            .inspect_err(|e| tracing::warn!("Assessment rejected: {}", e))?;

        if !prediction.is_complete() {
            tracing::info!(
                "Assessment incomplete: analysis={} model={} missing={}",
                analysis_type,
                prediction.model_used,
                prediction.missing_fields.join(",")
            );
            return Err(VitalriskError::MissingFeatures(prediction.missing_fields));
        }

        let risk_category = RiskCategory::from_probability(prediction.probability);
        tracing::info!(
            "Assessment complete: analysis={} model={} risk={:.4} category={}",
            analysis_type,
            prediction.model_used,
            prediction.probability,
            risk_category
        );

        // predict() already validated the name.
        let analysis_type: AnalysisType =
            analysis_type.parse().map_err(RegistryError::from)?;
        Ok(Assessment {
            analysis_type,
            model: prediction.model_used,
            risk: prediction.probability,
            risk_category,
            recommendation: risk_category.recommendation().to_string(),
        })
    }

    /// Report loaded models and defaults.
    #[must_use]
    pub fn health(&self) -> HealthReport {
        let defaults = AnalysisType::ALL
            .iter()
            .map(|a| (*a, self.registry.default_for(*a).to_string()))
            .collect();
        HealthReport {
            status: "ok".to_string(),
            models: self.registry.available(),
            defaults,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{JsonArtifactDecoder, MemoryArtifactSource};
    use crate::domain::FeatureValue;

    fn constant(width: usize, score: f64) -> Vec<u8> {
        serde_json::json!({
            "kind": "linear_regressor",
            "coefficients": vec![0.0; width],
            "intercept": score,
        })
        .to_string()
        .into_bytes()
    }

    fn service() -> AssessmentService {
        let source = MemoryArtifactSource::new()
            .with(AnalysisType::Heart, "cautious", constant(12, 0.7))
            .with(AnalysisType::Heart, "relaxed", constant(12, 0.1))
            .with(AnalysisType::Diabetes, "middle", constant(9, 0.5));
        let registry = ModelRegistry::load(&source, &JsonArtifactDecoder::new()).expect("load");
        AssessmentService::new(Arc::new(registry))
    }

    fn heart_request() -> AssessmentRequest {
        let features: RawFeatureMap = serde_json::from_str(
            r#"{
                "age": "52", "gender": 2, "height": 168, "weight": "81,5",
                "ap_hi": 135, "ap_lo": 85, "cholesterol": 2, "gluc": 1,
                "smoke": false, "alco": 0, "active": true
            }"#,
        )
        .expect("features");
        AssessmentRequest {
            analysis_type: " Heart ".to_string(),
            features,
            model: None,
        }
    }

    #[test]
    fn test_assess_uses_default_model() {
        let assessment = service().assess(&heart_request()).expect("assess");
        assert_eq!(assessment.analysis_type, AnalysisType::Heart);
        assert_eq!(assessment.model, "cautious");
        assert!((assessment.risk - 0.7).abs() < 1e-12);
        assert_eq!(assessment.risk_category, RiskCategory::High);
        assert_eq!(assessment.recommendation, RiskCategory::High.recommendation());
    }

    #[test]
    fn test_assess_named_model() {
        let mut request = heart_request();
        request.model = Some("relaxed".to_string());
        let assessment = service().assess(&request).expect("assess");
        assert_eq!(assessment.model, "relaxed");
        assert_eq!(assessment.risk_category, RiskCategory::Low);
    }

    #[test]
    fn test_missing_features_reported_in_schema_order() {
        let mut request = heart_request();
        request.features.remove("ap_lo");
        request
            .features
            .insert("age".to_string(), FeatureValue::Text("n/a".to_string()));

        match service().assess(&request) {
            Err(VitalriskError::MissingFeatures(fields)) => {
                assert_eq!(fields, vec!["age".to_string(), "ap_lo".to_string()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_and_model() {
        let service = service();
        let request = AssessmentRequest {
            analysis_type: "stroke".to_string(),
            ..AssessmentRequest::default()
        };
        assert!(matches!(
            service.assess(&request),
            Err(VitalriskError::Registry(RegistryError::UnknownAnalysisType(_)))
        ));

        let mut request = heart_request();
        request.model = Some("nope".to_string());
        assert!(matches!(
            service.assess(&request),
            Err(VitalriskError::Registry(RegistryError::UnknownModel { .. }))
        ));
    }

    #[test]
    fn test_request_deserializes_without_model() {
        let request: AssessmentRequest = serde_json::from_str(
            r#"{"analysis_type": "diabetes", "features": {"BMI": "27.4"}}"#,
        )
        .expect("parse");
        assert_eq!(request.model, None);
        assert_eq!(request.features.len(), 1);
    }

    #[test]
    fn test_bundled_models() {
        use crate::adapters::DirectoryArtifactSource;

        let source = DirectoryArtifactSource::new("models");
        let registry = ModelRegistry::load(&source, &JsonArtifactDecoder::new())
            .expect("bundled models should load");
        let service = AssessmentService::new(Arc::new(registry));

        let health = service.health();
        assert_eq!(health.models[&AnalysisType::Heart], vec!["logreg", "tree"]);
        assert_eq!(health.models[&AnalysisType::Diabetes], vec!["forest", "quantized"]);

        for model in ["logreg", "tree"] {
            let mut request = heart_request();
            request.model = Some(model.to_string());
            let assessment = service.assess(&request).expect("heart");
            assert!((0.0..=1.0).contains(&assessment.risk), "{model}");
        }

        let features: RawFeatureMap = serde_json::from_str(
            r#"{"Age": 61, "Gender": 1, "BMI": "33,4", "Chol": 5.9, "TG": 2.8,
                "HDL": 0.9, "LDL": 3.4, "Cr": 81, "BUN": 5.6}"#,
        )
        .expect("features");
        for model in ["forest", "quantized"] {
            let request = AssessmentRequest {
                analysis_type: "diabetes".to_string(),
                features: features.clone(),
                model: Some(model.to_string()),
            };
            let assessment = service.assess(&request).expect("diabetes");
            assert!(assessment.risk > 0.5, "{model}: {}", assessment.risk);
        }
    }

    #[test]
    fn test_bundled_diabetes_models_accept_extreme_lab_values() {
        use crate::adapters::DirectoryArtifactSource;

        let source = DirectoryArtifactSource::new("models");
        let registry = ModelRegistry::load(&source, &JsonArtifactDecoder::new())
            .expect("bundled models should load");

        for cr in [81.0, 1e13, 1e15, 1e300] {
            let mut features: RawFeatureMap = serde_json::from_str(
                r#"{"Age": 61, "Gender": 1, "BMI": 33.4, "Chol": 5.9, "TG": 2.8,
                    "HDL": 0.9, "LDL": 3.4, "BUN": 5.6}"#,
            )
            .expect("features");
            features.insert("Cr".to_string(), FeatureValue::Number(cr));

            for model in ["forest", "quantized"] {
                let prediction = registry
                    .predict("diabetes", Some(model), &features)
                    .unwrap_or_else(|e| panic!("{model} with Cr={cr}: {e}"));
                assert!(
                    (0.0..=1.0).contains(&prediction.probability),
                    "{model} with Cr={cr}: {}",
                    prediction.probability
                );
            }
        }
    }

    #[test]
    fn test_health_lists_models_and_defaults() {
        let report = service().health();
        assert_eq!(report.status, "ok");
        assert_eq!(report.models[&AnalysisType::Heart], vec!["cautious", "relaxed"]);
        assert_eq!(report.defaults[&AnalysisType::Diabetes], "middle");

        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["defaults"]["heart"], "cautious");
    }
}
