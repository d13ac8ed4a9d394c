//! Model registry: loads every artifact once and serves predictions.
//!
//! The registry is built in a single fallible pass and is immutable
//! afterwards. Share it behind an `Arc`; all queries take `&self`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{
    vectorize, AnalysisType, ArtifactError, InferenceError, RawFeatureMap, RiskCategory,
    UnknownAnalysisType, Vectorized,
};
use crate::ports::{ArtifactDecoder, ArtifactSource};

use super::artifact::ModelArtifact;

/// Probability reported when no inference was run.
pub const PROBABILITY_NOT_COMPUTED: f64 = -1.0;

/// Error type for registry construction and queries.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    UnknownAnalysisType(#[from] UnknownAnalysisType),

    #[error("no models for analysis_type '{0}'")]
    NoModelsAvailable(AnalysisType),

    #[error("unknown model '{model}' for analysis_type '{analysis}'")]
    UnknownModel { model: String, analysis: AnalysisType },

    #[error("failed to load model artifacts: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("model '{model}' failed during inference: {source}")]
    Inference {
        model: String,
        #[source]
        source: InferenceError,
    },
}

/// Outcome of [`ModelRegistry::predict`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Positive-class probability, or `-1.0` when fields are missing.
    pub probability: f64,
    /// Model that was (or would have been) used.
    pub model_used: String,
    /// Schema fields that were absent or uncoercible.
    pub missing_fields: Vec<String>,
}

impl Prediction {
    /// Whether inference actually ran.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_fields.is_empty()
    }

    /// Risk category, only for complete predictions.
    #[must_use]
    pub fn risk_category(&self) -> Option<RiskCategory> {
        self.is_complete()
            .then(|| RiskCategory::from_probability(self.probability))
    }
}

/// Models of one analysis type, in discovery order.
#[derive(Debug, Default)]
struct ModelPool {
    order: Vec<String>,
    models: BTreeMap<String, ModelArtifact>,
}

impl ModelPool {
    fn default_name(&self) -> &str {
        self.order.first().map(String::as_str).unwrap_or("")
    }
}

/// Immutable mapping of analysis type -> loaded models.
#[derive(Debug)]
pub struct ModelRegistry {
    pools: BTreeMap<AnalysisType, ModelPool>,
}

impl ModelRegistry {
    /// Discover and decode every artifact for every analysis type.
    ///
    /// Any failure aborts loading; a partially loaded registry is never
    /// returned.
    ///
    /// # Errors
    /// Returns `RegistryError::Artifact` if discovery, decoding or layout
    /// validation fails for any artifact.
    pub fn load(
        source: &dyn ArtifactSource,
        decoder: &dyn ArtifactDecoder,
    ) -> Result<Self, RegistryError> {
        tracing::info!("Loading model artifacts from {}", source.describe());

        let mut pools = BTreeMap::new();
        for analysis in AnalysisType::ALL {
            let mut blobs = source.discover(analysis)?;
            blobs.sort_by(|a, b| a.identifier.cmp(&b.identifier));

            let mut pool = ModelPool::default();
            for blob in blobs {
                if pool.models.contains_key(&blob.name) {
                    return Err(ArtifactError::DuplicateName {
                        name: blob.name,
                        analysis,
                    }
                    .into());
                }
                let decoded = decoder.decode(&blob)?;
                let artifact = ModelArtifact::new(blob.name.clone(), analysis, decoded)?;
                tracing::debug!("Loaded {:?}", artifact);
                pool.order.push(blob.name.clone());
                pool.models.insert(blob.name, artifact);
            }

            if pool.order.is_empty() {
                tracing::warn!("No models available for analysis_type '{}'", analysis);
            } else {
                tracing::info!(
                    "Loaded {} model(s) for '{}' (default: {})",
                    pool.order.len(),
                    analysis,
                    pool.default_name()
                );
            }
            pools.insert(analysis, pool);
        }

        Ok(Self { pools })
    }

    fn pool(&self, analysis: AnalysisType) -> Option<&ModelPool> {
        self.pools.get(&analysis)
    }

    /// Model names per analysis type, in discovery order.
    #[must_use]
    pub fn available(&self) -> BTreeMap<AnalysisType, Vec<String>> {
        AnalysisType::ALL
            .iter()
            .map(|a| {
                let names = self.pool(*a).map(|p| p.order.clone()).unwrap_or_default();
                (*a, names)
            })
            .collect()
    }

    /// Default model name, or an empty string if none were loaded.
    #[must_use]
    pub fn default_for(&self, analysis: AnalysisType) -> &str {
        self.pool(analysis).map(ModelPool::default_name).unwrap_or("")
    }

    /// Look up a loaded artifact.
    #[must_use]
    pub fn get(&self, analysis: AnalysisType, model: &str) -> Option<&ModelArtifact> {
        self.pool(analysis).and_then(|p| p.models.get(model))
    }

    /// Predict for an analysis type given by its wire name.
    ///
    /// # Errors
    /// See [`ModelRegistry::predict_for`]; additionally
    /// `RegistryError::UnknownAnalysisType` for unsupported names.
    pub fn predict(
        &self,
        analysis: &str,
        model: Option<&str>,
        features: &RawFeatureMap,
    ) -> Result<Prediction, RegistryError> {
        let analysis: AnalysisType = analysis.parse()?;
        self.predict_for(analysis, model, features)
    }

    /// Vectorize `features` and run the selected model.
    ///
    /// `model` of `None` (or empty) selects the analysis type's default. When
    /// fields are missing no model is invoked; the result carries the
    /// missing names and a probability of `-1.0`.
    ///
    /// # Errors
    /// - `RegistryError::NoModelsAvailable` if nothing was loaded for the type
    /// - `RegistryError::UnknownModel` if the named model is not loaded
    /// - `RegistryError::Inference` if the classifier rejects the row
    pub fn predict_for(
        &self,
        analysis: AnalysisType,
        model: Option<&str>,
        features: &RawFeatureMap,
    ) -> Result<Prediction, RegistryError> {
        let pool = self
            .pool(analysis)
            .filter(|p| !p.order.is_empty())
            .ok_or(RegistryError::NoModelsAvailable(analysis))?;

        let name = model
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| pool.default_name());
        let artifact = pool
            .models
            .get(name)
            .ok_or_else(|| RegistryError::UnknownModel {
                model: name.to_string(),
                analysis,
            })?;

        let row = match vectorize(analysis, features) {
            Vectorized::Row(row) => row,
            Vectorized::Missing(missing_fields) => {
                return Ok(Prediction {
                    probability: PROBABILITY_NOT_COMPUTED,
                    model_used: name.to_string(),
                    missing_fields,
                });
            }
        };

        let probability =
            artifact
                .positive_class_probability(&row)
                .map_err(|source| RegistryError::Inference {
                    model: name.to_string(),
                    source,
                })?;

        Ok(Prediction {
            probability,
            model_used: name.to_string(),
            missing_fields: Vec::new(),
        })
    }
}
