//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports: loaded artifacts, the
//! model registry and the request-level assessment service.

mod artifact;
mod assessment;
mod registry;

pub use artifact::{
    resolve_positive_class_index, Classifier, ModelArtifact, DEFAULT_POSITIVE_CLASS_INDEX,
    POSITIVE_LABEL,
};
pub use assessment::{Assessment, AssessmentRequest, AssessmentService, HealthReport};
pub use registry::{ModelRegistry, Prediction, RegistryError, PROBABILITY_NOT_COMPUTED};
