//! # Vitalrisk
//!
//! Risk scoring core for heart and diabetes analyses.
//!
//! This crate provides:
//! - Feature schemas, value coercion and row normalization
//! - Classifier artifacts loaded once from a folder tree (optionally signed)
//! - A model registry answering concurrent predictions
//! - Risk bucketing with user-facing advice
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (schemas, coercion, rows, risk categories)
//! - `ports`: Trait definitions for artifact discovery and classifiers
//! - `adapters`: Concrete implementations (directory and memory sources, JSON
//!   artifacts, log sanitization)
//! - `application`: Model registry and the assessment service
//! - `config`: Environment-driven settings

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::{
    Assessment, AssessmentRequest, AssessmentService, ModelRegistry, Prediction, RegistryError,
};
pub use domain::{bucket, AnalysisType, FeatureValue, RawFeatureMap, RiskCategory};

/// Result type for Vitalrisk operations
pub type Result<T> = std::result::Result<T, VitalriskError>;

/// Main error type for Vitalrisk
#[derive(Debug, thiserror::Error)]
pub enum VitalriskError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("missing or invalid features: {}", .0.join(", "))]
    MissingFeatures(Vec<String>),

    #[error("Configuration error: {0}")]
    Config(String),
}
