//! Ports layer: Trait definitions for external operations.
//!
//! These traits define the boundaries between the model registry and the
//! things it consumes: where artifacts come from and how they are decoded
//! into classifiers.

mod artifact_source;
mod classifier;

pub use artifact_source::{ArtifactBlob, ArtifactSource};
pub use classifier::{ArtifactDecoder, DecodedClassifier, LabelClassifier, ProbabilisticClassifier};
