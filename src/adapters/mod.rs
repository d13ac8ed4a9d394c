//! Adapters layer: Concrete implementations of ports.
//!
//! - `json_model`: JSON classifier artifacts (`ArtifactDecoder`)
//! - `filesystem`: artifact folders with optional signed manifests (`ArtifactSource`)
//! - `memory`: explicit in-memory artifacts (`ArtifactSource`)
//! - `sanitize`: redaction of measurements and identifiers in logs

pub mod filesystem;
pub mod json_model;
pub mod memory;
pub mod sanitize;

pub use filesystem::DirectoryArtifactSource;
pub use json_model::JsonArtifactDecoder;
pub use memory::MemoryArtifactSource;
