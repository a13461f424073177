// src/model/mod.rs
pub mod artifact;

pub use artifact::{ArtifactOutcome, ArtifactSpec, ExtractionMethod};
