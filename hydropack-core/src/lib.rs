// hydropack-core/src/lib.rs
pub mod archive;
pub mod artifact;
pub mod extract;
pub mod fs;
pub mod launcher;
pub mod process;
pub mod stages;
pub mod trim;

pub use artifact::{ensure_all, ensure_artifact, fetch_to_cache, materialize, ArtifactReport};
pub use hydropack_common::error::{HydroError, Result};
