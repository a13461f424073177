// hydropack-core/src/stages/mod.rs
//! The build stages, in the order `dev` runs them.

pub mod extras;
pub mod instance;
pub mod layout;
pub mod package;
pub mod runtime;

pub use extras::{extra_artifacts, prepare_extras};
pub use instance::create_instance;
pub use layout::{clean, make_dirs};
pub use package::{package, PackageOptions};
pub use runtime::{prepare_runtime, runtime_artifact};
