//! Emitter and driver of the SMESH binding generator.
//!
//! [`pipeline::run`] chains every stage: locate dependencies, aggregate
//! headers, parse, bind, order, resolve imports, instantiate templates and
//! finally [`Emitter::emit_all`] writes the C++ tree and `manifest.json`.

pub mod emit;
pub mod error;
mod fs_utils;
pub mod manifest;
pub mod pipeline;

pub use emit::Emitter;
pub use error::GeneratorError;
pub use manifest::{ImportManifest, Manifest, ModuleManifest, MANIFEST_FILE};
pub use pipeline::{run, run_with_sources, RunReport};

pub type Result<T> = std::result::Result<T, GeneratorError>;
