//! Renderer chain manifests
//!
//! This crate loads YAML manifests describing ordered chains of renderer stages, and analyzes
//! which of the two chain textures every stage reads from and writes to.

mod error;

pub mod analysis;
pub mod manifest;

pub use error::ManifestError;
