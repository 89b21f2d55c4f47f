//! Error type of manifest loading and analysis

use crate::manifest::ManifestValidationError;

/// Errors raised while loading, validating or planning a chain manifest
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The manifest file could not be read
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    /// The YAML is malformed or a render model in it is invalid
    #[error("failed to parse manifest: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// The manifest parsed but breaks a structural rule
    #[error("invalid manifest: {0}")]
    Validation(#[from] ManifestValidationError),

    /// The stage semantics could not be planned
    #[error(transparent)]
    Planning(#[from] vid_render::Error),
}
