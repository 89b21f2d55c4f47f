//! Renderer chain manifest parser
//!
//! This module provides parsing and validation for YAML manifest files that describe an
//! ordered chain of renderer stages and their input/output semantics.

use crate::ManifestError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use vid_render::{IoResourceSemantics, render_model::DisplacementRenderModel};

/// A single renderer stage of a chain
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StageSpec {
    /// Unique identifier for this stage
    pub id: String,
    /// Whether the stage reads and writes the same texture
    pub semantics: IoResourceSemantics,
    /// Displacement values, for displacement stages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displacement: Option<DisplacementRenderModel>,
}

/// Renderer chain manifest as parsed from YAML
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChainManifest {
    /// Unique chain identifier
    pub id: String,
    /// Human-readable chain name
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Stages in encoding order
    pub stages: Vec<StageSpec>,
}

impl ChainManifest {
    /// Parses and validates a chain manifest from YAML content
    ///
    /// # Arguments
    /// * `yaml_content` - YAML string containing the manifest
    pub fn from_yaml(yaml_content: &str) -> Result<Self, ManifestError> {
        let manifest: Self = serde_norway::from_str(yaml_content)?;
        manifest.validate()?;
        tracing::debug!(id = %manifest.id, stages = manifest.stages.len(), "loaded chain manifest");
        Ok(manifest)
    }

    /// Parses and validates a chain manifest from a YAML file
    ///
    /// # Arguments
    /// * `path` - Path to the YAML manifest file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Returns the semantics of each stage in encoding order
    pub fn semantics(&self) -> Vec<IoResourceSemantics> {
        self.stages.iter().map(|stage| stage.semantics).collect()
    }

    /// Validates the manifest for correctness
    ///
    /// Checks for missing IDs, empty chains, duplicate stage IDs and displacement values on
    /// stages that can not run a displacement renderer.
    pub fn validate(&self) -> Result<(), ManifestValidationError> {
        if self.id.is_empty() {
            return Err(ManifestValidationError::EmptyId);
        }

        if self.name.is_empty() {
            return Err(ManifestValidationError::EmptyName);
        }

        if self.stages.is_empty() {
            return Err(ManifestValidationError::NoStages);
        }

        let mut stage_ids = HashSet::new();
        for (i, stage) in self.stages.iter().enumerate() {
            if stage.id.is_empty() {
                return Err(ManifestValidationError::EmptyStageId(i));
            }
            if !stage_ids.insert(stage.id.as_str()) {
                return Err(ManifestValidationError::DuplicateStageId(i, stage.id.clone()));
            }
            // The displacement renderer is always out-of-place
            if stage.displacement.is_some() && stage.semantics == IoResourceSemantics::InPlace {
                return Err(ManifestValidationError::InPlaceDisplacement(i));
            }
        }

        Ok(())
    }
}

/// Manifest validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestValidationError {
    /// Chain ID field is empty
    EmptyId,
    /// Chain name field is empty
    EmptyName,
    /// Chain contains no stages
    NoStages,
    /// A stage has an empty ID (stage index)
    EmptyStageId(usize),
    /// Two stages share the same ID (stage index, stage ID)
    DuplicateStageId(usize, String),
    /// An in-place stage declares displacement values (stage index)
    InPlaceDisplacement(usize),
}

impl fmt::Display for ManifestValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "Chain ID cannot be empty"),
            Self::EmptyName => write!(f, "Chain name cannot be empty"),
            Self::NoStages => write!(f, "Chain must have at least one stage"),
            Self::EmptyStageId(stage) => write!(f, "Stage {stage} has an empty ID"),
            Self::DuplicateStageId(stage, id) => write!(f, "Stage {stage} reuses the ID '{id}'"),
            Self::InPlaceDisplacement(stage) => {
                write!(f, "Stage {stage} declares displacement values but displacement renderers are out-of-place")
            }
        }
    }
}

impl std::error::Error for ManifestValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use vid_render::render_model::{DisplacementChannel, DisplacementModel};

    const WARP_MANIFEST: &str = include_str!("../manifests/warp.yaml");

    #[test]
    fn test_chain_manifest_parsing() {
        let yaml = r#"
id: test_chain
name: Test Chain
description: A test chain
stages:
  - id: warp
    semantics: out_of_place
    displacement:
      horizontal_offset: -0.5
      vertical_offset: -0.5
      horizontal_scale: 4
      vertical_scale: 2
      horizontal_channel: red
      vertical_channel: green
  - id: tint
    semantics: in_place
"#;

        let manifest = ChainManifest::from_yaml(yaml).unwrap();
        assert_eq!(manifest.id, "test_chain");
        assert_eq!(manifest.name, "Test Chain");
        assert_eq!(manifest.description.as_deref(), Some("A test chain"));
        assert_eq!(manifest.semantics(), vec![IoResourceSemantics::OutOfPlace, IoResourceSemantics::InPlace]);

        let displacement = manifest.stages[0].displacement.as_ref().unwrap();
        assert_eq!(displacement.horizontal_scale(), 4.0);
        assert_eq!(displacement.vertical_channel(), DisplacementChannel::Green);
        assert!(manifest.stages[1].displacement.is_none());
    }

    #[test]
    fn test_bundled_manifest_is_valid() {
        let manifest = ChainManifest::from_yaml(WARP_MANIFEST).unwrap();
        assert!(!manifest.stages.is_empty());
    }

    #[test]
    fn test_invalid_scale_rejected_while_parsing() {
        let yaml = r#"
id: bad
name: Bad
stages:
  - id: warp
    semantics: out_of_place
    displacement: { horizontal_scale: 0, vertical_scale: 1, horizontal_channel: red, vertical_channel: red }
"#;

        let error = ChainManifest::from_yaml(yaml).unwrap_err();
        assert!(matches!(error, ManifestError::Yaml(_)));
        assert!(error.to_string().contains("horizontal scale must be positive"));
    }

    #[test]
    fn test_unknown_semantics_rejected() {
        let yaml = "id: bad\nname: Bad\nstages:\n  - id: x\n    semantics: sideways\n";
        assert!(matches!(ChainManifest::from_yaml(yaml), Err(ManifestError::Yaml(_))));
    }

    fn manifest(stages: Vec<StageSpec>) -> ChainManifest {
        ChainManifest {
            id: "chain".to_string(),
            name: "Chain".to_string(),
            description: None,
            stages,
        }
    }

    fn stage(id: &str, semantics: IoResourceSemantics) -> StageSpec {
        StageSpec {
            id: id.to_string(),
            semantics,
            displacement: None,
        }
    }

    #[test]
    fn test_validation() {
        assert_eq!(manifest(vec![]).validate(), Err(ManifestValidationError::NoStages));

        let mut empty_id = manifest(vec![stage("a", IoResourceSemantics::InPlace)]);
        empty_id.id.clear();
        assert_eq!(empty_id.validate(), Err(ManifestValidationError::EmptyId));

        let mut empty_name = manifest(vec![stage("a", IoResourceSemantics::InPlace)]);
        empty_name.name.clear();
        assert_eq!(empty_name.validate(), Err(ManifestValidationError::EmptyName));

        assert_eq!(manifest(vec![stage("", IoResourceSemantics::InPlace)]).validate(), Err(ManifestValidationError::EmptyStageId(0)));

        let duplicate = manifest(vec![stage("a", IoResourceSemantics::InPlace), stage("a", IoResourceSemantics::OutOfPlace)]);
        assert_eq!(duplicate.validate(), Err(ManifestValidationError::DuplicateStageId(1, "a".to_string())));

        let mut in_place_displacement = stage("warp", IoResourceSemantics::InPlace);
        in_place_displacement.displacement = Some(DisplacementRenderModel::new(0.0, 0.0, 1.0, 1.0, DisplacementChannel::Red, DisplacementChannel::Green).unwrap());
        assert_eq!(manifest(vec![in_place_displacement]).validate(), Err(ManifestValidationError::InPlaceDisplacement(0)));

        assert!(manifest(vec![stage("a", IoResourceSemantics::OutOfPlace), stage("b", IoResourceSemantics::InPlace)]).validate().is_ok());
    }
}
