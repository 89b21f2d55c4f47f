//! Texture role analysis of chain manifests
//!
//! Plans a manifest against symbolic output and helper textures, giving the role each stage
//! reads from and writes to without touching a GPU.

use crate::{ManifestError, manifest::ChainManifest};
use serde::Serialize;
use std::fmt::Write;
use vid_render::{IoResourceSemantics, LoadAction, TextureInput, TextureStorage, plan_io_resources};

/// Symbolic texture of a renderer chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureRole {
    /// The texture staged by the caller as chain input
    Source,
    /// The texture receiving the final result
    Output,
    /// The texture holding intermediate results
    Helper,
}

impl TextureRole {
    /// Returns the display name of this role
    pub fn name(&self) -> &'static str {
        match self {
            TextureRole::Source => "source",
            TextureRole::Output => "output",
            TextureRole::Helper => "helper",
        }
    }
}

impl TextureStorage for TextureRole {
    fn same_storage(&self, other: &Self) -> bool {
        self == other
    }
}

/// Planned texture roles of a single stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageAnalysis {
    /// Identifier of the analyzed stage
    pub stage_id: String,
    /// Semantics of the stage
    pub semantics: IoResourceSemantics,
    /// Texture the stage reads from
    pub input: TextureRole,
    /// Texture the stage writes to
    pub output: TextureRole,
    /// Load action of the stage's render pass
    pub load_action: LoadAction,
}

/// Plans the texture roles of every stage in `manifest`
///
/// # Arguments
/// * `manifest` - The chain to analyze
/// * `initial_load_action` - Load action of the first render pass
///
/// # Returns
/// One entry per stage, in encoding order
pub fn analyze(manifest: &ChainManifest, initial_load_action: LoadAction) -> Result<Vec<StageAnalysis>, ManifestError> {
    let resources = plan_io_resources(&manifest.semantics(), &TextureRole::Output, &TextureRole::Helper, initial_load_action, vid_render::wgpu::Color::TRANSPARENT)?;

    Ok(manifest
        .stages
        .iter()
        .zip(resources)
        .map(|(stage, resources)| StageAnalysis {
            stage_id: stage.id.clone(),
            semantics: resources.semantics,
            input: match resources.input {
                TextureInput::Source => TextureRole::Source,
                TextureInput::Storage(role) => role,
            },
            output: resources.output,
            load_action: resources.render_pass.load_action,
        })
        .collect())
}

/// Returns true if any stage touches the helper texture
pub fn uses_helper(analysis: &[StageAnalysis]) -> bool {
    analysis.iter().any(|stage| stage.input == TextureRole::Helper || stage.output == TextureRole::Helper)
}

/// Formats an analysis as a fixed-width table
pub fn format_table(analysis: &[StageAnalysis]) -> String {
    let id_width = analysis.iter().map(|stage| stage.stage_id.len()).chain(std::iter::once("stage".len())).max().unwrap_or_default();

    let mut table = String::new();
    let _ = writeln!(table, "{:>3}  {:<id_width$}  {:<12}  {:<6}  {:<6}  load", "#", "stage", "semantics", "input", "output");
    for (index, stage) in analysis.iter().enumerate() {
        let _ = writeln!(
            table,
            "{:>3}  {:<id_width$}  {:<12}  {:<6}  {:<6}  {}",
            index,
            stage.stage_id,
            stage.semantics.to_string(),
            stage.input.name(),
            stage.output.name(),
            stage.load_action
        );
    }
    table
}
