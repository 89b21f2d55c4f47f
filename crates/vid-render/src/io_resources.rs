//! Texture role planning for sequences of renderers
//!
//! A chain of renderers is encoded one after the other using exactly two caller-owned
//! textures: the output texture, which must hold the final result, and a helper texture
//! for intermediate results. This module decides which texture each renderer reads from
//! and writes to, and how its render pass is configured.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Input/output semantics of a renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoResourceSemantics {
    /// Reads one texture and writes a different one
    OutOfPlace,
    /// Reads and writes the same texture
    InPlace,
}

impl IoResourceSemantics {
    /// Returns true if input and output are disjoint storages
    pub fn is_out_of_place(&self) -> bool {
        matches!(self, IoResourceSemantics::OutOfPlace)
    }
}

impl fmt::Display for IoResourceSemantics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoResourceSemantics::OutOfPlace => write!(f, "out-of-place"),
            IoResourceSemantics::InPlace => write!(f, "in-place"),
        }
    }
}

/// A handle to GPU pixel storage that can be compared by storage identity
///
/// Handles are cheap to clone and never own the storage exclusively; planning only
/// copies handles around and never touches texture contents.
pub trait TextureStorage: Clone {
    /// Returns true if both handles refer to the same physical storage
    fn same_storage(&self, other: &Self) -> bool;
}

impl TextureStorage for wgpu::Texture {
    fn same_storage(&self, other: &Self) -> bool {
        self == other
    }
}

impl<T> TextureStorage for Arc<T> {
    fn same_storage(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

/// Action applied to the color attachment when a render pass starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadAction {
    /// Clear the attachment to the clear color
    Clear,
    /// Keep the existing contents of the attachment
    Load,
}

impl fmt::Display for LoadAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadAction::Clear => write!(f, "clear"),
            LoadAction::Load => write!(f, "load"),
        }
    }
}

/// Render pass configuration of a single renderer
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPassConfig<T> {
    /// Color attachment storage; always the renderer's output texture
    pub target: T,
    /// Load action of the color attachment
    pub load_action: LoadAction,
    /// Clear color, used when `load_action` is [`LoadAction::Clear`]
    pub clear_color: wgpu::Color,
}

impl<T> RenderPassConfig<T> {
    /// Converts the load configuration into wgpu color attachment operations
    pub fn operations(&self) -> wgpu::Operations<wgpu::Color> {
        wgpu::Operations {
            load: match self.load_action {
                LoadAction::Clear => wgpu::LoadOp::Clear(self.clear_color),
                LoadAction::Load => wgpu::LoadOp::Load,
            },
            store: wgpu::StoreOp::Store,
        }
    }
}

/// The texture a renderer reads from
#[derive(Debug, Clone, PartialEq)]
pub enum TextureInput<T> {
    /// The source texture staged by the caller; only the first renderer reads it
    Source,
    /// One of the two planned textures
    Storage(T),
}

impl<T> TextureInput<T> {
    /// Returns the planned texture, or `None` for the caller-staged source
    pub fn storage(&self) -> Option<&T> {
        match self {
            TextureInput::Source => None,
            TextureInput::Storage(texture) => Some(texture),
        }
    }

    /// Resolves the input against the caller's source texture
    pub fn resolve<'a>(&'a self, source: &'a T) -> &'a T {
        self.storage().unwrap_or(source)
    }
}

/// Resolved input/output resources of a single renderer
#[derive(Debug, Clone, PartialEq)]
pub struct IoResources<T> {
    /// Texture the renderer reads from
    pub input: TextureInput<T>,
    /// Texture the renderer writes to
    pub output: T,
    /// Render pass configuration targeting `output`
    pub render_pass: RenderPassConfig<T>,
    /// Semantics this entry was planned from
    pub semantics: IoResourceSemantics,
}

/// Plans the input/output resources of every renderer in `semantics`
///
/// Returns one entry per renderer, in order. Every out-of-place renderer flips between the
/// output and helper textures, and in-place renderers stay on the texture of the renderer
/// before them. The target of each renderer is chosen by the parity of the out-of-place
/// renderers that still follow it, which pins the last renderer to `output` for every
/// sequence without a special case.
///
/// The first renderer, when out-of-place, reads [`TextureInput::Source`]. Only the first
/// render pass uses `initial_load_action` and `initial_clear_color`; every later pass loads
/// the existing contents of its target.
///
/// # Arguments
/// * `semantics` - Semantics of each renderer, in encoding order
/// * `output` - Texture that receives the final result
/// * `helper` - Texture used for intermediate results
/// * `initial_load_action` - Load action of the first render pass
/// * `initial_clear_color` - Clear color of the first render pass
///
/// # Errors
/// [`Error::EmptySemantics`] if `semantics` is empty, and [`Error::AliasedStorage`] if
/// `output` and `helper` are the same storage.
#[tracing::instrument(level = "debug", skip_all, fields(renderers = semantics.len()))]
pub fn plan_io_resources<T: TextureStorage>(semantics: &[IoResourceSemantics], output: &T, helper: &T, initial_load_action: LoadAction, initial_clear_color: wgpu::Color) -> Result<Vec<IoResources<T>>> {
    if semantics.is_empty() {
        return Err(Error::EmptySemantics);
    }
    if output.same_storage(helper) {
        return Err(Error::AliasedStorage);
    }

    let mut remaining_out_of_place = semantics.iter().filter(|s| s.is_out_of_place()).count();
    let mut previous_output: Option<&T> = None;
    let mut resources = Vec::with_capacity(semantics.len());

    for (index, &semantic) in semantics.iter().enumerate() {
        if semantic.is_out_of_place() {
            remaining_out_of_place -= 1;
        }

        let target = if remaining_out_of_place % 2 == 0 { output } else { helper };
        let input = match semantic {
            IoResourceSemantics::InPlace => TextureInput::Storage(target.clone()),
            IoResourceSemantics::OutOfPlace => previous_output.map_or(TextureInput::Source, |texture| TextureInput::Storage(texture.clone())),
        };
        let load_action = if index == 0 { initial_load_action } else { LoadAction::Load };

        tracing::debug!(
            index,
            %semantic,
            reads_source = matches!(input, TextureInput::Source),
            writes_output = target.same_storage(output),
            %load_action,
            "planned renderer resources"
        );

        resources.push(IoResources {
            input,
            output: target.clone(),
            render_pass: RenderPassConfig {
                target: target.clone(),
                load_action,
                clear_color: initial_clear_color,
            },
            semantics: semantic,
        });
        previous_output = Some(target);
    }

    Ok(resources)
}
