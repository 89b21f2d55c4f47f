//! Uniform parameter record of the displacement shader

use crate::render_model::DisplacementModel;
use serde::{Deserialize, Serialize};

/// Pixel layout of a displacement map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// A single RGBA (or BGRA) texture
    Rgba,
    /// A single luma texture
    Y,
    /// Separate luma and interleaved chroma textures
    Yuv,
}

impl SourceFormat {
    /// Value of this format in the shader parameter record
    pub fn as_raw(&self) -> u32 {
        match self {
            SourceFormat::Rgba => 0,
            SourceFormat::Y => 1,
            SourceFormat::Yuv => 2,
        }
    }
}

/// Parameters of the displacement fragment shader
///
/// Field order and widths match the `Parameters` struct in `displacement.wgsl`.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Zeroable, bytemuck::Pod)]
#[repr(C)]
pub struct DisplacementParameters {
    pub horizontal_offset: f32,
    pub vertical_offset: f32,
    pub horizontal_scale: f32,
    pub vertical_scale: f32,
    pub horizontal_channel: u32,
    pub vertical_channel: u32,
    pub displacement_map_format: u32,
    /// Pads the record to the 16 byte uniform alignment
    pub _padding: u32,
}

impl DisplacementParameters {
    /// Packs a render model and the format of its displacement map
    pub fn new(model: &impl DisplacementModel, displacement_map_format: SourceFormat) -> Self {
        Self {
            horizontal_offset: model.horizontal_offset() as f32,
            vertical_offset: model.vertical_offset() as f32,
            horizontal_scale: model.horizontal_scale() as f32,
            vertical_scale: model.vertical_scale() as f32,
            horizontal_channel: model.horizontal_channel().as_raw(),
            vertical_channel: model.vertical_channel().as_raw(),
            displacement_map_format: displacement_map_format.as_raw(),
            _padding: 0,
        }
    }
}
