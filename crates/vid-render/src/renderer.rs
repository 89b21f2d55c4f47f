//! Renderer abstraction for chains of GPU passes

use crate::io_resources::{IoResourceSemantics, IoResources};

/// A GPU pass that can be encoded as one stage of a renderer chain
pub trait Renderer: std::fmt::Debug {
    /// Human-readable name for debugging
    fn name(&self) -> &str;

    /// Whether this renderer reads and writes the same texture
    fn io_semantics(&self) -> IoResourceSemantics;

    /// Records this renderer's commands into `encoder`
    ///
    /// # Arguments
    /// * `device` - The wgpu device for per-pass resource creation
    /// * `encoder` - The command encoder to record commands into
    /// * `source` - The texture staged by the caller as chain input
    /// * `resources` - Planned input, output and render pass configuration
    fn encode(&self, device: &wgpu::Device, encoder: &mut wgpu::CommandEncoder, source: &wgpu::Texture, resources: &IoResources<wgpu::Texture>);
}
