//! Renderer chain execution
//!
//! This module encodes an ordered list of renderers one after the other onto a caller-owned
//! output texture, using a single caller-owned helper texture for every intermediate result.

use crate::{
    Renderer,
    error::{Error, Result},
    io_resources::{IoResourceSemantics, IoResources, LoadAction, TextureStorage, plan_io_resources},
};

/// Size and pixel format of a texture
pub(crate) type TextureShape = (wgpu::Extent3d, wgpu::TextureFormat);

/// Checks the textures a chain is about to be encoded with
///
/// `output` and `helper` must share size and format. If any renderer is out-of-place, the first
/// of them samples `source` while rendering to `output` or `helper`, so `source` must be distinct
/// from both.
pub(crate) fn check_targets<T: TextureStorage>(semantics: &[IoResourceSemantics], source: &T, output: (&T, TextureShape), helper: (&T, TextureShape)) -> Result<()> {
    let (output, output_shape) = output;
    let (helper, helper_shape) = helper;

    if output_shape != helper_shape {
        return Err(Error::SizeMismatch {
            output: output_shape,
            helper: helper_shape,
        });
    }

    let reads_source = semantics.iter().any(IoResourceSemantics::is_out_of_place);
    if reads_source && (source.same_storage(output) || source.same_storage(helper)) {
        return Err(Error::AliasedSource);
    }

    Ok(())
}

/// An ordered sequence of renderers encoded as a single chain
///
/// The chain holds no textures. Every call to [`RendererChain::encode`] plans the texture roles
/// anew from the renderers' semantics, so the same chain can be encoded for any number of frames.
#[derive(Debug, Default)]
pub struct RendererChain {
    /// Renderers to encode in sequence
    renderers: Vec<Box<dyn Renderer>>,
}

impl RendererChain {
    /// Creates a renderer chain from renderers in encoding order
    pub fn new(renderers: Vec<Box<dyn Renderer>>) -> Self {
        Self { renderers }
    }

    /// Appends a renderer to the end of the chain
    pub fn push(&mut self, renderer: Box<dyn Renderer>) {
        self.renderers.push(renderer);
    }

    /// Returns the renderers of this chain in encoding order
    pub fn renderers(&self) -> &[Box<dyn Renderer>] {
        &self.renderers
    }

    /// Returns the semantics of each renderer in encoding order
    pub fn semantics(&self) -> Vec<IoResourceSemantics> {
        self.renderers.iter().map(|renderer| renderer.io_semantics()).collect()
    }

    /// Plans the input/output resources of every renderer in this chain
    ///
    /// # Arguments
    /// * `output` - Texture that receives the final result
    /// * `helper` - Texture used for intermediate results
    /// * `initial_load_action` - Load action of the first render pass
    /// * `initial_clear_color` - Clear color of the first render pass
    ///
    /// # Returns
    /// One resolved entry per renderer, in encoding order
    pub fn plan<T: TextureStorage>(&self, output: &T, helper: &T, initial_load_action: LoadAction, initial_clear_color: wgpu::Color) -> Result<Vec<IoResources<T>>> {
        plan_io_resources(&self.semantics(), output, helper, initial_load_action, initial_clear_color)
    }

    /// Encodes the entire chain
    ///
    /// # Arguments
    /// * `device` - The wgpu device for per-pass resource creation
    /// * `encoder` - The command encoder to record commands into
    /// * `source` - The texture holding the chain input
    /// * `output` - Texture that receives the final result
    /// * `helper` - Texture used for intermediate results; same size and format as `output`
    /// * `initial_load_action` - Load action of the first render pass
    /// * `initial_clear_color` - Clear color of the first render pass
    ///
    /// # Errors
    /// Fails without recording anything if the chain is empty, if `output` and `helper`
    /// alias each other or differ in size or format, or if an out-of-place renderer would read
    /// `source` while it is also `output` or `helper`.
    #[allow(clippy::too_many_arguments)]
    #[tracing::instrument(level = "debug", skip_all, fields(renderers = self.renderers.len()))]
    pub fn encode(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        source: &wgpu::Texture,
        output: &wgpu::Texture,
        helper: &wgpu::Texture,
        initial_load_action: LoadAction,
        initial_clear_color: wgpu::Color,
    ) -> Result<()> {
        check_targets(&self.semantics(), source, (output, (output.size(), output.format())), (helper, (helper.size(), helper.format())))?;

        let resources = self.plan(output, helper, initial_load_action, initial_clear_color)?;

        for (renderer, resources) in self.renderers.iter().zip(&resources) {
            tracing::debug!(renderer = renderer.name(), semantics = %resources.semantics, "encoding renderer");
            renderer.encode(device, encoder, source, resources);
        }

        Ok(())
    }
}
