//! Displacement renderer
//!
//! Warps the input texture by per-pixel offsets read from a displacement map. For each output
//! pixel the configured map channel of each axis is scaled and offset into a displacement in
//! pixels, and the input is sampled at the displaced position.

use crate::{
    Renderer,
    io_resources::{IoResourceSemantics, IoResources},
    parameters::{DisplacementParameters, SourceFormat},
    render_model::DisplacementRenderModel,
};
use wgpu::util::DeviceExt;

/// WGSL source of the displacement shader
pub const DISPLACEMENT_SHADER: &str = include_str!("shaders/displacement.wgsl");

/// Displacement map textures
///
/// All planes are sampled with a filtering sampler, so float formats need
/// `FLOAT32_FILTERABLE` on the device.
#[derive(Debug, Clone)]
pub enum DisplacementMap {
    /// RGBA or BGRA texture
    Rgba(wgpu::Texture),
    /// Luma texture; every channel reads the luma value
    Y(wgpu::Texture),
    /// Luma texture plus a two-component chroma texture
    Yuv { y: wgpu::Texture, uv: wgpu::Texture },
}

impl DisplacementMap {
    /// Returns the format tag the shader uses to decode this map
    pub fn source_format(&self) -> SourceFormat {
        match self {
            DisplacementMap::Rgba(_) => SourceFormat::Rgba,
            DisplacementMap::Y(_) => SourceFormat::Y,
            DisplacementMap::Yuv { .. } => SourceFormat::Yuv,
        }
    }

    /// Returns the primary plane and the chroma plane
    ///
    /// Single-plane maps bind the primary plane in the chroma slot too; the shader never reads it.
    fn planes(&self) -> (&wgpu::Texture, &wgpu::Texture) {
        match self {
            DisplacementMap::Rgba(texture) | DisplacementMap::Y(texture) => (texture, texture),
            DisplacementMap::Yuv { y, uv } => (y, uv),
        }
    }
}

/// Out-of-place renderer applying a displacement map to its input
#[derive(Debug)]
pub struct DisplacementRenderer {
    /// Render pipeline targeting the pixel format given at construction
    pipeline: wgpu::RenderPipeline,
    /// Layout of the per-pass bind group
    bind_group_layout: wgpu::BindGroupLayout,
    /// Linear clamp-to-edge sampler shared by all textures
    sampler: wgpu::Sampler,
    /// Displacement values
    model: DisplacementRenderModel,
    /// Displacement map
    map: DisplacementMap,
}

impl DisplacementRenderer {
    /// Creates a displacement renderer
    ///
    /// # Arguments
    /// * `device` - The wgpu device used for rendering
    /// * `pixel_format` - Pixel format of the textures this renderer renders to
    /// * `model` - Displacement values
    /// * `map` - Displacement map textures
    pub fn new(device: &wgpu::Device, pixel_format: wgpu::TextureFormat, model: DisplacementRenderModel, map: DisplacementMap) -> Self {
        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Displacement bind group layout"),
            entries: &[
                // Input texture
                texture_entry(0),
                // Map texture (RGBA or luma)
                texture_entry(1),
                // Map chroma texture
                texture_entry(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<DisplacementParameters>() as u64),
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Displacement pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Displacement shader"),
            source: wgpu::ShaderSource::Wgsl(DISPLACEMENT_SHADER.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Displacement pipeline"),
            layout: Some(&pipeline_layout),
            cache: None,
            vertex: wgpu::VertexState {
                module: &shader_module,
                buffers: &[],
                compilation_options: Default::default(),
                entry_point: Some("vs_main"),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                targets: &[Some(wgpu::ColorTargetState {
                    format: pixel_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
                entry_point: Some("fs_main"),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            depth_stencil: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Displacement sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            pipeline,
            bind_group_layout,
            sampler,
            model,
            map,
        }
    }

    /// Returns the displacement values
    pub fn model(&self) -> &DisplacementRenderModel {
        &self.model
    }

    /// Replaces the displacement values used by subsequent encodes
    pub fn set_model(&mut self, model: DisplacementRenderModel) {
        self.model = model;
    }

    /// Returns the displacement map
    pub fn map(&self) -> &DisplacementMap {
        &self.map
    }

    /// Replaces the displacement map used by subsequent encodes
    pub fn set_map(&mut self, map: DisplacementMap) {
        self.map = map;
    }

    /// Returns the shader parameters for the current model and map
    pub fn parameters(&self) -> DisplacementParameters {
        DisplacementParameters::new(&self.model, self.map.source_format())
    }
}

impl Renderer for DisplacementRenderer {
    fn name(&self) -> &str {
        "Displacement"
    }

    fn io_semantics(&self) -> IoResourceSemantics {
        IoResourceSemantics::OutOfPlace
    }

    fn encode(&self, device: &wgpu::Device, encoder: &mut wgpu::CommandEncoder, source: &wgpu::Texture, resources: &IoResources<wgpu::Texture>) {
        let parameters = self.parameters();
        let parameters_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Displacement parameters"),
            contents: bytemuck::bytes_of(&parameters),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let (map_plane, map_uv_plane) = self.map.planes();
        let input_view = resources.input.resolve(source).create_view(&wgpu::TextureViewDescriptor::default());
        let map_view = map_plane.create_view(&wgpu::TextureViewDescriptor::default());
        let map_uv_view = map_uv_plane.create_view(&wgpu::TextureViewDescriptor::default());
        let target_view = resources.render_pass.target.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Displacement bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&input_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&map_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&map_uv_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: parameters_buffer.as_entire_binding(),
                },
            ],
        });

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Displacement"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target_view,
                resolve_target: None,
                ops: resources.render_pass.operations(),
            })],
            ..Default::default()
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_and_validate() -> (naga::Module, naga::valid::ModuleInfo) {
        let module = naga::front::wgsl::parse_str(DISPLACEMENT_SHADER).expect("Failed to parse displacement shader");
        let mut validator = naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::all());
        let info = validator.validate(&module).expect("Displacement shader failed validation");
        (module, info)
    }

    #[test]
    fn test_shader_is_valid() {
        parse_and_validate();
    }

    #[test]
    fn test_shader_entry_points() {
        let (module, _) = parse_and_validate();

        let stages: Vec<_> = module.entry_points.iter().map(|entry| (entry.name.as_str(), entry.stage)).collect();
        assert!(stages.contains(&("vs_main", naga::ShaderStage::Vertex)));
        assert!(stages.contains(&("fs_main", naga::ShaderStage::Fragment)));
    }

    #[test]
    fn test_shader_parameters_match_record_size() {
        let (module, _) = parse_and_validate();

        let parameters = module
            .global_variables
            .iter()
            .find(|(_, variable)| variable.name.as_deref() == Some("parameters"))
            .map(|(_, variable)| variable)
            .expect("parameters uniform missing");
        assert_eq!(parameters.binding, Some(naga::ResourceBinding { group: 0, binding: 4 }));

        let size = module.types[parameters.ty].inner.size(module.to_ctx());
        assert_eq!(size as usize, std::mem::size_of::<DisplacementParameters>());
    }
}
