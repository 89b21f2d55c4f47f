//! Displacement CLI
//!
//! Warps an image by a displacement map on the GPU. The displacement renderer can be repeated
//! several times, which encodes a chain that ping-pongs between the output texture and a single
//! helper texture.
//!
//! # Usage
//! ```bash
//! displace input.png map.png output.png --horizontal-scale 16 --vertical-scale 16 --passes 3
//! ```

use clap::{Parser, ValueEnum};
use image::DynamicImage;
use std::path::PathBuf;
use vid_render::{
    DisplacementMap, DisplacementRenderer, LoadAction, Renderer, RendererChain,
    render_model::{DisplacementChannel, DisplacementRenderModel},
};

/// Texture format used for every texture in this tool
const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// Map channel selection on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Channel {
    Red,
    Green,
    Blue,
}

impl From<Channel> for DisplacementChannel {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::Red => DisplacementChannel::Red,
            Channel::Green => DisplacementChannel::Green,
            Channel::Blue => DisplacementChannel::Blue,
        }
    }
}

/// Command-line arguments for the displacement tool
#[derive(Parser)]
#[command(version, about = "CLI tool for warping images with a displacement map")]
struct Args {
    /// Input image file path
    input: PathBuf,

    /// Displacement map image file path
    map: PathBuf,

    /// Output image file path
    output: PathBuf,

    /// Offset in pixels added to horizontal map values
    #[arg(long, default_value = "-0.5", allow_hyphen_values = true)]
    horizontal_offset: f64,

    /// Offset in pixels added to vertical map values
    #[arg(long, default_value = "-0.5", allow_hyphen_values = true)]
    vertical_offset: f64,

    /// Scale in pixels multiplied by horizontal map values
    #[arg(long, default_value = "8.0")]
    horizontal_scale: f64,

    /// Scale in pixels multiplied by vertical map values
    #[arg(long, default_value = "8.0")]
    vertical_scale: f64,

    /// Map channel driving the horizontal displacement
    #[arg(long, value_enum, default_value = "red")]
    horizontal_channel: Channel,

    /// Map channel driving the vertical displacement
    #[arg(long, value_enum, default_value = "green")]
    vertical_channel: Channel,

    /// Read the map as a single luma plane instead of RGBA
    #[arg(long)]
    luma_map: bool,

    /// Number of displacement passes to chain
    #[arg(long, short, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    passes: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let args = Args::parse();

    let model = DisplacementRenderModel::new(
        args.horizontal_offset,
        args.vertical_offset,
        args.horizontal_scale,
        args.vertical_scale,
        args.horizontal_channel.into(),
        args.vertical_channel.into(),
    )?;

    tracing::info!("Loading images");
    let input_image = image::open(&args.input)?;
    let map_image = image::open(&args.map)?;

    tracing::info!("Initializing GPU");
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    });

    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))?;

    // Rgba32Float textures are sampled with a linear sampler
    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: None,
        required_features: wgpu::Features::FLOAT32_FILTERABLE,
        required_limits: wgpu::Limits::default(),
        memory_hints: wgpu::MemoryHints::default(),
        trace: Default::default(),
    }))?;

    let source_texture = load_image_to_texture(&device, &queue, &input_image, "Source Texture");
    let map_texture = load_image_to_texture(&device, &queue, &map_image, "Displacement Map");
    let map = if args.luma_map { DisplacementMap::Y(map_texture) } else { DisplacementMap::Rgba(map_texture) };

    let output_texture = create_target_texture(&device, source_texture.size(), "Output Texture");
    let helper_texture = create_target_texture(&device, source_texture.size(), "Helper Texture");

    let renderers = (0..args.passes)
        .map(|_| Box::new(DisplacementRenderer::new(&device, TEXTURE_FORMAT, model.clone(), map.clone())) as Box<dyn Renderer>)
        .collect();
    let chain = RendererChain::new(renderers);

    tracing::info!(passes = chain.renderers().len(), "Encoding renderer chain");
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Displacement Chain") });
    chain.encode(&device, &mut encoder, &source_texture, &output_texture, &helper_texture, LoadAction::Clear, wgpu::Color::TRANSPARENT)?;
    queue.submit(std::iter::once(encoder.finish()));

    device.poll(wgpu::PollType::Wait)?;

    tracing::info!(path = %args.output.display(), "Saving result");
    let output_image = save_texture_to_image(&device, &queue, &output_texture)?;
    DynamicImage::ImageRgba32F(output_image).to_rgba8().save(&args.output)?;

    Ok(())
}

/// Uploads an image into a new Rgba32Float texture
fn load_image_to_texture(device: &wgpu::Device, queue: &wgpu::Queue, image: &DynamicImage, label: &str) -> wgpu::Texture {
    let rgba_image = image.to_rgba32f();
    let (width, height) = rgba_image.dimensions();
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(rgba_image.as_raw().as_slice()),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4 * 4), // 4 components * 4 bytes per f32
            rows_per_image: Some(height),
        },
        size,
    );

    texture
}

/// Creates a texture renderers can both render to and sample from
fn create_target_texture(device: &wgpu::Device, size: wgpu::Extent3d, label: &str) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

/// Downloads an Rgba32Float texture into an image
fn save_texture_to_image(device: &wgpu::Device, queue: &wgpu::Queue, texture: &wgpu::Texture) -> Result<image::Rgba32FImage, Box<dyn std::error::Error>> {
    let wgpu::Extent3d { width, height, .. } = texture.size();

    // Rows of a texture-to-buffer copy must be aligned
    let unpadded_bytes_per_row = width * 4 * 4;
    let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Output Buffer"),
        size: (padded_bytes_per_row * height) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Copy Encoder") });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        texture.size(),
    );
    queue.submit(std::iter::once(encoder.finish()));

    let buffer_slice = buffer.slice(..);
    let (sender, receiver) = futures_intrusive::channel::shared::oneshot_channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |v| {
        let _ = sender.send(v);
    });

    device.poll(wgpu::PollType::Wait)?;

    pollster::block_on(receiver.receive()).ok_or("Failed to map buffer for reading")??;

    let data = buffer_slice.get_mapped_range();
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for row in data.chunks(padded_bytes_per_row as usize) {
        pixels.extend_from_slice(bytemuck::cast_slice::<u8, f32>(&row[..unpadded_bytes_per_row as usize]));
    }

    image::Rgba32FImage::from_raw(width, height, pixels).ok_or_else(|| "Failed to create RGBA32F image from data".into())
}
