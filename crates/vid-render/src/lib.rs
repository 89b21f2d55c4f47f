//! GPU renderer chains with ping-pong texture planning
//!
//! This crate encodes sequences of wgpu renderers onto a caller-owned output texture,
//! reusing a single helper texture for every intermediate result. The texture roles of each
//! renderer are planned by [`plan_io_resources`] from the renderers' in-place/out-of-place
//! semantics alone. It also provides a displacement renderer that warps its input by offsets
//! read from a displacement map.

mod displacement_renderer;
mod error;
mod io_resources;
mod renderer;
mod renderer_chain;

pub mod parameters;
pub mod render_model;

pub use displacement_renderer::{DISPLACEMENT_SHADER, DisplacementMap, DisplacementRenderer};
pub use error::{Error, ErrorKind, Result};
pub use io_resources::{IoResourceSemantics, IoResources, LoadAction, RenderPassConfig, TextureInput, TextureStorage, plan_io_resources};
pub use renderer::Renderer;
pub use renderer_chain::RendererChain;
pub use wgpu;
