// src/gpu/mod.rs
//! Graphics backend seam.
//!
//! [`ResourceContext`](crate::ResourceContext) only ever talks to the GPU through
//! a [`GraphicsBackend`], and only from `process_upload_queue`. The production
//! backend is [`WgpuBackend`]; tests swap in a CPU-only double.

mod wgpu_backend;

pub use wgpu_backend::WgpuBackend;

use crate::resource::{ResourceError, ShaderSourceData, TextureRawData};

/// Turns decoded CPU-side data into graphics objects.
///
/// Must be driven from the thread that owns the graphics context.
pub trait GraphicsBackend {
    type Shader;
    type Texture;

    fn create_shader(&self, key: &str, data: &ShaderSourceData) -> Result<Self::Shader, ResourceError>;

    fn create_texture(&self, key: &str, data: &TextureRawData) -> Result<Self::Texture, ResourceError>;
}

/// Run `create` inside a validation error scope and hand back what wgpu reported.
///
/// Without a scope wgpu routes validation errors to the uncaptured handler,
/// which panics by default.
pub(crate) fn capture_validation<T>(
    device: &wgpu::Device,
    create: impl FnOnce() -> T,
) -> (T, Option<wgpu::Error>) {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    let error = pollster::block_on(device.pop_error_scope());
    (value, error)
}
