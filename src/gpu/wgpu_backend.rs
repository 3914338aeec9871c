// src/gpu/wgpu_backend.rs

use std::sync::Arc;

use crate::gpu::GraphicsBackend;
use crate::resource::{ResourceError, ShaderSourceData, TextureRawData};
use crate::shader::Shader;
use crate::texture::{Texture2D, TextureConfig};

/// Creates [`Shader`]s and [`Texture2D`]s on a shared wgpu device.
#[derive(Clone)]
pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    texture_config: TextureConfig,
}

impl WgpuBackend {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        Self::with_texture_config(device, queue, TextureConfig::default())
    }

    pub fn with_texture_config(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        texture_config: TextureConfig,
    ) -> Self {
        Self {
            device,
            queue,
            texture_config,
        }
    }

    /// Device and queue without a surface, for tools and tests.
    ///
    /// Returns `None` when no adapter or device is available on this machine.
    pub fn headless() -> Option<Self> {
        pollster::block_on(Self::request_headless())
    }

    async fn request_headless() -> Option<Self> {
        let instance = wgpu::Instance::default();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;

        let (device, queue) = match adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("resource_pipeline_headless"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.limits(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
        {
            Ok(pair) => pair,
            Err(e) => {
                log::warn!("headless device request failed: {}", e);
                return None;
            }
        };

        log::debug!("headless wgpu backend on {:?}", adapter.get_info().name);
        Some(Self::new(Arc::new(device), Arc::new(queue)))
    }

    #[inline]
    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    #[inline]
    pub fn texture_config(&self) -> &TextureConfig {
        &self.texture_config
    }
}

impl GraphicsBackend for WgpuBackend {
    type Shader = Shader;
    type Texture = Texture2D;

    fn create_shader(&self, key: &str, data: &ShaderSourceData) -> Result<Shader, ResourceError> {
        Shader::from_sources(&self.device, key, data)
    }

    fn create_texture(&self, key: &str, data: &TextureRawData) -> Result<Texture2D, ResourceError> {
        let config = self.texture_config.clone().with_label(key);
        Texture2D::from_raw(&self.device, &self.queue, data, &config)
    }
}
