// src/texture.rs
//! 2D textures created from decoded pixel data.

use std::borrow::Cow;
use std::path::Path;

use crate::gpu::capture_validation;
use crate::resource::{ResourceError, TextureRawData};

// ─────────────────────────────────────────────────────────────────────────────
// Texture configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Controls how a texture is created and sampled.
#[derive(Debug, Clone)]
pub struct TextureConfig {
    pub label: Option<String>,
    pub usage: wgpu::TextureUsages,
    pub address_mode: wgpu::AddressMode,
    pub mag_filter: wgpu::FilterMode,
    pub min_filter: wgpu::FilterMode,
    pub mipmap_filter: wgpu::FilterMode,
    /// Store 4-channel (and expanded 3-channel) data as sRGB.
    pub srgb: bool,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            label: None,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            address_mode: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            srgb: true,
        }
    }
}

impl TextureConfig {
    pub fn pixel_art() -> Self {
        Self {
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        }
    }

    pub fn repeating() -> Self {
        Self {
            address_mode: wgpu::AddressMode::Repeat,
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_usage(mut self, usage: wgpu::TextureUsages) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_address_mode(mut self, mode: wgpu::AddressMode) -> Self {
        self.address_mode = mode;
        self
    }

    pub fn with_srgb(mut self, srgb: bool) -> Self {
        self.srgb = srgb;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Upload preparation (CPU side)
// ─────────────────────────────────────────────────────────────────────────────

/// Pixels in the layout the GPU texture will use.
#[derive(Debug)]
pub(crate) struct PreparedPixels<'a> {
    pub format: wgpu::TextureFormat,
    pub bytes_per_pixel: u32,
    pub bytes: Cow<'a, [u8]>,
}

/// Validate `data` and pick a texture format for it.
///
/// Three-channel data is expanded to RGBA since wgpu has no 24-bit format.
pub(crate) fn prepare_pixels<'a>(
    data: &'a TextureRawData,
    srgb: bool,
    label: &str,
) -> Result<PreparedPixels<'a>, ResourceError> {
    let path = Path::new(label);

    if data.width == 0 || data.height == 0 {
        return Err(ResourceError::graphics_error(
            path,
            format!("invalid texture dimensions {}x{}", data.width, data.height),
        ));
    }

    let expected = data.expected_len().ok_or_else(|| {
        ResourceError::graphics_error(path, "texture byte size overflows")
    })?;
    if data.pixels.len() != expected {
        return Err(ResourceError::graphics_error(
            path,
            format!(
                "pixel buffer holds {} bytes, {}x{}x{} needs {}",
                data.pixels.len(),
                data.width,
                data.height,
                data.channels,
                expected
            ),
        ));
    }

    let rgba = if srgb {
        wgpu::TextureFormat::Rgba8UnormSrgb
    } else {
        wgpu::TextureFormat::Rgba8Unorm
    };

    let prepared = match data.channels {
        1 => PreparedPixels {
            format: wgpu::TextureFormat::R8Unorm,
            bytes_per_pixel: 1,
            bytes: Cow::Borrowed(&data.pixels),
        },
        2 => PreparedPixels {
            format: wgpu::TextureFormat::Rg8Unorm,
            bytes_per_pixel: 2,
            bytes: Cow::Borrowed(&data.pixels),
        },
        3 => PreparedPixels {
            format: rgba,
            bytes_per_pixel: 4,
            bytes: Cow::Owned(rgb_to_rgba(&data.pixels)),
        },
        4 => PreparedPixels {
            format: rgba,
            bytes_per_pixel: 4,
            bytes: Cow::Borrowed(&data.pixels),
        },
        other => {
            return Err(ResourceError::graphics_error(
                path,
                format!("unsupported channel count {}", other),
            ))
        }
    };
    Ok(prepared)
}

fn rgb_to_rgba(rgb: &[u8]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(rgb.len() / 3 * 4);
    for px in rgb.chunks_exact(3) {
        rgba.extend_from_slice(px);
        rgba.push(u8::MAX);
    }
    rgba
}

// ─────────────────────────────────────────────────────────────────────────────
// Core texture struct
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Texture2D {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    width: u32,
    height: u32,
    channels: u8,
}

impl Texture2D {
    /// Create the texture, upload mip 0 and build a view and sampler.
    pub fn from_raw(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &TextureRawData,
        config: &TextureConfig,
    ) -> Result<Self, ResourceError> {
        let label = config.label.as_deref().unwrap_or("texture");
        let prepared = prepare_pixels(data, config.srgb, label)?;

        let max = device.limits().max_texture_dimension_2d;
        if data.width > max || data.height > max {
            return Err(ResourceError::graphics_error(
                Path::new(label),
                format!(
                    "{}x{} exceeds the device limit of {}",
                    data.width, data.height, max
                ),
            ));
        }

        let size = wgpu::Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        };

        let (texture, error) = capture_validation(device, || {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: config.label.as_deref(),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: prepared.format,
                usage: config.usage | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });

            queue.write_texture(
                wgpu::ImageCopyTexture {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                },
                &prepared.bytes,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(prepared.bytes_per_pixel * data.width),
                    rows_per_image: Some(data.height),
                },
                size,
            );
            texture
        });

        if let Some(e) = error {
            return Err(ResourceError::graphics_error(
                Path::new(label),
                format!("texture creation failed: {}", e),
            ));
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: config.label.as_deref(),
            address_mode_u: config.address_mode,
            address_mode_v: config.address_mode,
            address_mode_w: config.address_mode,
            mag_filter: config.mag_filter,
            min_filter: config.min_filter,
            mipmap_filter: config.mipmap_filter,
            ..Default::default()
        });

        Ok(Self {
            texture,
            view,
            sampler,
            width: data.width,
            height: data.height,
            channels: data.channels,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channel count of the decoded source data.
    #[inline]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    #[inline]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.texture.format()
    }

    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}
