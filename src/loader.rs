// src/loader.rs
//! Disk loading and decoding, safe to run on any worker thread.
//!
//! A [`ResourceLoader`] turns paths into [`ResourceData`] and never touches the
//! graphics device. Failures are returned as [`ResourceError`] values.

use std::fs;
use std::path::Path;

use image::DynamicImage;

use crate::resource::{
    pixel_buffer_len, LoadResult, ResourceError, ShaderSourceData, TextureRawData,
};

/// Synchronous loader used by worker threads.
///
/// Implementations must be callable from several threads at once.
pub trait ResourceLoader: Send + Sync {
    /// Read the stage sources of a shader program. `geom_path` is optional.
    fn load_shader(&self, vert_path: &Path, frag_path: &Path, geom_path: Option<&Path>) -> LoadResult;

    /// Decode an image file into tightly packed 8-bit pixels.
    fn load_texture(&self, path: &Path) -> LoadResult;
}

/// Loads from the local filesystem, decoding images with `image`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsResourceLoader;

impl FsResourceLoader {
    pub fn new() -> Self {
        Self
    }

    fn read_source(path: &Path) -> Result<String, ResourceError> {
        if !path.exists() {
            return Err(ResourceError::file_not_found(path));
        }
        fs::read_to_string(path).map_err(|e| {
            ResourceError::invalid_format(path, format!("failed to read shader source: {}", e))
        })
    }
}

impl ResourceLoader for FsResourceLoader {
    fn load_shader(&self, vert_path: &Path, frag_path: &Path, geom_path: Option<&Path>) -> LoadResult {
        let vertex_source = Self::read_source(vert_path)?;
        let fragment_source = Self::read_source(frag_path)?;
        let geometry_source = geom_path.map(Self::read_source).transpose()?;

        Ok(ShaderSourceData {
            vertex_source,
            fragment_source,
            geometry_source,
        }
        .into())
    }

    fn load_texture(&self, path: &Path) -> LoadResult {
        if !path.exists() {
            return Err(ResourceError::file_not_found(path));
        }

        let img = image::open(path)
            .map_err(|e| ResourceError::invalid_format(path, format!("image decoding failed: {}", e)))?;

        let width = img.width();
        let height = img.height();
        let channels = img.color().channel_count();

        if width == 0 || height == 0 || channels == 0 {
            return Err(ResourceError::invalid_format(
                path,
                format!("invalid image dimensions: {}x{}x{}", width, height, channels),
            ));
        }

        let expected = pixel_buffer_len(width, height, channels).ok_or_else(|| {
            ResourceError::invalid_format(
                path,
                format!("image too large: {}x{}x{} overflows", width, height, channels),
            )
        })?;

        let pixels = into_8bit_pixels(img, channels).ok_or_else(|| {
            ResourceError::invalid_format(path, format!("unsupported channel count: {}", channels))
        })?;

        if pixels.len() != expected {
            return Err(ResourceError::invalid_format(
                path,
                format!("decoded {} bytes, expected {}", pixels.len(), expected),
            ));
        }

        Ok(TextureRawData {
            width,
            height,
            channels,
            pixels,
        }
        .into())
    }
}

/// Collapse any sample type to 8 bits while keeping the channel layout.
fn into_8bit_pixels(img: DynamicImage, channels: u8) -> Option<Vec<u8>> {
    match channels {
        1 => Some(img.into_luma8().into_raw()),
        2 => Some(img.into_luma_alpha8().into_raw()),
        3 => Some(img.into_rgb8().into_raw()),
        4 => Some(img.into_rgba8().into_raw()),
        _ => None,
    }
}
