// src/resource.rs
//! Requests, intermediate CPU-side data, and load errors.
//!
//! Everything in here is plain data. Requests are built by callers and consumed
//! once by the [`ResourceContext`](crate::ResourceContext). [`ResourceData`] is
//! produced by a loader on a worker thread and moved through the upload queue to
//! the GPU-owning thread.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

// ---------- Requests ----------

/// Everything needed to load and upload a shader program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderLoadRequest {
    pub name: String,
    pub vert_path: PathBuf,
    pub frag_path: PathBuf,
    /// `None` means the program has no geometry stage.
    pub geom_path: Option<PathBuf>,
}

impl ShaderLoadRequest {
    pub fn new(
        name: impl Into<String>,
        vert_path: impl Into<PathBuf>,
        frag_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            vert_path: vert_path.into(),
            frag_path: frag_path.into(),
            geom_path: None,
        }
    }

    pub fn with_geometry(mut self, geom_path: impl Into<PathBuf>) -> Self {
        self.geom_path = Some(geom_path.into());
        self
    }
}

/// Everything needed to load and upload a texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureLoadRequest {
    pub name: String,
    pub path: PathBuf,
}

impl TextureLoadRequest {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRequest {
    Shader(ShaderLoadRequest),
    Texture(TextureLoadRequest),
}

impl ResourceRequest {
    /// Logical name the resource will be cached under.
    pub fn name(&self) -> &str {
        match self {
            ResourceRequest::Shader(r) => &r.name,
            ResourceRequest::Texture(r) => &r.name,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceRequest::Shader(_) => ResourceKind::Shader,
            ResourceRequest::Texture(_) => ResourceKind::Texture,
        }
    }
}

impl From<ShaderLoadRequest> for ResourceRequest {
    fn from(request: ShaderLoadRequest) -> Self {
        ResourceRequest::Shader(request)
    }
}

impl From<TextureLoadRequest> for ResourceRequest {
    fn from(request: TextureLoadRequest) -> Self {
        ResourceRequest::Texture(request)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Shader,
    Texture,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Shader => "shader",
            ResourceKind::Texture => "texture",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------- Intermediate data ----------

/// Shader stage sources, read from disk but not yet compiled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderSourceData {
    pub vertex_source: String,
    pub fragment_source: String,
    pub geometry_source: Option<String>,
}

/// Decoded 8-bit pixel data, tightly packed, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRawData {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub pixels: Vec<u8>,
}

impl TextureRawData {
    /// `width * height * channels`, or `None` if it does not fit in `usize`.
    pub fn expected_len(&self) -> Option<usize> {
        pixel_buffer_len(self.width, self.height, self.channels)
    }
}

/// Checked `width * height * channels`.
pub(crate) fn pixel_buffer_len(width: u32, height: u32, channels: u8) -> Option<usize> {
    let w = usize::try_from(width).ok()?;
    let h = usize::try_from(height).ok()?;
    w.checked_mul(h)?.checked_mul(usize::from(channels))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceData {
    Shader(ShaderSourceData),
    Texture(TextureRawData),
}

impl ResourceData {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceData::Shader(_) => ResourceKind::Shader,
            ResourceData::Texture(_) => ResourceKind::Texture,
        }
    }
}

impl From<ShaderSourceData> for ResourceData {
    fn from(data: ShaderSourceData) -> Self {
        ResourceData::Shader(data)
    }
}

impl From<TextureRawData> for ResourceData {
    fn from(data: TextureRawData) -> Self {
        ResourceData::Texture(data)
    }
}

// ---------- Errors ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceErrorKind {
    FileNotFound,
    InvalidFormat,
    ParseError,
    GraphicsError,
    Unknown,
}

impl ResourceErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceErrorKind::FileNotFound => "file not found",
            ResourceErrorKind::InvalidFormat => "invalid format",
            ResourceErrorKind::ParseError => "parse error",
            ResourceErrorKind::GraphicsError => "graphics error",
            ResourceErrorKind::Unknown => "unknown error",
        }
    }
}

impl fmt::Display for ResourceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why and where loading or uploading a resource went wrong.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} ({}): {message}", .path.display())]
pub struct ResourceError {
    kind: ResourceErrorKind,
    message: String,
    path: PathBuf,
}

impl ResourceError {
    pub fn new(kind: ResourceErrorKind, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: path.into(),
        }
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(
            ResourceErrorKind::FileNotFound,
            path,
            "file was not found on the disk",
        )
    }

    pub fn invalid_format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(ResourceErrorKind::InvalidFormat, path, message)
    }

    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(ResourceErrorKind::ParseError, path, message)
    }

    pub fn graphics_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(ResourceErrorKind::GraphicsError, path, message)
    }

    pub fn unknown(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(ResourceErrorKind::Unknown, path, message)
    }

    #[inline]
    pub fn kind(&self) -> ResourceErrorKind {
        self.kind
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Outcome of a single load: decoded data or the reason it failed.
pub type LoadResult = Result<ResourceData, ResourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builders_and_names() {
        let shader: ResourceRequest = ShaderLoadRequest::new("sprite", "sprite.vert", "sprite.frag")
            .with_geometry("sprite.geom")
            .into();
        assert_eq!(shader.name(), "sprite");
        assert_eq!(shader.kind(), ResourceKind::Shader);
        match &shader {
            ResourceRequest::Shader(r) => {
                assert_eq!(r.geom_path.as_deref(), Some(Path::new("sprite.geom")))
            }
            ResourceRequest::Texture(_) => panic!("expected a shader request"),
        }

        let texture: ResourceRequest = TextureLoadRequest::new("ship", "ship.png").into();
        assert_eq!(texture.name(), "ship");
        assert_eq!(texture.kind(), ResourceKind::Texture);
    }

    #[test]
    fn error_display_carries_kind_path_and_message() {
        let err = ResourceError::invalid_format(Path::new("bad.png"), "truncated header");
        assert_eq!(err.kind(), ResourceErrorKind::InvalidFormat);
        assert_eq!(err.path(), Path::new("bad.png"));
        assert_eq!(err.to_string(), "invalid format (bad.png): truncated header");
    }

    #[test]
    fn constructors_accept_owned_and_borrowed_paths() {
        let owned = ResourceError::unknown(PathBuf::from("shaders/a.vert"), "loader panicked");
        let borrowed = ResourceError::graphics_error(Path::new("shaders/a.vert"), "bad");
        let by_key = ResourceError::parse_error("sprite", "bad");

        assert_eq!(owned.kind(), ResourceErrorKind::Unknown);
        assert_eq!(owned.path(), borrowed.path());
        assert_eq!(by_key.path(), Path::new("sprite"));
    }

    #[test]
    fn pixel_buffer_len_detects_overflow() {
        assert_eq!(pixel_buffer_len(2, 3, 4), Some(24));
        assert_eq!(pixel_buffer_len(0, 3, 4), Some(0));
        if usize::BITS <= 64 {
            assert_eq!(pixel_buffer_len(u32::MAX, u32::MAX, 4), None);
        }
    }
}
