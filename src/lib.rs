// src/lib.rs
//! Background resource loading with main-thread GPU upload.
//!
//! Shader sources and images are read and decoded on a worker pool, handed
//! back through an upload queue, and turned into wgpu objects on the thread
//! that owns the device.
//!
//! ```no_run
//! use resource_pipeline::{ResourceContext, ShaderLoadRequest, TextureLoadRequest, WgpuBackend};
//!
//! let backend = WgpuBackend::headless().expect("no GPU adapter");
//! let mut resources = ResourceContext::new(backend);
//!
//! resources.request_resource(ShaderLoadRequest::new("sprite", "shaders/sprite.vert", "shaders/sprite.frag"));
//! resources.request_resource(TextureLoadRequest::new("ship", "textures/ship.png"));
//!
//! // Once per frame on the render thread:
//! resources.process_upload_queue(4);
//!
//! // Or block until everything has landed:
//! resources.wait_for_all_uploads();
//! let ship = resources.get_texture("ship")?;
//! # Ok::<(), resource_pipeline::Error>(())
//! ```

pub mod blocking_queue;
pub mod cache;
pub mod error;
pub mod gpu;
pub mod loader;
pub mod resource;
pub mod resource_context;
pub mod shader;
pub mod texture;
pub mod thread_pool;

#[cfg(test)]
pub(crate) mod testing;

pub use blocking_queue::BlockingQueue;
pub use cache::ResourceCache;
pub use error::{Error, Result};
pub use gpu::{GraphicsBackend, WgpuBackend};
pub use loader::{FsResourceLoader, ResourceLoader};
pub use resource::{
    LoadResult, ResourceData, ResourceError, ResourceErrorKind, ResourceKind, ResourceRequest,
    ShaderLoadRequest, ShaderSourceData, TextureLoadRequest, TextureRawData,
};
pub use resource_context::{ResourceConfig, ResourceContext, UploadTask};
pub use shader::Shader;
pub use texture::{Texture2D, TextureConfig};
pub use thread_pool::{TaskHandle, ThreadPool};
