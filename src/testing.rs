// src/testing.rs
//! Test fixtures shared by the unit tests: on-disk resources, a scripted loader
//! and a CPU-only graphics backend.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::TempDir;

use crate::gpu::GraphicsBackend;
use crate::loader::ResourceLoader;
use crate::resource::{
    LoadResult, ResourceError, ShaderSourceData, TextureRawData,
};
use crate::texture::prepare_pixels;

pub(crate) const VERTEX_WGSL: &str = r#"
@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {
    let x = f32(i32(index) - 1);
    let y = f32(i32(index & 1u) * 2 - 1);
    return vec4<f32>(x, y, 0.0, 1.0);
}
"#;

pub(crate) const FRAGMENT_WGSL: &str = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.5, 0.2, 1.0);
}
"#;

const GEOMETRY_SOURCE: &str = "// geometry stage placeholder\n";

// ---------- Logging ----------

static CAPTURED: Mutex<Vec<(log::Level, String)>> = parking_lot::const_mutex(Vec::new());
static LOGGER_INIT: Once = Once::new();

/// Records every log line for assertions and forwards it to `env_logger`.
struct CapturingLogger {
    inner: env_logger::Logger,
}

impl log::Log for CapturingLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        CAPTURED.lock().push((record.level(), record.args().to_string()));
        if self.inner.enabled(record.metadata()) {
            self.inner.log(record);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Install the test logger once per test binary.
pub(crate) fn init_logger() {
    LOGGER_INIT.call_once(|| {
        let inner = env_logger::Builder::from_default_env().is_test(true).build();
        let logger: &'static CapturingLogger = Box::leak(Box::new(CapturingLogger { inner }));
        if log::set_logger(logger).is_ok() {
            log::set_max_level(log::LevelFilter::Trace);
        }
    });
}

/// Whether any test has logged a `level` line containing `needle`.
///
/// Tests share one process, so needles should be unique to the calling test.
pub(crate) fn logged(level: log::Level, needle: &str) -> bool {
    CAPTURED
        .lock()
        .iter()
        .any(|(l, message)| *l == level && message.contains(needle))
}

// ---------- ResourceGenerator ----------

/// Temp directory holding `test.vert`, `test.frag`, `test.geom` and a 1x1
/// white RGBA `test.png`. Removed on drop.
pub(crate) struct ResourceGenerator {
    dir: TempDir,
}

impl ResourceGenerator {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let fixtures = Self { dir };

        fixtures.write_text("test.vert", VERTEX_WGSL);
        fixtures.write_text("test.frag", FRAGMENT_WGSL);
        fixtures.write_text("test.geom", GEOMETRY_SOURCE);

        let png = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        png.save(fixtures.texture_path()).unwrap();

        fixtures
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn vert_path(&self) -> PathBuf {
        self.path().join("test.vert")
    }

    pub fn frag_path(&self) -> PathBuf {
        self.path().join("test.frag")
    }

    pub fn geom_path(&self) -> PathBuf {
        self.path().join("test.geom")
    }

    pub fn texture_path(&self) -> PathBuf {
        self.path().join("test.png")
    }

    pub fn write_text(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    /// Opaque RGB gradient, `width` x `height`.
    pub fn write_rgb_png(&self, name: &str, width: u32, height: u32) -> PathBuf {
        let path = self.path().join(name);
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 40) as u8, (y * 40) as u8, 128])
        });
        img.save(&path).unwrap();
        path
    }
}

// ---------- MockLoader ----------

/// Scripted loader. Unknown paths succeed with canned data unless a failure
/// or a panic was registered for them.
#[derive(Default)]
pub(crate) struct MockLoader {
    failures: Mutex<HashMap<PathBuf, ResourceError>>,
    panics: Mutex<Vec<PathBuf>>,
    delay: Option<Duration>,
    shader_calls: AtomicUsize,
    texture_calls: AtomicUsize,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every load.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail(&self, path: impl Into<PathBuf>, error: ResourceError) {
        self.failures.lock().insert(path.into(), error);
    }

    pub fn panic_on(&self, path: impl Into<PathBuf>) {
        self.panics.lock().push(path.into());
    }

    pub fn shader_calls(&self) -> usize {
        self.shader_calls.load(Ordering::SeqCst)
    }

    pub fn texture_calls(&self) -> usize {
        self.texture_calls.load(Ordering::SeqCst)
    }

    fn scripted(&self, path: &Path) -> Option<ResourceError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.panics.lock().iter().any(|p| p == path) {
            panic!("mock loader told to panic on {}", path.display());
        }
        self.failures.lock().get(path).cloned()
    }
}

impl ResourceLoader for MockLoader {
    fn load_shader(&self, vert_path: &Path, _frag_path: &Path, geom_path: Option<&Path>) -> LoadResult {
        self.shader_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.scripted(vert_path) {
            return Err(err);
        }
        Ok(ShaderSourceData {
            vertex_source: VERTEX_WGSL.to_string(),
            fragment_source: FRAGMENT_WGSL.to_string(),
            geometry_source: geom_path.map(|_| GEOMETRY_SOURCE.to_string()),
        }
        .into())
    }

    fn load_texture(&self, path: &Path) -> LoadResult {
        self.texture_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.scripted(path) {
            return Err(err);
        }
        Ok(TextureRawData {
            width: 1,
            height: 1,
            channels: 4,
            pixels: vec![255; 4],
        }
        .into())
    }
}

// ---------- HeadlessBackend ----------

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FakeShader {
    pub key: String,
    pub vertex_source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FakeTexture {
    pub key: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// CPU-only backend. Applies the same buffer checks as the wgpu backend and
/// rejects geometry stages the same way.
#[derive(Default)]
pub(crate) struct HeadlessBackend {
    pub created: AtomicUsize,
    /// Panic instead of creating anything for this key.
    pub panic_on: Option<String>,
}

impl HeadlessBackend {
    fn check_panic(&self, key: &str) {
        if self.panic_on.as_deref() == Some(key) {
            panic!("headless backend told to panic on {}", key);
        }
    }
}

impl GraphicsBackend for HeadlessBackend {
    type Shader = FakeShader;
    type Texture = FakeTexture;

    fn create_shader(&self, key: &str, data: &ShaderSourceData) -> Result<FakeShader, ResourceError> {
        self.check_panic(key);
        if data.geometry_source.is_some() {
            return Err(ResourceError::graphics_error(
                Path::new(key),
                "geometry shaders are not supported",
            ));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(FakeShader {
            key: key.to_string(),
            vertex_source: data.vertex_source.clone(),
        })
    }

    fn create_texture(&self, key: &str, data: &TextureRawData) -> Result<FakeTexture, ResourceError> {
        self.check_panic(key);
        let prepared = prepare_pixels(data, true, key)?;
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(FakeTexture {
            key: key.to_string(),
            width: data.width,
            height: data.height,
            bytes: prepared.bytes.into_owned(),
        })
    }
}
