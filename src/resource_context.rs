// src/resource_context.rs
//! Asynchronous resource loading with main-thread GPU upload.
//!
//! `request_resource` schedules a load on the worker pool and returns at once.
//! Workers push an [`UploadTask`] onto the upload queue; the thread that owns the
//! graphics context drains it with `process_upload_queue`, creating GPU objects
//! through the [`GraphicsBackend`] and storing them in the per-kind caches.
//!
//! The in-flight counter goes up once per accepted request and down once per
//! processed task, whether the task succeeded or failed.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::blocking_queue::BlockingQueue;
use crate::cache::ResourceCache;
use crate::error::Result;
use crate::gpu::GraphicsBackend;
use crate::loader::{FsResourceLoader, ResourceLoader};
use crate::resource::{LoadResult, ResourceData, ResourceError, ResourceKind, ResourceRequest};
use crate::thread_pool::{panic_payload_to_string, ThreadPool};

// ---------- Configuration ----------

#[derive(Debug, Clone)]
pub struct ResourceConfig {
    /// Explicit pool size. `None` derives it from the hardware.
    pub worker_count: Option<usize>,
    /// Available parallelism is divided by this when `worker_count` is `None`.
    pub worker_divisor: usize,
    pub thread_name_prefix: String,
    /// Sleep between polls in the upload barriers; zero only yields.
    pub wait_yield_interval: Duration,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            worker_count: None,
            worker_divisor: 4,
            thread_name_prefix: "resource-loader".to_string(),
            wait_yield_interval: Duration::ZERO,
        }
    }
}

impl ResourceConfig {
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = Some(count);
        self
    }

    pub fn with_worker_divisor(mut self, divisor: usize) -> Self {
        self.worker_divisor = divisor;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: &str) -> Self {
        self.thread_name_prefix = prefix.to_string();
        self
    }

    pub fn with_wait_yield_interval(mut self, interval: Duration) -> Self {
        self.wait_yield_interval = interval;
        self
    }

    /// Pool size actually used, never below one.
    pub fn resolved_worker_count(&self) -> usize {
        let count = self.worker_count.unwrap_or_else(|| {
            let hardware = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
            hardware / self.worker_divisor.max(1)
        });
        count.max(1)
    }
}

// ---------- Upload tasks ----------

/// A finished load waiting for the GPU-owning thread.
#[derive(Debug)]
pub struct UploadTask {
    pub key: String,
    pub kind: ResourceKind,
    pub result: LoadResult,
}

// ---------- Context ----------

pub struct ResourceContext<B: GraphicsBackend> {
    backend: B,
    loader: Arc<dyn ResourceLoader>,
    pool: ThreadPool,
    upload_queue: Arc<BlockingQueue<UploadTask>>,
    in_flight: Arc<AtomicUsize>,
    shaders: ResourceCache<B::Shader>,
    textures: ResourceCache<B::Texture>,
    failures: HashMap<String, ResourceError>,
    config: ResourceConfig,
}

impl<B: GraphicsBackend> ResourceContext<B> {
    /// Filesystem loader and default configuration.
    pub fn new(backend: B) -> Self {
        Self::with_loader(backend, Arc::new(FsResourceLoader::new()))
    }

    pub fn with_loader(backend: B, loader: Arc<dyn ResourceLoader>) -> Self {
        Self::with_config(backend, loader, ResourceConfig::default())
    }

    pub fn with_config(backend: B, loader: Arc<dyn ResourceLoader>, config: ResourceConfig) -> Self {
        let workers = config.resolved_worker_count();
        let pool = ThreadPool::with_name(&config.thread_name_prefix, workers);
        log::info!("resource context started with {} loader threads", workers);

        Self {
            backend,
            loader,
            pool,
            upload_queue: Arc::new(BlockingQueue::new()),
            in_flight: Arc::new(AtomicUsize::new(0)),
            shaders: ResourceCache::new(),
            textures: ResourceCache::new(),
            failures: HashMap::new(),
            config,
        }
    }

    /// Schedule `request` on the loader pool. Never blocks.
    pub fn request_resource(&self, request: impl Into<ResourceRequest>) {
        let request = request.into();
        let key = request.name().to_string();
        let kind = request.kind();

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        log::debug!("requested {} '{}'", kind, key);

        let loader = Arc::clone(&self.loader);
        let queue = Arc::clone(&self.upload_queue);

        // The handle is not needed: results travel through the upload queue.
        let _ = self.pool.enqueue(move || {
            let result = load_guarded(loader.as_ref(), &request);
            queue.push(UploadTask { key, kind, result });
        });
    }

    /// Upload up to `max_uploads` finished loads; `0` drains everything queued.
    ///
    /// Must run on the thread that owns the graphics context. Returns the number
    /// of tasks processed.
    pub fn process_upload_queue(&mut self, max_uploads: usize) -> usize {
        let mut processed = 0;
        while max_uploads == 0 || processed < max_uploads {
            let Some(task) = self.upload_queue.try_pop() else {
                break;
            };
            self.upload(task);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            processed += 1;
        }
        processed
    }

    fn upload(&mut self, task: UploadTask) {
        let UploadTask { key, kind, result } = task;

        let uploaded = result.and_then(|data| {
            if data.kind() != kind {
                return Err(ResourceError::unknown(
                    key.as_str(),
                    format!("loader returned {} data for a {} request", data.kind(), kind),
                ));
            }
            self.create_and_store(&key, &data)
        });

        match uploaded {
            Ok(()) => {
                log::info!("Loaded {} '{}'", kind, key);
                self.failures.remove(&key);
            }
            Err(err) => {
                log::error!(
                    "Failed to load {} '{}' ({}): {} [{}]",
                    kind,
                    key,
                    err.kind(),
                    err.message(),
                    err.path().display()
                );
                self.failures.insert(key, err);
            }
        }
    }

    /// Build the graphics object and cache it. A backend panic becomes a
    /// `GraphicsError` so the task still counts as processed.
    fn create_and_store(&mut self, key: &str, data: &ResourceData) -> std::result::Result<(), ResourceError> {
        let backend = &self.backend;
        let created = panic::catch_unwind(AssertUnwindSafe(|| match data {
            ResourceData::Shader(source) => backend.create_shader(key, source).map(Created::Shader),
            ResourceData::Texture(pixels) => backend.create_texture(key, pixels).map(Created::Texture),
        }))
        .unwrap_or_else(|payload| {
            Err(ResourceError::graphics_error(
                key,
                format!("graphics backend panicked: {}", panic_payload_to_string(&*payload)),
            ))
        })?;

        match created {
            Created::Shader(shader) => self.shaders.store(key, Arc::new(shader)),
            Created::Texture(texture) => self.textures.store(key, Arc::new(texture)),
        }
        Ok(())
    }

    /// Block until every accepted request has been uploaded or has failed.
    ///
    /// Loads discarded by a cancelling pool shutdown never finish, so this can
    /// wait forever in that case; use [`wait_for_all_uploads_timeout`] to bound it.
    ///
    /// [`wait_for_all_uploads_timeout`]: Self::wait_for_all_uploads_timeout
    pub fn wait_for_all_uploads(&mut self) {
        loop {
            self.process_upload_queue(0);
            if self.in_flight() == 0 {
                return;
            }
            self.pause();
        }
    }

    /// Like [`wait_for_all_uploads`](Self::wait_for_all_uploads) but gives up
    /// after `timeout`. Returns `true` when nothing is left in flight.
    pub fn wait_for_all_uploads_timeout(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.process_upload_queue(0);
            if self.in_flight() == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                log::warn!(
                    "gave up waiting for uploads after {:?}, {} still in flight",
                    timeout,
                    self.in_flight()
                );
                return false;
            }
            self.pause();
        }
    }

    fn pause(&self) {
        if self.config.wait_yield_interval.is_zero() {
            thread::yield_now();
        } else {
            thread::sleep(self.config.wait_yield_interval);
        }
    }

    pub fn get_shader(&self, key: &str) -> Result<Arc<B::Shader>> {
        self.shaders.get(key)
    }

    pub fn get_texture(&self, key: &str) -> Result<Arc<B::Texture>> {
        self.textures.get(key)
    }

    /// Most recent failure for `key`, cleared once that key uploads successfully.
    pub fn last_error(&self, key: &str) -> Option<&ResourceError> {
        self.failures.get(key)
    }

    pub fn failed_keys(&self) -> impl Iterator<Item = &str> {
        self.failures.keys().map(String::as_str)
    }

    /// Finished loads sitting in the upload queue.
    pub fn has_pending_uploads(&self) -> bool {
        !self.upload_queue.is_empty()
    }

    pub fn pending_upload_tasks(&self) -> usize {
        self.upload_queue.len()
    }

    /// Cached shaders plus cached textures.
    pub fn total_resources(&self) -> usize {
        self.shaders.len() + self.textures.len()
    }

    /// Accepted requests not yet uploaded or failed.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    /// Drop every cached resource and failure record.
    ///
    /// Handles already given out stay valid until their holders drop them.
    pub fn clear(&mut self) {
        self.shaders.clear();
        self.textures.clear();
        self.failures.clear();
    }
}

impl<B: GraphicsBackend> Drop for ResourceContext<B> {
    fn drop(&mut self) {
        self.pool.shutdown(true);
        self.upload_queue.close();

        let mut discarded = 0;
        while self.upload_queue.try_pop().is_some() {
            discarded += 1;
        }
        if discarded > 0 {
            log::warn!(
                "resource context dropped with {} loaded resources never uploaded",
                discarded
            );
        }
    }
}

/// Run the matching loader call, turning a panic into an `Unknown` error.
fn load_guarded(loader: &dyn ResourceLoader, request: &ResourceRequest) -> LoadResult {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| match request {
        ResourceRequest::Shader(r) => loader.load_shader(&r.vert_path, &r.frag_path, r.geom_path.as_deref()),
        ResourceRequest::Texture(r) => loader.load_texture(&r.path),
    }));

    outcome.unwrap_or_else(|payload| {
        Err(ResourceError::unknown(
            request_path(request),
            format!("loader panicked: {}", panic_payload_to_string(&*payload)),
        ))
    })
}

enum Created<S, T> {
    Shader(S),
    Texture(T),
}

fn request_path(request: &ResourceRequest) -> PathBuf {
    match request {
        ResourceRequest::Shader(r) => r.vert_path.clone(),
        ResourceRequest::Texture(r) => r.path.clone(),
    }
}
