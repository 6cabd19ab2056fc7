//! Render coordinator: cache lookups, single-flight renders, eviction.
//!
//! For each track ID the coordinator either serves the stored image, becomes
//! the one owner of a new render, or waits on the render already in flight.
//! Failures are delivered to everyone waiting on that attempt and then
//! forgotten, so the next request starts over.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::error::{PreviewError, Result};
use crate::metadata::MetadataResolver;
use crate::render::{PreviewTemplate, RenderBackend};

use super::pending::{PendingRender, RenderOutcome};
use super::store::RenderStore;

/// Default time between full cache sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Default bound on a single backend call.
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared handle to the render cache. Cloning is cheap.
#[derive(Clone)]
pub struct RenderCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    store: RenderStore,
    /// Renders in flight, by track ID.
    pending: Mutex<HashMap<String, Arc<PendingRender>>>,
    resolver: Arc<dyn MetadataResolver>,
    backend: Arc<dyn RenderBackend>,
    template: PreviewTemplate,
    render_timeout: Duration,
}

/// What a cache miss turned into.
enum Claim {
    /// Another render finished between the lookup and the claim.
    Stored(Bytes),
    /// This caller starts the render.
    Owner(Arc<PendingRender>),
    /// A render is already running.
    Waiter(Arc<PendingRender>),
}

impl RenderCoordinator {
    pub fn new(
        resolver: Arc<dyn MetadataResolver>,
        backend: Arc<dyn RenderBackend>,
        template: PreviewTemplate,
        render_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: RenderStore::new(),
                pending: Mutex::new(HashMap::new()),
                resolver,
                backend,
                template,
                render_timeout,
            }),
        }
    }

    /// Returns the rendered card for a track, rendering it at most once.
    pub async fn get(&self, track_id: &str) -> Result<Bytes> {
        if let Some(image) = self.inner.store.get(track_id) {
            log::debug!("cache hit for {}", track_id);
            return Ok(image);
        }

        match self.inner.claim(track_id) {
            Claim::Stored(image) => Ok(image),
            Claim::Waiter(pending) => {
                log::debug!("waiting on in-flight render for {}", track_id);
                pending.wait().await
            }
            Claim::Owner(pending) => {
                self.spawn_render(track_id.to_string(), Arc::clone(&pending));
                pending.wait().await
            }
        }
    }

    /// Runs the owner's render detached from the caller.
    ///
    /// The caller may be cancelled (client disconnect) without stranding
    /// waiters; a panic in the render is published as an internal error.
    fn spawn_render(&self, track_id: String, pending: Arc<PendingRender>) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let worker = Arc::clone(&inner);
            let key = track_id.clone();
            let outcome = match tokio::spawn(async move { worker.render(&key).await }).await {
                Ok(outcome) => outcome,
                Err(e) => Err(PreviewError::internal(format!(
                    "render task for {} failed: {}",
                    track_id, e
                ))),
            };
            inner.finish(&track_id, &pending, outcome);
        });
    }

    /// Drops every stored image. Returns how many were evicted.
    pub fn sweep(&self) -> usize {
        self.inner.sweep()
    }

    /// Starts the periodic sweep. The first sweep happens one `period` from now.
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            loop {
                ticker.tick().await;
                inner.sweep();
            }
        })
    }

    /// Returns the number of stored images.
    pub fn len(&self) -> usize {
        self.inner.store.len()
    }

    /// Returns true if no image is stored.
    pub fn is_empty(&self) -> bool {
        self.inner.store.is_empty()
    }

    /// Checks if a track has a stored image.
    pub fn contains(&self, track_id: &str) -> bool {
        self.inner.store.contains(track_id)
    }

    /// Returns the number of renders currently in flight.
    pub fn in_flight(&self) -> usize {
        self.inner.pending.lock().len()
    }
}

impl Inner {
    /// Atomically re-checks the store and claims or joins a render.
    fn claim(&self, track_id: &str) -> Claim {
        let mut pending = self.pending.lock();

        // Owners store before they unregister, so this catches a render
        // that completed after the caller's first lookup.
        if let Some(image) = self.store.get(track_id) {
            return Claim::Stored(image);
        }

        if let Some(existing) = pending.get(track_id) {
            return Claim::Waiter(Arc::clone(existing));
        }

        let handle = Arc::new(PendingRender::new());
        pending.insert(track_id.to_string(), Arc::clone(&handle));
        Claim::Owner(handle)
    }

    /// Resolves metadata and calls the backend.
    async fn render(&self, track_id: &str) -> Result<Bytes> {
        let started = Instant::now();

        let preview = self.resolver.resolve(track_id).await?;
        let request = self.template.build(&preview);

        let image = tokio::time::timeout(self.render_timeout, self.backend.render(&request))
            .await
            .map_err(|_| PreviewError::render_timeout(self.render_timeout))??;

        log::info!(
            "rendered {} in {:.2}s ({} bytes)",
            track_id,
            started.elapsed().as_secs_f32(),
            image.len()
        );
        Ok(image)
    }

    /// Stores a successful image, unregisters the render and wakes waiters.
    fn finish(&self, track_id: &str, pending: &PendingRender, outcome: RenderOutcome) {
        let outcome = match outcome {
            Ok(image) => Ok(self.store.insert(track_id.to_string(), image)),
            Err(e) => {
                log::warn!("render for {} failed [{}]: {}", track_id, e.code, e.message);
                Err(e)
            }
        };

        self.pending.lock().remove(track_id);
        pending.complete(outcome);
    }

    fn sweep(&self) -> usize {
        let evicted = self.store.sweep();
        log::info!("cache sweep evicted {} images", evicted);
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::types::{Artist, Asset, CoverArt, RenderRequest, TrackPreview};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Knows every track except "missing"; `artists` are used for all tracks.
    struct FakeResolver {
        artists: Vec<Artist>,
    }

    #[async_trait]
    impl MetadataResolver for FakeResolver {
        async fn resolve(&self, track_id: &str) -> Result<TrackPreview> {
            if track_id == "missing" {
                return Err(PreviewError::metadata_unavailable(track_id, "not found"));
            }
            Ok(TrackPreview {
                track_name: track_id.to_string(),
                artists: self.artists.clone(),
                cover_art: CoverArt {
                    small: format!("https://img/{}", track_id),
                    ..CoverArt::default()
                },
                background_color: "#000000".to_string(),
                audio_url: String::new(),
            })
        }
    }

    /// Counts calls and echoes the track name literal back as the image.
    #[derive(Default)]
    struct FakeBackend {
        calls: AtomicUsize,
        fail: AtomicBool,
        delay: Duration,
        /// Track name whose render never finishes in test time.
        stall: Option<&'static str>,
        requests: Mutex<Vec<RenderRequest>>,
    }

    impl FakeBackend {
        fn with_delay(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RenderBackend for FakeBackend {
        async fn render(&self, request: &RenderRequest) -> Result<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().push(request.clone());

            let name = match request.asset("track_name") {
                Some(Asset::Literal { literal, .. }) => literal.clone(),
                _ => String::new(),
            };
            if self.stall.is_some_and(|s| name.contains(s)) {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            tokio::time::sleep(self.delay).await;

            if self.fail.load(Ordering::SeqCst) {
                return Err(PreviewError::backend_status(500, "boom"));
            }
            Ok(Bytes::from(format!("png:{}", name)))
        }
    }

    fn coordinator_with(backend: Arc<FakeBackend>, artists: Vec<Artist>) -> RenderCoordinator {
        RenderCoordinator::new(
            Arc::new(FakeResolver { artists }),
            backend,
            PreviewTemplate::embedded("unknown"),
            Duration::from_secs(5),
        )
    }

    fn coordinator(backend: Arc<FakeBackend>) -> RenderCoordinator {
        coordinator_with(backend, vec![Artist::new("A")])
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_render() {
        let backend = Arc::new(FakeBackend::with_delay(Duration::from_millis(100)));
        let cache = coordinator(Arc::clone(&backend));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.get("abc123").await }));
        }

        let mut images = Vec::new();
        for handle in handles {
            images.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(backend.calls(), 1);
        assert!(images.iter().all(|img| *img == images[0]));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.in_flight(), 0);
    }

    #[tokio::test]
    async fn cached_get_skips_backend() {
        let backend = Arc::new(FakeBackend::default());
        let cache = coordinator(Arc::clone(&backend));

        let first = cache.get("abc123").await.unwrap();
        let second = cache.get("abc123").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn sweep_forces_one_new_render() {
        let backend = Arc::new(FakeBackend::default());
        let cache = coordinator(Arc::clone(&backend));

        cache.get("abc123").await.unwrap();
        assert_eq!(cache.sweep(), 1);
        assert!(cache.is_empty());

        cache.get("abc123").await.unwrap();
        cache.get("abc123").await.unwrap();
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn sweep_leaves_in_flight_render_alone() {
        let backend = Arc::new(FakeBackend::with_delay(Duration::from_millis(200)));
        let cache = coordinator(Arc::clone(&backend));

        let first = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get("abc123").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.in_flight(), 1);

        assert_eq!(cache.sweep(), 0);
        let second = cache.get("abc123").await.unwrap();
        let first = first.await.unwrap().unwrap();

        assert_eq!(backend.calls(), 1);
        assert_eq!(first, second);
        assert!(cache.contains("abc123"));
        assert_eq!(cache.in_flight(), 0);
    }

    #[tokio::test]
    async fn failed_render_is_not_cached() {
        let backend = Arc::new(FakeBackend::default());
        let cache = coordinator(Arc::clone(&backend));
        let other = cache.get("other").await.unwrap();

        backend.fail.store(true, Ordering::SeqCst);
        let err = cache.get("abc123").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RenderBackendError);
        assert_eq!(err.status, Some(500));
        assert!(!cache.contains("abc123"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("other").await.unwrap(), other);
        assert_eq!(backend.calls(), 2);

        backend.fail.store(false, Ordering::SeqCst);
        cache.get("abc123").await.unwrap();
        assert_eq!(backend.calls(), 3);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn waiters_share_the_owner_error() {
        let backend = Arc::new(FakeBackend::with_delay(Duration::from_millis(100)));
        backend.fail.store(true, Ordering::SeqCst);
        let cache = coordinator(Arc::clone(&backend));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.get("abc123").await }));
        }
        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert_eq!(err.code, ErrorCode::RenderBackendError);
        }

        assert_eq!(backend.calls(), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn unknown_track_never_reaches_backend() {
        let backend = Arc::new(FakeBackend::default());
        let cache = coordinator(Arc::clone(&backend));

        let err = cache.get("missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::MetadataUnavailable);
        assert_eq!(backend.calls(), 0);
        assert_eq!(cache.in_flight(), 0);
    }

    #[tokio::test]
    async fn slow_key_does_not_block_other_keys() {
        let backend = Arc::new(FakeBackend {
            stall: Some("slow"),
            ..FakeBackend::default()
        });
        let cache = coordinator(Arc::clone(&backend));

        let slow = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get("slow").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let fast = tokio::time::timeout(Duration::from_secs(1), cache.get("fast")).await;
        assert!(fast.expect("fast key was blocked").is_ok());
        assert!(!slow.is_finished());
        slow.abort();
    }

    #[tokio::test]
    async fn timeout_releases_pending_render() {
        let backend = Arc::new(FakeBackend {
            stall: Some("abc123"),
            ..FakeBackend::default()
        });
        let cache = RenderCoordinator::new(
            Arc::new(FakeResolver { artists: vec![] }),
            Arc::clone(&backend) as Arc<dyn RenderBackend>,
            PreviewTemplate::embedded("unknown"),
            Duration::from_millis(50),
        );

        let err = cache.get("abc123").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RenderBackendUnreachable);
        assert_eq!(cache.in_flight(), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn cancelled_owner_does_not_strand_waiters() {
        let backend = Arc::new(FakeBackend::with_delay(Duration::from_millis(100)));
        let cache = coordinator(Arc::clone(&backend));

        let owner = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get("abc123").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        owner.abort();

        let image = cache.get("abc123").await.unwrap();
        assert_eq!(image, Bytes::from("png:\"abc123\""));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn request_carries_joined_artists() {
        let backend = Arc::new(FakeBackend::default());
        let cache = coordinator_with(
            Arc::clone(&backend),
            vec![Artist::new("A"), Artist::new("B")],
        );
        cache.get("abc123").await.unwrap();

        let requests = backend.requests.lock();
        assert_eq!(
            requests[0].asset("artist_name"),
            Some(&Asset::literal("artist_name", "\"A, B\""))
        );
        assert_eq!(
            requests[0].asset("art"),
            Some(&Asset::image("art", "https://img/abc123"))
        );
    }

    #[tokio::test]
    async fn request_uses_fallback_without_artists() {
        let backend = Arc::new(FakeBackend::default());
        let cache = coordinator_with(Arc::clone(&backend), vec![]);
        cache.get("abc123").await.unwrap();

        let requests = backend.requests.lock();
        assert_eq!(
            requests[0].asset("artist_name"),
            Some(&Asset::literal("artist_name", "\"unknown\""))
        );
    }

    #[tokio::test]
    async fn sweeper_evicts_on_schedule() {
        let backend = Arc::new(FakeBackend::default());
        let cache = coordinator(Arc::clone(&backend));

        cache.get("abc123").await.unwrap();
        let sweeper = cache.spawn_sweeper(Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.is_empty());
        sweeper.abort();
    }
}
