use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use facemark_core::detection::infrastructure::model_set::{self, ModelKind, ModelLoadState};

/// Shared model cache. The face detector is resolved in the background at
/// startup; the descriptor model only once something waits for it. Workers
/// grab resolved paths or wait for in-progress resolution.
pub struct ModelCache {
    weights_dir: PathBuf,
    detector: Arc<ModelSlot>,
    descriptor: Arc<ModelSlot>,
}

struct ModelSlot {
    started: AtomicBool,
    result: Mutex<Option<Result<PathBuf, String>>>,
    ready: Condvar,
    progress: Arc<Mutex<(u64, u64)>>,
}

impl ModelCache {
    /// Create a new `ModelCache` and begin resolving the face detector in the
    /// background, checking `weights_dir` before the user cache.
    pub fn new(weights_dir: PathBuf) -> Arc<Self> {
        let cache = Arc::new(Self::idle(weights_dir));
        cache.start(ModelKind::FaceDetector);
        cache
    }

    fn idle(weights_dir: PathBuf) -> Self {
        Self {
            weights_dir,
            detector: Arc::new(ModelSlot::new()),
            descriptor: Arc::new(ModelSlot::new()),
        }
    }

    /// Begin resolving `kind` on a background thread unless already started.
    pub fn start(&self, kind: ModelKind) {
        let slot = self.slot(kind);
        if slot.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let slot = slot.clone();
        let weights_dir = self.weights_dir.clone();
        thread::spawn(move || slot.resolve(kind, &weights_dir));
    }

    /// Wait for the path of `kind`, starting its resolution if needed. Calls
    /// `on_progress(downloaded, total)` while a download is in progress.
    /// Returns early if `cancelled` is set.
    pub fn wait(
        &self,
        kind: ModelKind,
        on_progress: &dyn Fn(u64, u64),
        cancelled: &AtomicBool,
    ) -> Result<PathBuf, String> {
        self.start(kind);
        self.slot(kind).wait(on_progress, cancelled)
    }

    /// Non-blocking snapshot of where `kind` is in resolution, or `None` if
    /// nothing has asked for it yet.
    pub fn state(&self, kind: ModelKind) -> Option<ModelLoadState> {
        let slot = self.slot(kind);
        if !slot.started.load(Ordering::SeqCst) {
            return None;
        }
        Some(match &*lock(&slot.result) {
            None => ModelLoadState::Loading,
            Some(Ok(_)) => ModelLoadState::Ready,
            Some(Err(e)) => ModelLoadState::Failed(e.clone()),
        })
    }

    fn slot(&self, kind: ModelKind) -> &Arc<ModelSlot> {
        match kind {
            ModelKind::FaceDetector => &self.detector,
            ModelKind::FaceDescriptor => &self.descriptor,
        }
    }
}

impl ModelSlot {
    fn new() -> Self {
        Self {
            started: AtomicBool::new(false),
            result: Mutex::new(None),
            ready: Condvar::new(),
            progress: Arc::new(Mutex::new((0, 0))),
        }
    }

    fn resolve(&self, kind: ModelKind, weights_dir: &Path) {
        let progress_mutex = self.progress.clone();
        let result = model_set::resolve(
            kind,
            Some(weights_dir),
            Some(Box::new(move |downloaded, total| {
                *lock(&progress_mutex) = (downloaded, total);
            })),
        );
        match &result {
            Ok(path) => log::info!("Resolved {} model at {}", kind.label(), path.display()),
            Err(e) => log::warn!("Could not resolve {} model: {e}", kind.label()),
        }
        *lock(&self.result) = Some(result.map_err(|e| e.to_string()));
        self.ready.notify_all();
    }

    fn wait(
        &self,
        on_progress: &dyn Fn(u64, u64),
        cancelled: &AtomicBool,
    ) -> Result<PathBuf, String> {
        let mut guard = lock(&self.result);
        loop {
            if cancelled.load(Ordering::Relaxed) {
                return Err("Cancelled".into());
            }
            if let Some(ref result) = *guard {
                return result.clone();
            }
            // Forward download progress while waiting
            if let Ok(progress) = self.progress.try_lock() {
                let (dl, total) = *progress;
                if total > 0 {
                    on_progress(dl, total);
                }
            }
            let (new_guard, _) = self
                .ready
                .wait_timeout(guard, Duration::from_millis(100))
                .unwrap_or_else(PoisonError::into_inner);
            guard = new_guard;
        }
    }
}

/// A panicking resolver thread leaves the data intact, so poisoning is
/// ignored.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn weights_with_all_models() -> TempDir {
        let tmp = TempDir::new().unwrap();
        for kind in ModelKind::ALL {
            fs::write(tmp.path().join(kind.file_name()), b"weights").unwrap();
        }
        tmp
    }

    #[test]
    fn test_wait_returns_bundled_paths() {
        let tmp = weights_with_all_models();
        let cache = ModelCache::new(tmp.path().to_path_buf());
        let cancelled = AtomicBool::new(false);

        for kind in ModelKind::ALL {
            let path = cache.wait(kind, &|_, _| {}, &cancelled).unwrap();
            assert_eq!(path, tmp.path().join(kind.file_name()));
            assert_eq!(cache.state(kind), Some(ModelLoadState::Ready));
        }
    }

    #[test]
    fn test_cancelled_wait_returns_immediately() {
        let slot = ModelSlot::new();
        let cancelled = AtomicBool::new(true);
        assert_eq!(slot.wait(&|_, _| {}, &cancelled), Err("Cancelled".into()));
    }

    #[test]
    fn test_descriptor_not_resolved_at_startup() {
        let tmp = weights_with_all_models();
        let cache = ModelCache::new(tmp.path().to_path_buf());

        assert!(cache.state(ModelKind::FaceDetector).is_some());
        assert_eq!(cache.state(ModelKind::FaceDescriptor), None);
    }

    #[test]
    fn test_wait_starts_descriptor_resolution() {
        let tmp = weights_with_all_models();
        let cache = ModelCache::new(tmp.path().to_path_buf());
        let cancelled = AtomicBool::new(false);

        let path = cache
            .wait(ModelKind::FaceDescriptor, &|_, _| {}, &cancelled)
            .unwrap();
        assert_eq!(path, tmp.path().join(ModelKind::FaceDescriptor.file_name()));
        assert_eq!(cache.state(ModelKind::FaceDescriptor), Some(ModelLoadState::Ready));
    }

    #[test]
    fn test_started_but_unresolved_slot_reports_loading() {
        let cache = ModelCache::idle(PathBuf::from("/nonexistent"));
        cache.descriptor.started.store(true, Ordering::SeqCst);
        assert_eq!(cache.state(ModelKind::FaceDescriptor), Some(ModelLoadState::Loading));
    }

    #[test]
    fn test_failed_slot_reports_reason() {
        let cache = ModelCache::idle(PathBuf::from("/nonexistent"));
        cache.detector.started.store(true, Ordering::SeqCst);
        *lock(&cache.detector.result) = Some(Err("offline".into()));
        assert_eq!(
            cache.state(ModelKind::FaceDetector),
            Some(ModelLoadState::Failed("offline".into()))
        );
    }
}
