use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};

use facemark_core::detection::domain::face_detection::DetectionResult;
use facemark_core::detection::domain::face_detector::{DetectionOptions, FaceDetector};
use facemark_core::detection::infrastructure::model_set::{ModelKind, ModelSet};
use facemark_core::shared::frame::Frame;

use super::model_cache::ModelCache;

pub enum DetectionMessage {
    DownloadProgress(u64, u64),
    /// Models loaded; requests are being served.
    Ready,
    Result(DetectionResult),
    /// A single request failed; the worker keeps going.
    Error(String),
    /// Models could not be loaded; the worker has exited.
    Failed(String),
}

pub struct DetectionRequest {
    pub generation: u64,
    pub frame: Arc<Frame>,
    pub options: DetectionOptions,
}

pub struct DetectionParams {
    pub confidence: f64,
    /// Also load the descriptor model so descriptor requests can be served.
    pub with_descriptors: bool,
    pub model_cache: Arc<ModelCache>,
}

/// Owning end of a detection worker. Dropping it stops the thread.
pub struct DetectionHandle {
    requests: Sender<DetectionRequest>,
    cancelled: Arc<AtomicBool>,
}

impl DetectionHandle {
    /// Queues a request. Requests that pile up while the worker is busy or
    /// still loading models are coalesced to the newest.
    pub fn request(&self, request: DetectionRequest) {
        if self.requests.send(request).is_err() {
            log::debug!("Detection worker has exited; request dropped");
        }
    }
}

impl Drop for DetectionHandle {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

pub fn spawn(params: DetectionParams) -> (DetectionHandle, Receiver<DetectionMessage>) {
    let (tx, rx) = crossbeam_channel::unbounded::<DetectionMessage>();
    let (req_tx, req_rx) = crossbeam_channel::unbounded::<DetectionRequest>();
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancelled_clone = cancelled.clone();

    thread::spawn(move || {
        let mut detector = match load_detector(&tx, &cancelled_clone, &params) {
            Ok(detector) => detector,
            Err(e) => {
                if !cancelled_clone.load(Ordering::Relaxed) {
                    log::warn!("Face detection disabled: {e}");
                    let _ = tx.send(DetectionMessage::Failed(e.to_string()));
                }
                return;
            }
        };
        let _ = tx.send(DetectionMessage::Ready);
        serve(detector.as_mut(), &req_rx, &tx, &cancelled_clone);
        log::info!("Detection worker stopped");
    });

    (
        DetectionHandle {
            requests: req_tx,
            cancelled,
        },
        rx,
    )
}

fn load_detector(
    tx: &Sender<DetectionMessage>,
    cancelled: &AtomicBool,
    params: &DetectionParams,
) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    let tx_progress = tx.clone();
    let on_progress = move |dl: u64, total: u64| {
        let _ = tx_progress.send(DetectionMessage::DownloadProgress(dl, total));
    };

    let detector = params
        .model_cache
        .wait(ModelKind::FaceDetector, &on_progress, cancelled)
        .map_err(|e| -> Box<dyn std::error::Error> { e.into() })?;

    let descriptor = if params.with_descriptors {
        match params
            .model_cache
            .wait(ModelKind::FaceDescriptor, &on_progress, cancelled)
        {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("Descriptor model unavailable, descriptors disabled: {e}");
                None
            }
        }
    } else {
        None
    };

    if cancelled.load(Ordering::Relaxed) {
        return Err("Cancelled".into());
    }

    let set = ModelSet {
        detector,
        descriptor,
    };
    let detector = set.build_detector(params.confidence)?;
    log::info!("Face detector ready (confidence {:.2})", params.confidence);
    Ok(detector)
}

/// Answers requests until the handle is dropped. Only the newest pending
/// request is processed; older ones are skipped.
fn serve(
    detector: &mut dyn FaceDetector,
    requests: &Receiver<DetectionRequest>,
    tx: &Sender<DetectionMessage>,
    cancelled: &AtomicBool,
) {
    while let Ok(first) = requests.recv() {
        if cancelled.load(Ordering::Relaxed) {
            return;
        }
        let request = newest(first, requests);
        let message = match detector.detect(&request.frame, request.options) {
            Ok(detections) => DetectionMessage::Result(DetectionResult {
                generation: request.generation,
                native_size: request.frame.size(),
                detections,
            }),
            Err(e) => {
                log::warn!("Detection failed for request {}: {e}", request.generation);
                DetectionMessage::Error(e.to_string())
            }
        };
        if tx.send(message).is_err() {
            return;
        }
    }
}

/// Drains everything queued behind `first` and keeps the last one.
fn newest<T>(first: T, rx: &Receiver<T>) -> T {
    let mut latest = first;
    let mut skipped = 0;
    while let Ok(next) = rx.try_recv() {
        latest = next;
        skipped += 1;
    }
    if skipped > 0 {
        log::debug!("Coalesced {skipped} pending detection requests");
    }
    latest
}
