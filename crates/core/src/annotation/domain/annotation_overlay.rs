use crate::annotation::domain::box_scaler::{scale_box, ScalingMode};
use crate::annotation::domain::overlay_surface::{OverlaySurface, StrokeStyle};
use crate::detection::domain::face_detection::DetectionResult;
use crate::shared::geometry::Size;

/// What happened to a detection result handed to [`AnnotationOverlay::apply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Surface redrawn with this many rectangles.
    Drawn(usize),
    /// Older than an applied result, or issued for a superseded source.
    Stale,
    /// No displayed size known yet; nothing touched.
    NoSurface,
}

/// Keeps the overlay surface in sync with the newest detection result.
///
/// Every request gets a generation number from a single monotonically
/// increasing counter. A result is drawn only if its generation is newer than
/// every result applied so far and not older than the start of the current
/// source, so out-of-order completions can never overwrite fresher boxes.
pub struct AnnotationOverlay<S: OverlaySurface> {
    surface: S,
    scaling: ScalingMode,
    style: StrokeStyle,
    display_size: Option<Size>,
    native_size: Option<Size>,
    face_detected: bool,
    next_generation: u64,
    source_floor: u64,
    last_applied: Option<u64>,
    deferred: bool,
}

impl<S: OverlaySurface> AnnotationOverlay<S> {
    pub fn new(surface: S, scaling: ScalingMode) -> Self {
        Self {
            surface,
            scaling,
            style: StrokeStyle::default(),
            display_size: None,
            native_size: None,
            face_detected: false,
            next_generation: 0,
            source_floor: 0,
            last_applied: None,
            deferred: false,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn face_detected(&self) -> bool {
        self.face_detected
    }

    pub fn display_size(&self) -> Option<Size> {
        self.display_size
    }

    /// Takes effect on the next applied result.
    pub fn set_scaling_mode(&mut self, mode: ScalingMode) {
        if mode == ScalingMode::Unscaled {
            log::warn!(
                "Unscaled overlay selected: boxes misalign unless the video is shown at native size"
            );
        }
        self.scaling = mode;
    }

    /// Records the on-screen size of the video. An empty size means the
    /// layout has not produced one yet.
    pub fn set_display_size(&mut self, size: Size) {
        self.display_size = (!size.is_empty()).then_some(size);
    }

    /// Starts a new source whose frames decode at `native`.
    ///
    /// Outstanding requests from the previous source become stale and the
    /// surface is wiped. The displayed size is forgotten too, since it was
    /// fitted to the previous source's shape.
    pub fn begin_source(&mut self, native: Size) {
        self.source_floor = self.next_generation;
        self.native_size = (!native.is_empty()).then_some(native);
        self.display_size = None;
        self.reset_surface();
    }

    /// Forgets the current source; requests are refused until the next one.
    pub fn end_source(&mut self) {
        self.source_floor = self.next_generation;
        self.native_size = None;
        self.display_size = None;
        self.reset_surface();
    }

    /// Issues a generation for a detection request, or `None` when no source
    /// frame or surface size is known yet.
    ///
    /// A request refused only for want of a displayed size is remembered and
    /// handed out by [`Self::resume_deferred`] once the size arrives.
    pub fn request_detection(&mut self) -> Option<u64> {
        if self.native_size.is_none() {
            return None;
        }
        if self.display_size.is_none() {
            self.deferred = true;
            return None;
        }
        Some(self.issue())
    }

    /// Issues the generation for a request deferred by
    /// [`Self::request_detection`], if one is waiting and the displayed size
    /// is now known. At most one deferred request is outstanding.
    pub fn resume_deferred(&mut self) -> Option<u64> {
        if !self.deferred || self.display_size.is_none() || self.native_size.is_none() {
            return None;
        }
        Some(self.issue())
    }

    fn issue(&mut self) -> u64 {
        self.deferred = false;
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }

    /// Redraws the surface from `result` unless it is stale.
    pub fn apply(&mut self, result: &DetectionResult) -> ApplyOutcome {
        if result.generation < self.source_floor
            || self.last_applied.is_some_and(|last| result.generation <= last)
        {
            log::debug!("Dropping stale detection result {}", result.generation);
            return ApplyOutcome::Stale;
        }
        let Some(display) = self.display_size else {
            return ApplyOutcome::NoSurface;
        };

        self.last_applied = Some(result.generation);
        self.surface.resize(display);
        self.surface.clear();
        self.face_detected = !result.detections.is_empty();

        let surface_size = self.surface.size();
        for det in &result.detections {
            let rect = scale_box(&det.bbox, result.native_size, surface_size, self.scaling);
            self.surface.stroke_rect(&rect, &self.style);
        }
        self.surface.render();

        ApplyOutcome::Drawn(result.detections.len())
    }

    /// Moves onto another surface, keeping the current source and the
    /// generation history. The new surface starts blank.
    pub fn with_surface<T: OverlaySurface>(self, surface: T) -> AnnotationOverlay<T> {
        let mut overlay = AnnotationOverlay {
            surface,
            scaling: self.scaling,
            style: self.style,
            display_size: self.display_size,
            native_size: self.native_size,
            face_detected: false,
            next_generation: self.next_generation,
            source_floor: self.source_floor,
            last_applied: self.last_applied,
            deferred: self.deferred,
        };
        overlay.surface.clear();
        overlay.surface.render();
        overlay
    }

    fn reset_surface(&mut self) {
        self.last_applied = None;
        self.deferred = false;
        self.face_detected = false;
        self.surface.clear();
        self.surface.render();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_detection::FaceDetection;
    use crate::shared::geometry::BoundingBox;

    /// Records what would have been drawn.
    #[derive(Default)]
    struct FakeSurface {
        size: Option<Size>,
        pending: Vec<BoundingBox>,
        visible: Vec<BoundingBox>,
        resizes: usize,
        clears: usize,
    }

    impl OverlaySurface for FakeSurface {
        fn resize(&mut self, size: Size) {
            self.size = Some(size);
            self.resizes += 1;
        }

        fn size(&self) -> Size {
            self.size.unwrap_or(Size::new(0.0, 0.0))
        }

        fn clear(&mut self) {
            self.pending.clear();
            self.visible.clear();
            self.clears += 1;
        }

        fn stroke_rect(&mut self, rect: &BoundingBox, _style: &StrokeStyle) {
            self.pending.push(*rect);
        }

        fn render(&mut self) {
            self.visible = self.pending.clone();
        }

        fn rect_count(&self) -> usize {
            self.visible.len()
        }
    }

    const NATIVE: Size = Size {
        width: 1280.0,
        height: 720.0,
    };
    const DISPLAY: Size = Size {
        width: 640.0,
        height: 360.0,
    };

    fn ready_overlay() -> AnnotationOverlay<FakeSurface> {
        let mut overlay = AnnotationOverlay::new(FakeSurface::default(), ScalingMode::Proportional);
        overlay.begin_source(NATIVE);
        overlay.set_display_size(DISPLAY);
        overlay
    }

    fn result(generation: u64, boxes: usize) -> DetectionResult {
        DetectionResult {
            generation,
            native_size: NATIVE,
            detections: (0..boxes)
                .map(|i| {
                    let bbox = BoundingBox::new(100.0 * i as f64, 0.0, 80.0, 80.0);
                    FaceDetection::new(bbox, 0.9)
                })
                .collect(),
        }
    }

    // ── guards ──

    #[test]
    fn test_no_request_without_display_size() {
        let mut overlay = AnnotationOverlay::new(FakeSurface::default(), ScalingMode::Proportional);
        overlay.begin_source(NATIVE);
        assert_eq!(overlay.request_detection(), None);
        assert_eq!(overlay.surface().resizes, 0);
    }

    #[test]
    fn test_no_request_without_source() {
        let mut overlay = AnnotationOverlay::new(FakeSurface::default(), ScalingMode::Proportional);
        overlay.set_display_size(DISPLAY);
        assert_eq!(overlay.request_detection(), None);
    }

    #[test]
    fn test_empty_display_size_counts_as_unknown() {
        let mut overlay = ready_overlay();
        overlay.set_display_size(Size::new(0.0, 0.0));
        assert_eq!(overlay.request_detection(), None);
    }

    #[test]
    fn test_apply_without_display_size_is_noop() {
        let mut overlay = ready_overlay();
        let generation = overlay.request_detection().unwrap();
        overlay.set_display_size(Size::new(0.0, 0.0));
        assert_eq!(overlay.apply(&result(generation, 1)), ApplyOutcome::NoSurface);
        assert_eq!(overlay.surface().rect_count(), 0);
    }

    // ── drawing ──

    #[test]
    fn test_k_boxes_draw_k_rects() {
        let mut overlay = ready_overlay();
        let generation = overlay.request_detection().unwrap();
        assert_eq!(overlay.apply(&result(generation, 3)), ApplyOutcome::Drawn(3));
        assert_eq!(overlay.surface().rect_count(), 3);
        assert!(overlay.face_detected());
    }

    #[test]
    fn test_new_result_replaces_old_rects() {
        let mut overlay = ready_overlay();
        let g0 = overlay.request_detection().unwrap();
        overlay.apply(&result(g0, 4));
        let g1 = overlay.request_detection().unwrap();
        overlay.apply(&result(g1, 2));
        assert_eq!(overlay.surface().rect_count(), 2);
        // once for the source, once per applied result
        assert_eq!(overlay.surface().clears, 3);
    }

    #[test]
    fn test_empty_result_clears_and_lowers_flag() {
        let mut overlay = ready_overlay();
        let g0 = overlay.request_detection().unwrap();
        overlay.apply(&result(g0, 2));
        let g1 = overlay.request_detection().unwrap();

        assert_eq!(overlay.apply(&result(g1, 0)), ApplyOutcome::Drawn(0));
        assert_eq!(overlay.surface().rect_count(), 0);
        assert!(!overlay.face_detected());
    }

    #[test]
    fn test_surface_resized_on_every_apply() {
        let mut overlay = ready_overlay();
        let g0 = overlay.request_detection().unwrap();
        overlay.apply(&result(g0, 1));
        overlay.set_display_size(Size::new(320.0, 180.0));
        let g1 = overlay.request_detection().unwrap();
        overlay.apply(&result(g1, 1));

        assert_eq!(overlay.surface().resizes, 2);
        assert_eq!(overlay.surface().size(), Size::new(320.0, 180.0));
    }

    #[test]
    fn test_rects_scaled_to_display() {
        let mut overlay = ready_overlay();
        let generation = overlay.request_detection().unwrap();
        overlay.apply(&result(generation, 2));
        assert_eq!(
            overlay.surface().visible,
            vec![
                BoundingBox::new(0.0, 0.0, 40.0, 40.0),
                BoundingBox::new(50.0, 0.0, 40.0, 40.0),
            ]
        );
    }

    #[test]
    fn test_unscaled_mode_draws_native_coordinates() {
        let mut overlay = ready_overlay();
        overlay.set_scaling_mode(ScalingMode::Unscaled);
        let generation = overlay.request_detection().unwrap();
        overlay.apply(&result(generation, 1));
        assert_eq!(
            overlay.surface().visible,
            vec![BoundingBox::new(0.0, 0.0, 80.0, 80.0)]
        );
    }

    // ── generations ──

    #[test]
    fn test_generations_increase() {
        let mut overlay = ready_overlay();
        let a = overlay.request_detection().unwrap();
        let b = overlay.request_detection().unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_out_of_order_result_is_stale() {
        let mut overlay = ready_overlay();
        let old = overlay.request_detection().unwrap();
        let new = overlay.request_detection().unwrap();

        assert_eq!(overlay.apply(&result(new, 1)), ApplyOutcome::Drawn(1));
        assert_eq!(overlay.apply(&result(old, 5)), ApplyOutcome::Stale);
        assert_eq!(overlay.surface().rect_count(), 1);
    }

    #[test]
    fn test_duplicate_result_is_stale() {
        let mut overlay = ready_overlay();
        let generation = overlay.request_detection().unwrap();
        overlay.apply(&result(generation, 1));
        assert_eq!(overlay.apply(&result(generation, 1)), ApplyOutcome::Stale);
    }

    #[test]
    fn test_skipped_generation_still_applies_newer() {
        let mut overlay = ready_overlay();
        let _dropped = overlay.request_detection().unwrap();
        let newest = overlay.request_detection().unwrap();
        assert_eq!(overlay.apply(&result(newest, 1)), ApplyOutcome::Drawn(1));
    }

    #[test]
    fn test_result_from_superseded_source_is_stale() {
        let mut overlay = ready_overlay();
        let old_source = overlay.request_detection().unwrap();

        overlay.begin_source(Size::new(640.0, 480.0));
        assert_eq!(overlay.apply(&result(old_source, 2)), ApplyOutcome::Stale);
        assert_eq!(overlay.surface().rect_count(), 0);
    }

    #[test]
    fn test_begin_source_clears_previous_drawing() {
        let mut overlay = ready_overlay();
        let generation = overlay.request_detection().unwrap();
        overlay.apply(&result(generation, 2));

        overlay.begin_source(NATIVE);
        assert_eq!(overlay.surface().rect_count(), 0);
        assert!(!overlay.face_detected());

        overlay.set_display_size(DISPLAY);
        let next = overlay.request_detection().unwrap();
        assert_eq!(overlay.apply(&result(next, 1)), ApplyOutcome::Drawn(1));
    }

    #[test]
    fn test_end_source_refuses_requests() {
        let mut overlay = ready_overlay();
        let pending = overlay.request_detection().unwrap();
        overlay.end_source();

        assert_eq!(overlay.request_detection(), None);
        assert_eq!(overlay.apply(&result(pending, 1)), ApplyOutcome::Stale);
    }

    // ── deferred requests ──

    #[test]
    fn test_request_before_size_is_issued_once_size_arrives() {
        let mut overlay = AnnotationOverlay::new(FakeSurface::default(), ScalingMode::Proportional);
        overlay.begin_source(NATIVE);
        assert_eq!(overlay.request_detection(), None);
        assert_eq!(overlay.resume_deferred(), None);

        overlay.set_display_size(DISPLAY);
        let generation = overlay.resume_deferred().unwrap();
        assert_eq!(overlay.resume_deferred(), None);
        assert_eq!(overlay.apply(&result(generation, 1)), ApplyOutcome::Drawn(1));
    }

    #[test]
    fn test_repeated_refusals_defer_a_single_request() {
        let mut overlay = AnnotationOverlay::new(FakeSurface::default(), ScalingMode::Proportional);
        overlay.begin_source(NATIVE);
        overlay.request_detection();
        overlay.request_detection();

        overlay.set_display_size(DISPLAY);
        assert!(overlay.resume_deferred().is_some());
        assert_eq!(overlay.resume_deferred(), None);
    }

    #[test]
    fn test_no_deferral_without_source() {
        let mut overlay = AnnotationOverlay::new(FakeSurface::default(), ScalingMode::Proportional);
        overlay.request_detection();
        overlay.set_display_size(DISPLAY);
        assert_eq!(overlay.resume_deferred(), None);
    }

    #[test]
    fn test_new_source_drops_deferred_request_and_size() {
        let mut overlay = AnnotationOverlay::new(FakeSurface::default(), ScalingMode::Proportional);
        overlay.begin_source(NATIVE);
        overlay.request_detection();

        overlay.begin_source(Size::new(720.0, 1280.0));
        overlay.set_display_size(Size::new(202.5, 360.0));
        assert_eq!(overlay.resume_deferred(), None);
    }

    #[test]
    fn test_begin_source_forgets_fitted_size() {
        let mut overlay = ready_overlay();
        overlay.begin_source(Size::new(720.0, 1280.0));
        assert_eq!(overlay.display_size(), None);
        assert_eq!(overlay.request_detection(), None);
    }

    // ── surface swap ──

    #[test]
    fn test_with_surface_keeps_generation_history() {
        let mut overlay = ready_overlay();
        let old = overlay.request_detection().unwrap();
        let applied = overlay.request_detection().unwrap();
        overlay.apply(&result(applied, 2));

        let mut swapped = overlay.with_surface(FakeSurface::default());
        assert_eq!(swapped.surface().rect_count(), 0);
        assert!(!swapped.face_detected());
        assert_eq!(swapped.apply(&result(old, 1)), ApplyOutcome::Stale);

        let next = swapped.request_detection().unwrap();
        assert!(next > applied);
        assert_eq!(swapped.apply(&result(next, 1)), ApplyOutcome::Drawn(1));
    }
}
