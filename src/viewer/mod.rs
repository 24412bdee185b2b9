pub mod canvas;
pub mod loader;
pub mod scheduler;

use std::{collections::VecDeque, sync::Arc, time::Instant};

use crate::{
    animation::{LoadingAnimator, SnapAnimator},
    config::{Fit, Theme, ViewerPolicy, ViewportState},
    error::ViewerError,
    gesture::{DragSession, FlickPolicy, GestureController, SlideDirection},
    image_utils::{FileDecoder, ImageDecoder, ImageSource, SlideImage},
    layout::offset_for_index,
};

use self::{
    canvas::{paint, sync_backing, FrameInput, Surface},
    loader::ImageLoader,
    scheduler::{FrameRequester, RenderScheduler, RepaintReason},
};

/// Notifications for the host, drained with [`SlidingImageViewer::poll_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    /// Emitted once per change, at release time rather than after the settle.
    ActiveIndexChanged(usize),
    LoadingChanged(bool),
    Error(ViewerError),
}

/// Horizontal image carousel painted onto an owned [`Surface`].
///
/// All state lives here and is mutated from one thread: the host forwards
/// pointer input, property changes and display-refresh callbacks, and the
/// viewer decides when to paint.
pub struct SlidingImageViewer<S, R> {
    viewport: ViewportState,
    device_pixel_ratio: f32,
    surface: Option<S>,
    scheduler: RenderScheduler<R>,
    loader: ImageLoader,
    gesture: GestureController,
    snap: SnapAnimator,
    pulse: LoadingAnimator,
    offset: f32,
    active_index: usize,
    loading: bool,
    events: VecDeque<ViewerEvent>,
    /// Set once a frame ran without a surface, so the error is queued once.
    missing_surface_reported: bool,
}

impl<S: Surface, R: FrameRequester> SlidingImageViewer<S, R> {
    pub fn new(viewport: ViewportState, policy: ViewerPolicy, requester: R) -> Self {
        let decoder = Arc::new(FileDecoder::new(policy.max_decode_size));
        Self::with_decoder(viewport, policy, requester, decoder)
    }

    pub fn with_decoder(
        viewport: ViewportState,
        policy: ViewerPolicy,
        requester: R,
        decoder: Arc<dyn ImageDecoder>,
    ) -> Self {
        let flick = FlickPolicy {
            distance_fraction: policy.flick_distance_fraction,
            velocity: policy.flick_velocity,
        };
        Self {
            viewport,
            device_pixel_ratio: 1.0,
            surface: None,
            scheduler: RenderScheduler::new(requester),
            loader: ImageLoader::new(decoder, policy.decode_timeout, policy.min_loading),
            gesture: GestureController::new(flick),
            snap: SnapAnimator::new(policy.snap_duration),
            pulse: LoadingAnimator::new(policy.pulse_period, Instant::now()),
            offset: 0.0,
            active_index: 0,
            loading: false,
            events: VecDeque::new(),
            missing_surface_reported: false,
        }
    }

    /// Takes exclusive ownership of the drawing surface. Failing to obtain
    /// one is fatal for this viewer.
    pub fn attach_surface<F>(&mut self, acquire: F) -> Result<(), ViewerError>
    where
        F: FnOnce() -> Option<S>,
    {
        let Some(surface) = acquire() else {
            tracing::error!("{}", ViewerError::MissingContext);
            return Err(ViewerError::MissingContext);
        };
        self.surface = Some(surface);
        self.missing_surface_reported = false;
        self.scheduler.request(RepaintReason::SurfaceAttached);
        Ok(())
    }

    pub fn detach_surface(&mut self) -> Option<S> {
        self.surface.take()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    /// Replaces the image list. The same URLs in the same order are a no-op.
    pub fn set_images(&mut self, images: Vec<ImageSource>) {
        if !self.loader.load(images) {
            return;
        }
        self.gesture.cancel();
        self.snap.stop();
        self.offset = 0.0;
        self.set_active(0);
        self.set_loading(true);
        self.scheduler.request(RepaintReason::ImagesChanged);
    }

    /// Changes the viewport size in logical pixels. The active slide is
    /// re-pinned immediately; any drag or settle in flight is dropped.
    pub fn set_size(&mut self, width: f32, height: f32) {
        let (width, height) = (width.max(0.0), height.max(0.0));
        if width == self.viewport.width && height == self.viewport.height {
            return;
        }
        self.viewport.width = width;
        self.viewport.height = height;
        self.gesture.cancel();
        self.snap.stop();
        self.offset = offset_for_index(self.active_index, width);
        self.scheduler.request(RepaintReason::Viewport);
    }

    pub fn set_theme(&mut self, theme: Theme) {
        if self.viewport.theme != theme {
            self.viewport.theme = theme;
            self.scheduler.request(RepaintReason::Viewport);
        }
    }

    pub fn set_fit(&mut self, fit: Fit) {
        if self.viewport.fit != fit {
            self.viewport.fit = fit;
            self.scheduler.request(RepaintReason::Viewport);
        }
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f32) {
        if ratio > 0.0 && ratio != self.device_pixel_ratio {
            self.device_pixel_ratio = ratio;
            self.scheduler.request(RepaintReason::Viewport);
        }
    }

    fn slide_count(&self) -> usize {
        self.loader.images().len()
    }

    pub fn pointer_down(&mut self, x: f32, now: Instant) {
        if self.loading || self.slide_count() == 0 {
            return;
        }
        if let Some(offset) = self.snap.cancel(now) {
            self.offset = offset;
        }
        self.gesture
            .pointer_down(x, now, self.offset, self.active_index);
        self.scheduler.request(RepaintReason::Offset);
    }

    pub fn pointer_move(&mut self, x: f32) {
        if let Some(offset) = self.gesture.pointer_move(x, self.viewport.width) {
            self.offset = offset;
            self.scheduler.request(RepaintReason::Offset);
        }
    }

    pub fn pointer_up(&mut self, x: f32, now: Instant) {
        self.pointer_move(x);
        let count = self.slide_count();
        if let Some(release) = self.gesture.pointer_up(x, now, self.viewport.width, count) {
            tracing::debug!(?release, "drag released");
            self.slide_to(release.target_index, now);
        }
    }

    /// Moves to slide `index`, clamped to the current list. The index change
    /// is reported right away; the offset follows with an eased settle.
    pub fn slide_to(&mut self, index: usize, now: Instant) {
        let count = self.loader.sources().len();
        if count == 0 {
            return;
        }
        let index = index.min(count - 1);
        self.gesture.cancel();
        self.set_active(index);

        let target = offset_for_index(index, self.viewport.width);
        if self.snap.target() == Some(target) {
            return;
        }
        // Retargeting continues from where the strip is now, not from the
        // last painted frame
        if let Some(offset) = self.snap.cancel(now) {
            self.offset = offset;
            self.scheduler.request(RepaintReason::Offset);
        }
        if self.offset == target {
            return;
        }
        self.snap.start(self.offset, target, now);
        self.scheduler.request(RepaintReason::Animation);
    }

    /// Display-refresh callback. Paints if a repaint is pending and returns
    /// whether it did. Never fails: problems end up in the event queue.
    pub fn frame(&mut self, now: Instant) -> bool {
        let update = self.loader.update(now);
        for failure in update.failures {
            self.events.push_back(ViewerEvent::Error(failure));
        }
        if update.published {
            self.set_loading(false);
            self.scheduler.request(RepaintReason::LoadingChanged);
        }

        if !self.scheduler.begin_frame() {
            return false;
        }
        if let Some(offset) = self.snap.sample(now) {
            self.offset = offset;
        }

        let painted = match self.surface.as_mut() {
            Some(surface) => {
                sync_backing(surface, &self.viewport, self.device_pixel_ratio);
                let input = FrameInput {
                    viewport: self.viewport,
                    device_pixel_ratio: self.device_pixel_ratio,
                    offset: self.offset,
                    loading: self.loading,
                    images: self.loader.images(),
                    pulse: &self.pulse,
                    now,
                };
                paint(surface, &input);
                true
            }
            None => {
                if !self.missing_surface_reported {
                    tracing::warn!("frame requested without a surface, nothing painted");
                    self.missing_surface_reported = true;
                    self.events
                        .push_back(ViewerEvent::Error(ViewerError::MissingContext));
                }
                false
            }
        };
        tracing::trace!(offset = self.offset, painted, "frame");
        let animating = self.is_animating();
        self.scheduler.end_frame(animating);
        painted
    }

    fn set_active(&mut self, index: usize) {
        if self.active_index != index {
            self.active_index = index;
            self.events.push_back(ViewerEvent::ActiveIndexChanged(index));
        }
    }

    fn set_loading(&mut self, loading: bool) {
        if self.loading != loading {
            self.loading = loading;
            self.events.push_back(ViewerEvent::LoadingChanged(loading));
        }
    }

    pub fn poll_events(&mut self) -> Vec<ViewerEvent> {
        self.events.drain(..).collect()
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// Strip offset in logical pixels; `-index * width` when settled.
    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_dragging()
    }

    /// True while something still needs frames: loading or settling.
    pub fn is_animating(&self) -> bool {
        self.loading || self.snap.is_active()
    }

    pub fn drag_session(&self) -> Option<&DragSession> {
        self.gesture.session()
    }

    /// Direction latched by the current drag, for directional hints.
    pub fn drag_hint(&self) -> Option<SlideDirection> {
        self.gesture.locked_direction()
    }

    pub fn images(&self) -> &[SlideImage] {
        self.loader.images()
    }

    pub fn sources(&self) -> &[ImageSource] {
        self.loader.sources()
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    pub fn scheduler(&self) -> &RenderScheduler<R> {
        &self.scheduler
    }
}
