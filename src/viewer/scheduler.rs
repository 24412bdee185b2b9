/// Host hook for "call me back on the next display refresh".
pub trait FrameRequester {
    fn request_frame(&self);
}

/// Why a repaint was requested. Only used for tracing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepaintReason {
    SurfaceAttached,
    ImagesChanged,
    LoadingChanged,
    Viewport,
    Offset,
    Animation,
}

/// Coalesces repaint requests into at most one pending frame.
///
/// Any number of [`RenderScheduler::request`] calls between two frames
/// result in a single call to the host's [`FrameRequester`].
pub struct RenderScheduler<R> {
    requester: R,
    pending: bool,
    frames: u64,
}

impl<R: FrameRequester> RenderScheduler<R> {
    pub fn new(requester: R) -> Self {
        Self {
            requester,
            pending: false,
            frames: 0,
        }
    }

    /// Returns true when this call asked the host for a new frame.
    pub fn request(&mut self, reason: RepaintReason) -> bool {
        if self.pending {
            return false;
        }
        tracing::trace!(?reason, "repaint requested");
        self.pending = true;
        self.requester.request_frame();
        true
    }

    /// Consumes the pending request. False means nothing needs painting.
    pub fn begin_frame(&mut self) -> bool {
        if !self.pending {
            return false;
        }
        self.pending = false;
        self.frames += 1;
        true
    }

    /// Keeps the loop running while something is still moving.
    pub fn end_frame(&mut self, animating: bool) {
        if animating {
            self.request(RepaintReason::Animation);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Frames painted so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn requester(&self) -> &R {
        &self.requester
    }
}
