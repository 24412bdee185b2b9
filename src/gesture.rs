//! Drag/swipe interpretation for the slide strip.
//!
//! The controller only knows offsets and x coordinates in logical pixels.
//! It never touches the active index itself; on release it tells the caller
//! which slide to settle on.

use std::time::Instant;

use crate::layout::nearest_index;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlideDirection {
    Previous,
    Next,
}

impl SlideDirection {
    /// Step from `index` in this direction, clamped to `[0, count - 1]`.
    pub fn step(self, index: usize, count: usize) -> usize {
        let last = count.saturating_sub(1);
        match self {
            SlideDirection::Previous => index.saturating_sub(1),
            SlideDirection::Next => (index + 1).min(last),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DragSession {
    pub start_x: f32,
    pub started_at: Instant,
    pub offset_before_drag: f32,
    pub current_offset: f32,
    /// Direction latched once the drag passes half a slide.
    pub locked_direction: Option<SlideDirection>,
    /// Offset implied by the latched direction.
    pub pending_target_offset: Option<f32>,
    /// Active index when the pointer went down.
    pub start_index: usize,
}

/// Why a release settled where it did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReleaseKind {
    /// A different slide became the nearest one.
    Positional,
    /// Short fast drag advanced one slide.
    Flick,
    /// Not far or fast enough, back to the starting slide.
    SnapBack,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Release {
    pub target_index: usize,
    pub kind: ReleaseKind,
}

#[derive(Clone, Copy, Debug)]
pub struct FlickPolicy {
    /// Fraction of the slide width the drag has to cover.
    pub distance_fraction: f32,
    /// Minimum average speed in px/ms.
    pub velocity: f32,
}

#[derive(Debug)]
pub struct GestureController {
    flick: FlickPolicy,
    session: Option<DragSession>,
}

impl GestureController {
    pub fn new(flick: FlickPolicy) -> Self {
        Self {
            flick,
            session: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn locked_direction(&self) -> Option<SlideDirection> {
        self.session.as_ref().and_then(|s| s.locked_direction)
    }

    /// IDLE → DRAGGING. `baseline` must already reflect any cancelled
    /// animation so the strip does not jump.
    pub fn pointer_down(&mut self, x: f32, now: Instant, baseline: f32, active_index: usize) {
        self.session = Some(DragSession {
            start_x: x,
            started_at: now,
            offset_before_drag: baseline,
            current_offset: baseline,
            locked_direction: None,
            pending_target_offset: None,
            start_index: active_index,
        });
    }

    /// Returns the new offset, or `None` when no drag is in progress.
    pub fn pointer_move(&mut self, x: f32, slide_width: f32) -> Option<f32> {
        let session = self.session.as_mut()?;
        let displacement = x - session.start_x;
        session.current_offset = session.offset_before_drag + displacement;

        let threshold = slide_width * 0.5;
        if displacement < -threshold && session.locked_direction != Some(SlideDirection::Next) {
            session.locked_direction = Some(SlideDirection::Next);
            session.pending_target_offset = Some(session.offset_before_drag - slide_width);
        } else if displacement > threshold
            && session.locked_direction != Some(SlideDirection::Previous)
        {
            session.locked_direction = Some(SlideDirection::Previous);
            session.pending_target_offset = Some(session.offset_before_drag + slide_width);
        }
        Some(session.current_offset)
    }

    /// DRAGGING → IDLE. Picks the slide to settle on.
    pub fn pointer_up(
        &mut self,
        x: f32,
        now: Instant,
        slide_width: f32,
        count: usize,
    ) -> Option<Release> {
        self.pointer_move(x, slide_width)?;
        let session = self.session.take()?;

        let nearest = nearest_index(session.current_offset, slide_width, count);
        if nearest != session.start_index {
            return Some(Release {
                target_index: nearest,
                kind: ReleaseKind::Positional,
            });
        }

        let travel = x - session.start_x;
        let distance = travel.abs();
        let elapsed_ms = now
            .saturating_duration_since(session.started_at)
            .as_secs_f32()
            * 1000.0;
        // A zero-length drag cannot be a flick; guard the division
        let speed = if elapsed_ms > 0.0 {
            distance / elapsed_ms
        } else if distance > 0.0 {
            f32::INFINITY
        } else {
            0.0
        };

        if distance > slide_width * self.flick.distance_fraction && speed > self.flick.velocity {
            let direction = if travel < 0.0 {
                SlideDirection::Next
            } else {
                SlideDirection::Previous
            };
            let target_index = direction.step(session.start_index, count);
            tracing::debug!(distance, speed, ?direction, target_index, "flick");
            return Some(Release {
                target_index,
                kind: ReleaseKind::Flick,
            });
        }

        Some(Release {
            target_index: session.start_index,
            kind: ReleaseKind::SnapBack,
        })
    }

    /// Drops the drag without settling, e.g. after a viewport resize.
    pub fn cancel(&mut self) -> Option<DragSession> {
        self.session.take()
    }
}
