use std::{
    f32::consts::PI,
    time::{Duration, Instant},
};

use eframe::egui::Color32;

use crate::config::Theme;

pub const PULSE_MIN_OPACITY: f32 = 0.2;
pub const PULSE_MAX_OPACITY: f32 = 1.0;

/// Symmetric cubic ease-in-out. Input is clamped to `[0, 1]`.
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = 1.0 - t;
        1.0 - 4.0 * u * u * u
    }
}

/// Linear progress of `elapsed` through `duration`, clamped to `[0, 1]`.
/// A zero duration is complete immediately.
pub fn progress(elapsed: Duration, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0)
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapAnimation {
    pub from: f32,
    pub to: f32,
    pub started_at: Instant,
    pub duration: Duration,
}

impl SnapAnimation {
    pub fn offset_at(&self, now: Instant) -> f32 {
        let t = progress(now.saturating_duration_since(self.started_at), self.duration);
        if t >= 1.0 {
            return self.to;
        }
        lerp(self.from, self.to, ease_in_out_cubic(t))
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started_at) >= self.duration
    }
}

/// Eased interpolation of the strip offset towards a slide boundary.
///
/// Progress is derived from wall-clock time, so the animation lasts the
/// same regardless of how often it is sampled.
#[derive(Debug)]
pub struct SnapAnimator {
    duration: Duration,
    active: Option<SnapAnimation>,
}

impl SnapAnimator {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            active: None,
        }
    }

    /// Starts (or restarts) a settle from `from` to `to`. Returns false and
    /// leaves the animator idle when there is nowhere to go.
    pub fn start(&mut self, from: f32, to: f32, now: Instant) -> bool {
        if from == to {
            self.active = None;
            return false;
        }
        self.active = Some(SnapAnimation {
            from,
            to,
            started_at: now,
            duration: self.duration,
        });
        true
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn target(&self) -> Option<f32> {
        self.active.map(|a| a.to)
    }

    pub fn current(&self) -> Option<&SnapAnimation> {
        self.active.as_ref()
    }

    /// Offset at `now`. Once progress reaches 1 the animation is dropped and
    /// the exact target is returned.
    pub fn sample(&mut self, now: Instant) -> Option<f32> {
        let animation = self.active?;
        if animation.is_finished(now) {
            self.active = None;
            return Some(animation.to);
        }
        Some(animation.offset_at(now))
    }

    /// Stops the animation, returning the offset it had reached at `now`.
    pub fn cancel(&mut self, now: Instant) -> Option<f32> {
        self.active.take().map(|a| a.offset_at(now))
    }

    pub fn stop(&mut self) {
        self.active = None;
    }
}

/// Infinite opacity pulse painted while images load.
#[derive(Debug, Clone)]
pub struct LoadingAnimator {
    period: Duration,
    epoch: Instant,
}

impl LoadingAnimator {
    pub fn new(period: Duration, epoch: Instant) -> Self {
        Self { period, epoch }
    }

    /// 0 → 1 → 0 bounce over one period.
    pub fn bounce(&self, now: Instant) -> f32 {
        let period_ms = self.period.as_millis().max(1);
        let elapsed_ms = now.saturating_duration_since(self.epoch).as_millis();
        let t = (elapsed_ms % period_ms) as f32 / period_ms as f32;
        (ease_in_out_cubic(t) * PI).sin().max(0.0)
    }

    pub fn opacity(&self, now: Instant) -> f32 {
        lerp(PULSE_MIN_OPACITY, PULSE_MAX_OPACITY, self.bounce(now))
    }

    pub fn color(&self, theme: Theme, now: Instant) -> Color32 {
        theme.pulse_color().gamma_multiply(self.opacity(now))
    }
}
