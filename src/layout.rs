//! Placement of a single image inside the viewport.
//!
//! Everything here is pure and unit-agnostic: pass logical sizes to get
//! logical rectangles, device pixels to get device pixels. No rounding is
//! applied, rasterisation is the caller's business.

use eframe::egui::{self, Pos2, Rect, Vec2};

use crate::config::Fit;

/// Scale factor that maps `image` onto `viewport` under `fit`.
pub fn fit_scale(image: Vec2, viewport: Vec2, fit: Fit) -> f32 {
    let safe = egui::vec2(image.x.max(1.0), image.y.max(1.0));
    let sx = viewport.x / safe.x;
    let sy = viewport.y / safe.y;
    match fit {
        Fit::Contain => sx.min(sy),
        Fit::Cover => sx.max(sy),
    }
}

/// Rectangle of `image` placed in a viewport whose top-left corner is the
/// origin, centred on both axes.
///
/// `Contain` never exceeds the viewport, `Cover` never falls short of it.
/// When both aspect ratios match, both fits return the viewport itself.
pub fn layout(viewport: Vec2, image: Vec2, fit: Fit) -> Rect {
    let full = Rect::from_min_size(Pos2::ZERO, viewport);
    if image.x * viewport.y == image.y * viewport.x {
        return full;
    }
    let scale = fit_scale(image, viewport, fit);
    let mut display = egui::vec2(image.x.max(1.0), image.y.max(1.0)) * scale;
    // Guard against the last ulp pushing past the viewport edge
    display = match fit {
        Fit::Contain => display.min(viewport),
        Fit::Cover => display.max(viewport),
    };
    let offset = (viewport - display) * 0.5;
    Rect::from_min_size(Pos2::ZERO + offset, display)
}

/// Horizontal position of slide `index` when the strip is shifted by `offset`.
pub fn slide_left(offset: f32, index: usize, slide_width: f32) -> f32 {
    offset + index as f32 * slide_width
}

/// Whether a slide starting at `left` overlaps `[0, viewport_width)`.
pub fn slide_visible(left: f32, slide_width: f32, viewport_width: f32) -> bool {
    left < viewport_width && left + slide_width > 0.0
}

/// Nearest slide to `offset`, clamped to the list.
pub fn nearest_index(offset: f32, slide_width: f32, count: usize) -> usize {
    if count == 0 || slide_width <= 0.0 {
        return 0;
    }
    let raw = (-offset / slide_width).round();
    (raw.max(0.0) as usize).min(count - 1)
}

/// Offset that puts slide `index` exactly in the viewport.
pub fn offset_for_index(index: usize, slide_width: f32) -> f32 {
    -(index as f32) * slide_width
}
