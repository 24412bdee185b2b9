use std::time::Duration;

use clap::ValueEnum;
use eframe::egui::Color32;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, ValueEnum)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Grey used for the loading pulse and failed-image placeholders.
    /// Picked to stay visible against the matching window background.
    pub fn pulse_color(self) -> Color32 {
        match self {
            Theme::Light => Color32::from_gray(200),
            Theme::Dark => Color32::from_gray(70),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, ValueEnum)]
pub enum Fit {
    /// Whole image visible, letterboxed on one axis.
    #[default]
    Contain,
    /// Viewport fully covered, image cropped on one axis.
    Cover,
}

/// Everything the host sets on the viewer besides the image list.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportState {
    pub width: f32,
    pub height: f32,
    pub theme: Theme,
    pub fit: Fit,
}

impl ViewportState {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            theme: Theme::default(),
            fit: Fit::default(),
        }
    }
}

/// Tunable thresholds and durations.
///
/// None of these are load-bearing contracts; the defaults reproduce the
/// feel of the original carousel.
#[derive(Clone, Debug)]
pub struct ViewerPolicy {
    /// Minimum time the loading pulse stays visible for a new image list.
    pub min_loading: Duration,
    /// Per-image decode deadline. `None` waits for the decoder indefinitely.
    pub decode_timeout: Option<Duration>,
    /// Fraction of the viewport width a drag must travel to count as a flick.
    pub flick_distance_fraction: f32,
    /// Average drag speed (logical px per ms) a flick must exceed.
    pub flick_velocity: f32,
    pub snap_duration: Duration,
    pub pulse_period: Duration,
    /// Decoded images larger than this are downscaled before upload.
    pub max_decode_size: (u32, u32),
}

impl Default for ViewerPolicy {
    fn default() -> Self {
        Self {
            min_loading: Duration::from_millis(500),
            decode_timeout: None,
            flick_distance_fraction: 0.1,
            flick_velocity: 0.5,
            snap_duration: Duration::from_millis(300),
            pulse_period: Duration::from_millis(2000),
            max_decode_size: (3840, 2160),
        }
    }
}
