use std::time::Instant;

use eframe::egui::{self, Color32, Pos2, Rect};

use crate::{
    animation::LoadingAnimator,
    config::ViewportState,
    image_utils::{LoadedImage, SlideImage},
    layout::{layout, slide_left, slide_visible},
};

/// 2D drawing context the viewer paints into. Coordinates are device
/// pixels with the origin at the top-left corner of the viewport.
pub trait Surface {
    fn backing_size(&self) -> [u32; 2];
    fn resize_backing(&mut self, size: [u32; 2]);
    fn clear(&mut self);
    fn fill_rect(&mut self, rect: Rect, color: Color32);
    /// Draws `image` stretched to `rect`, clipped to `clip`.
    fn draw_image(&mut self, image: &LoadedImage, rect: Rect, clip: Rect);
}

#[derive(Clone, Debug)]
pub enum DrawCommand {
    FillRect { rect: Rect, color: Color32 },
    Image { image: LoadedImage, rect: Rect, clip: Rect },
}

/// Retained surface: keeps the commands of the last paint so an immediate
/// mode host can replay them until the next paint.
#[derive(Debug, Default)]
pub struct DisplayList {
    backing: [u32; 2],
    commands: Vec<DrawCommand>,
    resizes: u32,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of times the backing buffer was reallocated.
    pub fn resizes(&self) -> u32 {
        self.resizes
    }

    /// Ids of the images drawn by the last paint, left to right.
    pub fn image_ids(&self) -> Vec<u64> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Image { image, .. } => Some(image.id),
                DrawCommand::FillRect { .. } => None,
            })
            .collect()
    }
}

impl Surface for DisplayList {
    fn backing_size(&self) -> [u32; 2] {
        self.backing
    }

    fn resize_backing(&mut self, size: [u32; 2]) {
        self.backing = size;
        self.resizes += 1;
    }

    fn clear(&mut self) {
        self.commands.clear();
    }

    fn fill_rect(&mut self, rect: Rect, color: Color32) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn draw_image(&mut self, image: &LoadedImage, rect: Rect, clip: Rect) {
        self.commands.push(DrawCommand::Image {
            image: image.clone(),
            rect,
            clip,
        });
    }
}

/// Snapshot of everything one paint needs.
pub struct FrameInput<'a> {
    pub viewport: ViewportState,
    pub device_pixel_ratio: f32,
    /// Strip offset in logical pixels.
    pub offset: f32,
    pub loading: bool,
    pub images: &'a [SlideImage],
    pub pulse: &'a LoadingAnimator,
    pub now: Instant,
}

impl FrameInput<'_> {
    pub fn viewport_px(&self) -> egui::Vec2 {
        egui::vec2(
            self.viewport.width * self.device_pixel_ratio,
            self.viewport.height * self.device_pixel_ratio,
        )
    }
}

pub fn backing_size_for(viewport: &ViewportState, device_pixel_ratio: f32) -> [u32; 2] {
    [
        (viewport.width * device_pixel_ratio).round().max(0.0) as u32,
        (viewport.height * device_pixel_ratio).round().max(0.0) as u32,
    ]
}

/// Reallocates the backing buffer only when its size actually changed.
pub fn sync_backing<S: Surface>(
    surface: &mut S,
    viewport: &ViewportState,
    device_pixel_ratio: f32,
) -> bool {
    let wanted = backing_size_for(viewport, device_pixel_ratio);
    if surface.backing_size() == wanted {
        return false;
    }
    tracing::debug!(width = wanted[0], height = wanted[1], "resizing backing buffer");
    surface.resize_backing(wanted);
    true
}

pub fn paint<S: Surface>(surface: &mut S, frame: &FrameInput<'_>) {
    surface.clear();
    if frame.loading {
        paint_loading(surface, frame);
    } else {
        paint_images(surface, frame);
    }
}

fn paint_loading<S: Surface>(surface: &mut S, frame: &FrameInput<'_>) {
    let rect = Rect::from_min_size(Pos2::ZERO, frame.viewport_px());
    let color = frame.pulse.color(frame.viewport.theme, frame.now);
    surface.fill_rect(rect, color);
}

fn paint_images<S: Surface>(surface: &mut S, frame: &FrameInput<'_>) {
    let size = frame.viewport_px();
    let viewport_rect = Rect::from_min_size(Pos2::ZERO, size);
    let offset_px = frame.offset * frame.device_pixel_ratio;

    for (index, slot) in frame.images.iter().enumerate() {
        let left = slide_left(offset_px, index, size.x);
        if !slide_visible(left, size.x, size.x) {
            continue;
        }
        let shift = egui::vec2(left, 0.0);
        let slide = Rect::from_min_size(Pos2::ZERO, size).translate(shift);
        let clip = slide.intersect(viewport_rect);
        match slot {
            SlideImage::Ready(image) => {
                let rect = layout(size, image.size(), frame.viewport.fit).translate(shift);
                surface.draw_image(image, rect, clip);
            }
            SlideImage::Failed { .. } => {
                let color = frame.viewport.theme.pulse_color().gamma_multiply(0.5);
                surface.fill_rect(clip, color);
            }
        }
    }
}
