use std::collections::{HashMap, HashSet};

use eframe::egui::{self, Color32, Pos2, Rect};

use crate::{
    image_utils::LoadedImage,
    viewer::{
        canvas::{DisplayList, DrawCommand, Surface},
        scheduler::FrameRequester,
    },
};

/// Maps the viewer's frame requests onto egui repaints.
pub struct EguiFrameRequester {
    ctx: egui::Context,
}

impl EguiFrameRequester {
    pub fn new(ctx: egui::Context) -> Self {
        Self { ctx }
    }
}

impl FrameRequester for EguiFrameRequester {
    fn request_frame(&self) {
        self.ctx.request_repaint();
    }
}

/// Surface backed by egui textures.
///
/// egui redraws everything on every pass, so paints are recorded into a
/// [`DisplayList`] and replayed until the viewer paints again.
#[derive(Default)]
pub struct EguiSurface {
    list: DisplayList,
    textures: HashMap<u64, egui::TextureHandle>,
}

impl EguiSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frees textures of images that are no longer part of the list.
    pub fn retain_textures(&mut self, keep: &HashSet<u64>) {
        self.textures.retain(|id, _| keep.contains(id));
    }

    /// Draws the last recorded paint with its top-left corner at `origin`.
    pub fn replay(&mut self, ctx: &egui::Context, painter: &egui::Painter, origin: Pos2) {
        let ppp = ctx.pixels_per_point();
        let to_points =
            |r: Rect| Rect::from_min_max(origin + r.min.to_vec2() / ppp, origin + r.max.to_vec2() / ppp);
        let uv = Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));

        for command in self.list.commands() {
            match command {
                DrawCommand::FillRect { rect, color } => {
                    painter.rect_filled(to_points(*rect), 0.0, *color);
                }
                DrawCommand::Image { image, rect, clip } => {
                    let texture = self.textures.entry(image.id).or_insert_with(|| {
                        ctx.load_texture(
                            format!("slide-{}", image.id),
                            (*image.pixels).clone(),
                            egui::TextureOptions::LINEAR,
                        )
                    });
                    let clip = to_points(*clip).intersect(painter.clip_rect());
                    painter
                        .with_clip_rect(clip)
                        .image(texture.id(), to_points(*rect), uv, Color32::WHITE);
                }
            }
        }
    }
}

impl Surface for EguiSurface {
    fn backing_size(&self) -> [u32; 2] {
        self.list.backing_size()
    }

    fn resize_backing(&mut self, size: [u32; 2]) {
        self.list.resize_backing(size);
    }

    fn clear(&mut self) {
        self.list.clear();
    }

    fn fill_rect(&mut self, rect: Rect, color: Color32) {
        self.list.fill_rect(rect, color);
    }

    fn draw_image(&mut self, image: &LoadedImage, rect: Rect, clip: Rect) {
        self.list.draw_image(image, rect, clip);
    }
}
