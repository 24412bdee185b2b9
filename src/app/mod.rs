pub mod pointer;
pub mod surface;

use std::{
    collections::HashSet,
    time::{Duration, Instant},
};

use anyhow::Result;
use eframe::{
    egui::{self, Color32},
    App, Frame,
};

use crate::{
    config::{Fit, Theme, ViewerPolicy, ViewportState},
    gesture::SlideDirection,
    image_utils::ImageSource,
    viewer::{SlidingImageViewer, ViewerEvent},
};

use self::{
    pointer::{PointerAction, PointerTracker},
    surface::{EguiFrameRequester, EguiSurface},
};

const STRIP_HEIGHT: f32 = 56.0;

pub struct AppOptions {
    pub sources: Vec<ImageSource>,
    /// Fixed viewport size in points; `None` fills the window.
    pub size: Option<egui::Vec2>,
    pub theme: Theme,
    pub fit: Fit,
    pub policy: ViewerPolicy,
}

pub struct SlideViewerApp {
    viewer: SlidingImageViewer<EguiSurface, EguiFrameRequester>,
    fixed_size: Option<egui::Vec2>,
    /// Thumbnail selection, driven only by index change events.
    selected: usize,
    pointer: PointerTracker,
    status: String,
    last_error: Option<String>,
}

impl SlideViewerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, options: AppOptions) -> Result<Self> {
        let ctx = &cc.egui_ctx;
        ctx.set_visuals(match options.theme {
            Theme::Light => egui::Visuals::light(),
            Theme::Dark => egui::Visuals::dark(),
        });

        let mut viewport = ViewportState::new(1.0, 1.0);
        viewport.theme = options.theme;
        viewport.fit = options.fit;
        if let Some(size) = options.size {
            viewport.width = size.x;
            viewport.height = size.y;
        }

        let requester = EguiFrameRequester::new(ctx.clone());
        let mut viewer = SlidingImageViewer::new(viewport, options.policy, requester);
        viewer.set_device_pixel_ratio(ctx.pixels_per_point());
        // Without a wgpu render state there is nothing to upload textures to
        viewer.attach_surface(|| cc.wgpu_render_state.as_ref().map(|_| EguiSurface::new()))?;
        let count = options.sources.len();
        viewer.set_images(options.sources);
        tracing::info!(count, "viewer ready");

        Ok(Self {
            viewer,
            fixed_size: options.size,
            selected: 0,
            pointer: PointerTracker::new(),
            status: format!("Loading {count} images..."),
            last_error: None,
        })
    }

    fn handle_pointer(&mut self, response: &egui::Response, now: Instant) {
        let left = response.rect.min.x;
        let (press_x, press_age, x) = response.ctx.input(|i| {
            (
                i.pointer.press_origin().map(|pos| pos.x - left),
                i.pointer.press_start_time().map(|t| (i.time - t).max(0.0)),
                i.pointer.latest_pos().map(|pos| pos.x - left),
            )
        });
        let held = response.is_pointer_button_down_on();

        match self.pointer.update(held, press_x, x) {
            Some(PointerAction::Down(x)) => {
                // The press can be older than this pass
                let pressed_at = press_age
                    .and_then(|age| now.checked_sub(Duration::from_secs_f64(age)))
                    .unwrap_or(now);
                self.viewer.pointer_down(x, pressed_at);
            }
            Some(PointerAction::Move(x)) => self.viewer.pointer_move(x),
            Some(PointerAction::Up(x)) => self.viewer.pointer_up(x, now),
            None => {}
        }
    }

    fn handle_events(&mut self) {
        for event in self.viewer.poll_events() {
            match event {
                ViewerEvent::ActiveIndexChanged(index) => {
                    self.selected = index;
                    self.update_status();
                }
                ViewerEvent::LoadingChanged(true) => {
                    self.status = format!("Loading {} images...", self.viewer.sources().len());
                }
                ViewerEvent::LoadingChanged(false) => {
                    let keep: HashSet<u64> = self
                        .viewer
                        .images()
                        .iter()
                        .filter_map(|slot| slot.loaded().map(|image| image.id))
                        .collect();
                    if let Some(surface) = self.viewer.surface_mut() {
                        surface.retain_textures(&keep);
                    }
                    self.update_status();
                }
                ViewerEvent::Error(err) => {
                    self.last_error = Some(format!("{err:#}"));
                }
            }
        }
    }

    fn update_status(&mut self) {
        let total = self.viewer.sources().len();
        self.status = match self.viewer.sources().get(self.selected) {
            Some(source) => format!("Image {} of {} - {}", self.selected + 1, total, source.url),
            None => "No images".into(),
        };
    }

    fn draw_drag_hint(&self, painter: &egui::Painter, rect: egui::Rect) {
        let Some(direction) = self.viewer.drag_hint() else {
            return;
        };
        let (pos, align, glyph) = match direction {
            SlideDirection::Previous => (
                rect.left_center() + egui::vec2(16.0, 0.0),
                egui::Align2::LEFT_CENTER,
                "‹",
            ),
            SlideDirection::Next => (
                rect.right_center() - egui::vec2(16.0, 0.0),
                egui::Align2::RIGHT_CENTER,
                "›",
            ),
        };
        painter.text(
            pos,
            align,
            glyph,
            egui::FontId::proportional(48.0),
            Color32::from_white_alpha(200),
        );
    }

    fn thumbnail_strip(&mut self, ui: &mut egui::Ui, now: Instant) {
        let count = self.viewer.sources().len();
        egui::ScrollArea::horizontal().show(ui, |ui| {
            ui.horizontal(|ui| {
                for index in 0..count {
                    let label = format!("{}", index + 1);
                    if ui.selectable_label(index == self.selected, label).clicked() {
                        self.viewer.slide_to(index, now);
                    }
                }
            });
        });
    }
}

impl App for SlideViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        let now = Instant::now();

        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size() - egui::vec2(0.0, STRIP_HEIGHT);
            let size = self.fixed_size.unwrap_or(available.max(egui::vec2(1.0, 1.0)));
            self.viewer.set_size(size.x, size.y);
            self.viewer.set_device_pixel_ratio(ctx.pixels_per_point());

            let (response, painter) = ui.allocate_painter(size, egui::Sense::drag());
            self.handle_pointer(&response, now);
            self.viewer.frame(now);
            if let Some(surface) = self.viewer.surface_mut() {
                surface.replay(ctx, &painter, response.rect.min);
            }
            self.draw_drag_hint(&painter, response.rect);

            self.thumbnail_strip(ui, now);
            ui.horizontal(|ui| {
                ui.monospace(&self.status);
                if let Some(err) = &self.last_error {
                    ui.colored_label(Color32::LIGHT_RED, err);
                }
            });
        });

        self.handle_events();
    }
}
