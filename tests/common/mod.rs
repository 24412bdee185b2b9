#![allow(dead_code)]

use std::{
    cell::Cell,
    collections::HashMap,
    path::PathBuf,
    rc::Rc,
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use eframe::egui;
use image::{DynamicImage, Rgba, RgbaImage};
use once_cell::sync::Lazy;

use slideviewer::{
    config::{ViewerPolicy, ViewportState},
    error::ViewerError,
    image_utils::{ImageDecoder, ImageSource, LoadedImage},
    viewer::{canvas::DisplayList, scheduler::FrameRequester, SlidingImageViewer},
};

pub static TINY_PIXELS: Lazy<egui::ColorImage> = Lazy::new(|| grey_pixels(1, 1));

pub fn grey_pixels(width: u32, height: u32) -> egui::ColorImage {
    let rgba = vec![128u8; (width * height * 4) as usize];
    egui::ColorImage::from_rgba_unmultiplied([width as usize, height as usize], &rgba)
}

pub fn solid_image(width: u32, height: u32, color: [u8; 4]) -> DynamicImage {
    let pixel = Rgba(color);
    let buffer = RgbaImage::from_pixel(width, height, pixel);
    DynamicImage::ImageRgba8(buffer)
}

pub fn write_image(path: impl Into<PathBuf>, image: &DynamicImage) {
    image
        .save(path.into())
        .expect("failed to write image to disk");
}

/// Frame requester that counts how often the viewer asked for a frame.
#[derive(Clone, Default)]
pub struct CountingRequester {
    pub count: Rc<Cell<u32>>,
}

impl FrameRequester for CountingRequester {
    fn request_frame(&self) {
        self.count.set(self.count.get() + 1);
    }
}

/// Decoder that never touches the disk.
///
/// URLs starting with `fail` error out, URLs listed in `delays` sleep first.
#[derive(Default)]
pub struct StubDecoder {
    pub size: (u32, u32),
    pub delays: HashMap<String, Duration>,
    pub calls: Mutex<Vec<String>>,
}

impl StubDecoder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ImageDecoder for StubDecoder {
    fn decode(&self, source: &ImageSource) -> Result<LoadedImage, ViewerError> {
        self.calls.lock().unwrap().push(source.url.clone());
        if let Some(delay) = self.delays.get(&source.url) {
            thread::sleep(*delay);
        }
        if source.url.starts_with("fail") {
            return Err(ViewerError::Decode {
                url: source.url.clone(),
                reason: "corrupt".into(),
            });
        }
        let pixels = grey_pixels(self.size.0, self.size.1);
        Ok(LoadedImage::new(source.clone(), pixels))
    }
}

pub type TestViewer = SlidingImageViewer<DisplayList, CountingRequester>;

pub fn sources(urls: &[&str]) -> Vec<ImageSource> {
    urls.iter().map(|url| ImageSource::new(*url)).collect()
}

pub fn fast_policy() -> ViewerPolicy {
    ViewerPolicy {
        min_loading: Duration::ZERO,
        ..ViewerPolicy::default()
    }
}

pub fn viewer_with(decoder: Arc<StubDecoder>, policy: ViewerPolicy) -> TestViewer {
    let mut viewer = SlidingImageViewer::with_decoder(
        ViewportState::new(300.0, 200.0),
        policy,
        CountingRequester::default(),
        decoder,
    );
    viewer
        .attach_surface(|| Some(DisplayList::new()))
        .expect("display list is always available");
    viewer
}

/// Drives frames until the loader has published or the deadline passes.
pub fn wait_until_loaded(viewer: &mut TestViewer) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while viewer.is_loading() {
        assert!(Instant::now() < deadline, "timed out waiting for images");
        viewer.frame(Instant::now());
        thread::sleep(Duration::from_millis(5));
    }
    viewer.frame(Instant::now());
}

/// 300x200 viewer with three loaded 600x400 images, events drained.
pub fn loaded_viewer() -> TestViewer {
    let mut viewer = viewer_with(Arc::new(StubDecoder::new(600, 400)), fast_policy());
    viewer.set_images(sources(&["a.png", "b.png", "c.png"]));
    wait_until_loaded(&mut viewer);
    viewer.poll_events();
    viewer
}

/// Runs frames at simulated times until the settle is over.
pub fn settle(viewer: &mut TestViewer, from: Instant) -> Instant {
    let mut now = from;
    for _ in 0..100 {
        now += Duration::from_millis(16);
        viewer.frame(now);
        if !viewer.is_animating() {
            break;
        }
    }
    now
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {expected}, got {actual}"
    );
}
