use std::{
    fmt,
    io::Cursor,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Instant,
};

use anyhow::{anyhow, Result};
use eframe::egui;
use fast_image_resize::images::Image;
use fast_image_resize::{PixelType, ResizeOptions, Resizer};
use image::DynamicImage;
use zune_jpeg::JpegDecoder;

use crate::error::ViewerError;

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// One image URL handed in by the host. Identity is the URL string.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageSource {
    pub url: String,
}

impl ImageSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn from_path(path: &Path) -> Self {
        Self::new(path.to_string_lossy().into_owned())
    }

    /// Resolves the URL to a file on disk. Only `file://` URLs and bare
    /// paths are accepted; fetching over the network is left to the host.
    pub fn local_path(&self) -> Result<PathBuf, ViewerError> {
        if let Some(rest) = self.url.strip_prefix("file://") {
            return Ok(PathBuf::from(rest));
        }
        match self.url.split_once("://") {
            Some(_) => Err(ViewerError::UnsupportedUrl {
                url: self.url.clone(),
            }),
            None => Ok(PathBuf::from(&self.url)),
        }
    }
}

impl From<&str> for ImageSource {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

/// A decoded bitmap ready to be painted.
///
/// Cloning is cheap; the pixels are shared. `id` is unique per decode so
/// surfaces can key texture caches on it.
#[derive(Clone)]
pub struct LoadedImage {
    pub id: u64,
    pub source: ImageSource,
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<egui::ColorImage>,
}

impl LoadedImage {
    pub fn new(source: ImageSource, pixels: egui::ColorImage) -> Self {
        let [width, height] = pixels.size;
        Self {
            id: NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed),
            source,
            width: width as u32,
            height: height as u32,
            pixels: Arc::new(pixels),
        }
    }

    pub fn size(&self) -> egui::Vec2 {
        egui::vec2(self.width as f32, self.height as f32)
    }
}

impl fmt::Debug for LoadedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedImage")
            .field("id", &self.id)
            .field("url", &self.source.url)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// One slot of a published image list. Failed decodes keep their slot so
/// slide indices stay aligned with the host's list.
#[derive(Clone, Debug)]
pub enum SlideImage {
    Ready(LoadedImage),
    Failed { source: ImageSource, error: ViewerError },
}

impl SlideImage {
    pub fn source(&self) -> &ImageSource {
        match self {
            SlideImage::Ready(image) => &image.source,
            SlideImage::Failed { source, .. } => source,
        }
    }

    pub fn loaded(&self) -> Option<&LoadedImage> {
        match self {
            SlideImage::Ready(image) => Some(image),
            SlideImage::Failed { .. } => None,
        }
    }
}

/// Turns an [`ImageSource`] into pixels. Runs on the loader thread.
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, source: &ImageSource) -> Result<LoadedImage, ViewerError>;
}

/// Reads local files and decodes them with zune-jpeg or the `image` crate.
pub struct FileDecoder {
    max_size: (u32, u32),
}

impl FileDecoder {
    pub fn new(max_size: (u32, u32)) -> Self {
        Self { max_size }
    }
}

impl ImageDecoder for FileDecoder {
    fn decode(&self, source: &ImageSource) -> Result<LoadedImage, ViewerError> {
        let path = source.local_path()?;
        let start = Instant::now();
        let bytes = std::fs::read(&path).map_err(|err| ViewerError::Read {
            url: source.url.clone(),
            reason: format!("{err:#}"),
        })?;
        let image = decode_bytes(&path, &bytes).map_err(|err| ViewerError::Decode {
            url: source.url.clone(),
            reason: format!("{err:#}"),
        })?;
        drop(bytes);
        let image = downscale_to_fit(image, self.max_size);
        let color_image = to_color_image(&image);
        tracing::debug!(
            url = %source.url,
            width = image.width(),
            height = image.height(),
            elapsed = ?start.elapsed(),
            "decoded image"
        );
        Ok(LoadedImage::new(source.clone(), color_image))
    }
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|s| s.eq_ignore_ascii_case("jpg") || s.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false)
}

/// zune-jpeg is tried first for JPEGs; anything it rejects goes through
/// the `image` crate.
pub fn decode_bytes(path: &Path, bytes: &[u8]) -> Result<DynamicImage> {
    if is_jpeg(path) {
        if let Some(image) = decode_jpeg(bytes) {
            return Ok(image);
        }
    }
    image::load_from_memory(bytes).map_err(|err| anyhow!(err))
}

fn decode_jpeg(bytes: &[u8]) -> Option<DynamicImage> {
    let mut decoder = JpegDecoder::new(Cursor::new(bytes));
    let pixels = decoder.decode().ok()?;
    let info = decoder.info()?;
    image::RgbImage::from_raw(info.width as u32, info.height as u32, pixels)
        .map(DynamicImage::ImageRgb8)
}

/// Shrinks `image` so it fits inside `max`, keeping the aspect ratio.
/// Images already inside the bounds are returned untouched.
pub fn downscale_to_fit(image: DynamicImage, max: (u32, u32)) -> DynamicImage {
    let (max_w, max_h) = max;
    if image.width() <= max_w && image.height() <= max_h {
        return image;
    }
    let ratio = image.width() as f64 / image.height() as f64;
    let (new_w, new_h) = if ratio > max_w as f64 / max_h as f64 {
        (max_w, ((max_w as f64 / ratio) as u32).max(1))
    } else {
        (((max_h as f64 * ratio) as u32).max(1), max_h)
    };

    let rgba = image.to_rgba8();
    let Ok(src_image) =
        Image::from_vec_u8(rgba.width(), rgba.height(), rgba.into_raw(), PixelType::U8x4)
    else {
        return image.thumbnail(max_w, max_h);
    };
    let mut dst_image = Image::new(new_w, new_h, PixelType::U8x4);
    let mut resizer = Resizer::new();
    if let Err(err) = resizer.resize(&src_image, &mut dst_image, &ResizeOptions::default()) {
        tracing::warn!("fast resize failed, falling back to image::thumbnail: {err}");
        return image.thumbnail(max_w, max_h);
    }
    match image::RgbaImage::from_raw(new_w, new_h, dst_image.into_vec()) {
        Some(buffer) => DynamicImage::ImageRgba8(buffer),
        None => image.thumbnail(max_w, max_h),
    }
}

pub fn to_color_image(img: &DynamicImage) -> egui::ColorImage {
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let pixels = rgba.into_raw();
    egui::ColorImage::from_rgba_unmultiplied(size, &pixels)
}
