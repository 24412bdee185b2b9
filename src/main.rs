use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use eframe::egui;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use slideviewer::app::{AppOptions, SlideViewerApp};
use slideviewer::config::{Fit, Theme, ViewerPolicy};
use slideviewer::fs_utils::{resolve_inputs, SortOrder, SUPPORTED_EXTENSIONS};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Swipe through images with a gesture-driven sliding viewer"
)]
struct Args {
    /// Image files, file:// URLs or directories to show, in order
    #[arg(value_name = "IMAGE", required = true)]
    inputs: Vec<String>,

    /// Recurse into subdirectories to find images (disabled by default)
    #[arg(short = 'r', long = "recursive", default_value_t = false)]
    recursive: bool,

    /// Order of images found in a directory
    #[arg(short = 'o', long, value_enum, default_value_t = SortOrder::Filename)]
    order: SortOrder,

    /// Invert order of directory images (ignored for randomize)
    #[arg(short = 'i', long = "inverse-order", default_value_t = false)]
    inverse: bool,

    /// Viewport width in logical pixels (fills the window when omitted)
    #[arg(long, requires = "height")]
    width: Option<f32>,

    /// Viewport height in logical pixels (fills the window when omitted)
    #[arg(long, requires = "width")]
    height: Option<f32>,

    #[arg(short = 't', long, value_enum, default_value_t = Theme::Light)]
    theme: Theme,

    /// How each image is fitted into the viewport
    #[arg(short = 'f', long, value_enum, default_value_t = Fit::Contain)]
    fit: Fit,

    /// Minimum time the loading indicator stays visible
    #[arg(long, default_value_t = 500)]
    min_loading_ms: u64,

    /// Give up on a single image after this long (waits forever when omitted)
    #[arg(long)]
    decode_timeout_ms: Option<u64>,

    /// Average drag speed in px/ms that turns a short drag into a flick
    #[arg(long, default_value_t = 0.5)]
    flick_velocity: f32,

    /// Duration of the settle animation
    #[arg(long, default_value_t = 300)]
    snap_ms: u64,
}

impl Args {
    fn policy(&self) -> ViewerPolicy {
        ViewerPolicy {
            min_loading: Duration::from_millis(self.min_loading_ms),
            decode_timeout: self.decode_timeout_ms.map(Duration::from_millis),
            flick_velocity: self.flick_velocity,
            snap_duration: Duration::from_millis(self.snap_ms),
            ..ViewerPolicy::default()
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "slideviewer=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let sources = resolve_inputs(&args.inputs, args.recursive, args.order, args.inverse)?;
    if sources.is_empty() {
        return Err(anyhow!(
            "No supported image files found in {}. Supported formats are: {}",
            args.inputs.join(", "),
            SUPPORTED_EXTENSIONS.join(", ")
        ));
    }
    tracing::info!(count = sources.len(), "collected images");

    let size = args.width.zip(args.height).map(|(w, h)| egui::vec2(w, h));
    let mut viewport = egui::ViewportBuilder::default().with_title("slideviewer");
    if let Some(size) = size {
        viewport = viewport.with_inner_size(size + egui::vec2(16.0, 88.0));
    }
    let native_options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    let options = AppOptions {
        sources,
        size,
        theme: args.theme,
        fit: args.fit,
        policy: args.policy(),
    };

    eframe::run_native(
        "slideviewer",
        native_options,
        Box::new(move |cc| match SlideViewerApp::new(cc, options) {
            Ok(app) => Ok(Box::new(app) as Box<dyn eframe::App>),
            Err(err) => {
                tracing::error!("{err:#}");
                Err(err.into())
            }
        }),
    )?;

    Ok(())
}
