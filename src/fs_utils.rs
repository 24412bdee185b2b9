use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use rand::seq::SliceRandom;
use walkdir::WalkDir;

use crate::image_utils::ImageSource;

pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "bmp", "gif", "webp", "tiff", "tif", "ico",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortOrder {
    #[default]
    Filename,
    Randomize,
    Modified,
}

pub fn collect_images(root: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(anyhow!("{} does not exist", root.display()));
    }
    if !root.is_dir() {
        return Err(anyhow!("{} is not a directory", root.display()));
    }

    let mut files = Vec::new();
    if recursive {
        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() && is_supported_image(entry.path()) {
                files.push(entry.path().to_path_buf());
            }
        }
    } else {
        for entry in fs::read_dir(root)
            .with_context(|| format!("Unable to read directory {}", root.display()))?
        {
            let entry =
                entry.with_context(|| format!("Unable to read entry in {}", root.display()))?;
            let path = entry.path();
            if path.is_file() && is_supported_image(&path) {
                files.push(path);
            }
        }
    }
    Ok(files)
}

pub fn is_supported_image(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ref ext) if SUPPORTED_EXTENSIONS.contains(&ext.as_str())
    )
}

pub fn sort_images(files: &mut [PathBuf], order: SortOrder, inverse: bool) {
    match order {
        SortOrder::Filename => files.sort(),
        SortOrder::Randomize => files.shuffle(&mut rand::thread_rng()),
        SortOrder::Modified => files.sort_by_key(|path| {
            fs::metadata(path)
                .and_then(|m| m.modified())
                .ok()
        }),
    }
    // Reversing a shuffle is meaningless
    if inverse && order != SortOrder::Randomize {
        files.reverse();
    }
}

/// Expands command line inputs into an ordered list of sources.
///
/// URLs pass through untouched, directories are expanded and sorted,
/// plain files are kept in the order given.
pub fn resolve_inputs(
    inputs: &[String],
    recursive: bool,
    order: SortOrder,
    inverse: bool,
) -> Result<Vec<ImageSource>> {
    let mut sources = Vec::new();
    for input in inputs {
        if input.contains("://") {
            sources.push(ImageSource::new(input.as_str()));
            continue;
        }
        let path = Path::new(input);
        if path.is_dir() {
            let mut files = collect_images(path, recursive)?;
            sort_images(&mut files, order, inverse);
            sources.extend(files.iter().map(|p| ImageSource::from_path(p)));
        } else if path.is_file() {
            sources.push(ImageSource::from_path(path));
        } else {
            return Err(anyhow!("{} does not exist", path.display()));
        }
    }
    Ok(sources)
}
