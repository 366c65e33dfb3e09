//! Replay of recorded frame pairs from a directory.
//!
//! The directory holds `color_<tag>.png` (8-bit RGB) and `depth_<tag>.png`
//! (16-bit grayscale) files. Pairs are replayed in lexical order of the tag.

use super::{ColorFrame, DepthFrame, FrameMetadata, FramePair, FrameSource};
use crate::{Error, Result};
use ndarray::{Array2, Array3};
use std::path::{Path, PathBuf};

const COLOR_PREFIX: &str = "color_";
const DEPTH_PREFIX: &str = "depth_";

/// Frame source reading PNG pairs from disk
pub struct ImageSequenceSource {
    pairs: Vec<(PathBuf, PathBuf)>,
    next: usize,
    metadata: FrameMetadata,
}

impl ImageSequenceSource {
    /// Index the frame pairs in `dir`
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read, contains no pairs,
    /// a color frame has no matching depth frame, or the first pair cannot be
    /// decoded.
    pub fn open<P: AsRef<Path>>(dir: P, depth_scale: f64) -> Result<Self> {
        let dir = dir.as_ref();
        log::info!("Indexing recorded frames in {}", dir.display());

        let mut color_paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(COLOR_PREFIX) && name.ends_with(".png"))
            })
            .collect();
        color_paths.sort();

        let mut pairs = Vec::with_capacity(color_paths.len());
        for color_path in color_paths {
            let depth_path = depth_path_for(&color_path)?;
            if !depth_path.exists() {
                return Err(Error::FrameSource(format!(
                    "No depth frame for {}",
                    color_path.display()
                )));
            }
            pairs.push((color_path, depth_path));
        }

        let (first_color, _) = pairs
            .first()
            .ok_or_else(|| Error::FrameSource(format!("No color_*.png frames in {}", dir.display())))?;
        let (width, height) = image::image_dimensions(first_color)?;

        log::info!("Found {} frame pairs of {}x{}", pairs.len(), width, height);

        Ok(Self {
            pairs,
            next: 0,
            metadata: FrameMetadata {
                width,
                height,
                depth_scale,
            },
        })
    }

    /// Number of frame pairs in the sequence
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn metadata(&self) -> FrameMetadata {
        self.metadata
    }

    fn next_frame(&mut self) -> Result<Option<FramePair>> {
        let Some((color_path, depth_path)) = self.pairs.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;

        let color = load_color(color_path)?;
        let depth = load_depth(depth_path)?;
        let pair = FramePair::new(color, depth)?;

        if pair.width() != self.metadata.width as usize || pair.height() != self.metadata.height as usize {
            return Err(Error::FrameSource(format!(
                "{} is {}x{}, session is {}x{}",
                color_path.display(),
                pair.width(),
                pair.height(),
                self.metadata.width,
                self.metadata.height
            )));
        }

        Ok(Some(pair))
    }
}

fn depth_path_for(color_path: &Path) -> Result<PathBuf> {
    let name = color_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::InvalidInput(format!("Unreadable file name {}", color_path.display())))?;
    let tag = &name[COLOR_PREFIX.len()..];
    Ok(color_path.with_file_name(format!("{DEPTH_PREFIX}{tag}")))
}

/// Decode an RGB image into a BGR frame
fn load_color(path: &Path) -> Result<ColorFrame> {
    let rgb = image::open(path)?.into_rgb8();
    let (width, height) = rgb.dimensions();
    let mut data = rgb.into_raw();
    for pixel in data.chunks_exact_mut(3) {
        pixel.swap(0, 2);
    }
    Array3::from_shape_vec((height as usize, width as usize, 3), data)
        .map_err(|e| Error::FrameSource(format!("Failed to shape color frame: {e}")))
}

fn load_depth(path: &Path) -> Result<DepthFrame> {
    let depth = image::open(path)?.into_luma16();
    let (width, height) = depth.dimensions();
    Array2::from_shape_vec((height as usize, width as usize), depth.into_raw())
        .map_err(|e| Error::FrameSource(format!("Failed to shape depth frame: {e}")))
}
