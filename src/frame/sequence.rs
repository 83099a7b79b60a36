use super::FrameSource;
use crate::error::{Result, ShapeError};
use image::RgbImage;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "gif"];

/// Frames read from a directory of still images, in file name order
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    position: usize,
    width: u32,
    height: u32,
}

impl ImageSequence {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        tracing::info!("Scanning {} for frames", dir.display());

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && has_image_extension(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(ShapeError::InvalidBuffer(format!(
                "no image frames found in {}",
                dir.display()
            )));
        }

        tracing::info!("Found {} frames", paths.len());

        Ok(Self::from_paths(paths))
    }

    /// Use an explicit, already ordered list of frame files
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            position: 0,
            width: 0,
            height: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequence {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let Some(path) = self.paths.get(self.position) else {
            return Ok(None);
        };
        self.position += 1;

        tracing::debug!("Decoding frame {}", path.display());
        let frame = image::open(path)?.to_rgb8();
        (self.width, self.height) = frame.dimensions();

        Ok(Some(frame))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
