//! Media conversion.
//!
//! The store only needs to know whether a conversion succeeded and where the
//! output went; [`MediaConverter`] is that seam. [`ImageConverter`] is the
//! built-in implementation: it resizes still images to the sticker square
//! and writes lossless WebP, or PNG when the output path ends in `.png`.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::ValueEnum;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageEncoder, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

/// Side length of a sticker image.
pub const STICKER_SIDE: u32 = 512;
/// Side length used for generated tray icons.
pub const TRAY_SIDE: u32 = 96;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Conversion input not found: {path}")]
    SourceNotFound { path: String },

    #[error("Failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Failed to encode {path}: {reason}")]
    Encode { path: String, reason: String },

    #[error("Conversion task failed: {0}")]
    TaskFailed(String),
}

/// Strategy for fitting an image into the target square.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeStrategy {
    /// Keep aspect ratio, pad with transparency.
    #[default]
    Fit,
    /// Keep aspect ratio, crop the overflow.
    Fill,
    /// Ignore aspect ratio.
    Stretch,
}

/// Converts one media file into a form the store accepts.
pub trait MediaConverter: Send + Sync {
    /// Write the converted form of `input` to `output` and return the output path.
    fn convert(&self, input: &Path, output: &Path) -> Result<PathBuf, ConvertError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageConverter {
    pub width: u32,
    pub height: u32,
    pub strategy: ResizeStrategy,
}

impl Default for ImageConverter {
    fn default() -> Self {
        Self::sticker(ResizeStrategy::default())
    }
}

impl ImageConverter {
    pub const fn sticker(strategy: ResizeStrategy) -> Self {
        Self {
            width: STICKER_SIDE,
            height: STICKER_SIDE,
            strategy,
        }
    }

    pub const fn tray(strategy: ResizeStrategy) -> Self {
        Self {
            width: TRAY_SIDE,
            height: TRAY_SIDE,
            strategy,
        }
    }

    /// Resize `img` to the target box.
    pub fn resize(&self, img: &DynamicImage) -> RgbaImage {
        let (width, height) = (self.width, self.height);
        let filter = image::imageops::FilterType::Lanczos3;
        match self.strategy {
            ResizeStrategy::Fit => {
                let resized = img.resize(width, height, filter).to_rgba8();
                let mut canvas = RgbaImage::new(width, height);
                let (rw, rh) = resized.dimensions();
                let x = (width - rw) / 2;
                let y = (height - rh) / 2;
                image::imageops::overlay(&mut canvas, &resized, x.into(), y.into());
                canvas
            }
            ResizeStrategy::Fill => img.resize_to_fill(width, height, filter).to_rgba8(),
            ResizeStrategy::Stretch => img.resize_exact(width, height, filter).to_rgba8(),
        }
    }
}

impl MediaConverter for ImageConverter {
    #[instrument(skip(self), fields(input = %input.display(), output = %output.display()))]
    fn convert(&self, input: &Path, output: &Path) -> Result<PathBuf, ConvertError> {
        if !input.is_file() {
            return Err(ConvertError::SourceNotFound {
                path: input.display().to_string(),
            });
        }
        let img = image::open(input).map_err(|e| ConvertError::Decode {
            path: input.display().to_string(),
            reason: e.to_string(),
        })?;
        let rgba = self.resize(&img);

        let encode_err = |reason: String| ConvertError::Encode {
            path: output.display().to_string(),
            reason,
        };
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| encode_err(e.to_string()))?;
        }
        let writer = BufWriter::new(File::create(output).map_err(|e| encode_err(e.to_string()))?);
        let (w, h) = rgba.dimensions();
        let is_png = output
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        let result = if is_png {
            PngEncoder::new(writer).write_image(rgba.as_raw(), w, h, image::ExtendedColorType::Rgba8)
        } else {
            WebPEncoder::new_lossless(writer).encode(rgba.as_raw(), w, h, image::ExtendedColorType::Rgba8)
        };
        result.map_err(|e| encode_err(e.to_string()))?;

        debug!(width = w, height = h, png = is_png, "Converted media");
        Ok(output.to_path_buf())
    }
}

/// Run `converter` on a blocking thread.
pub async fn convert_async(
    converter: Arc<dyn MediaConverter>,
    input: PathBuf,
    output: PathBuf,
) -> Result<PathBuf, ConvertError> {
    tokio::task::spawn_blocking(move || converter.convert(&input, &output))
        .await
        .map_err(|e| ConvertError::TaskFailed(e.to_string()))?
}
