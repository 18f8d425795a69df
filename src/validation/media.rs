//! Image inspection for tray icons and sticker files.

use std::io::Cursor;

use image::codecs::webp::WebPDecoder;
use image::error::{ImageFormatHint, UnsupportedError};
use image::{AnimationDecoder, ImageDecoder, ImageError, ImageFormat, ImageReader};

/// What validation needs to know about an image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    /// Per-frame delays in milliseconds. Empty for still images.
    pub frame_delays_ms: Vec<u32>,
}

impl MediaInfo {
    pub fn is_animated(&self) -> bool {
        self.frame_delays_ms.len() > 1
    }

    pub fn frame_count(&self) -> usize {
        self.frame_delays_ms.len().max(1)
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.frame_delays_ms.iter().map(|&d| u64::from(d)).sum()
    }

    pub fn shortest_frame_ms(&self) -> Option<u32> {
        self.frame_delays_ms.iter().copied().min()
    }
}

/// Inspect WebP bytes, decoding every frame of an animation to read its
/// delay.
pub fn inspect_webp(bytes: &[u8]) -> image::ImageResult<MediaInfo> {
    let decoder = WebPDecoder::new(Cursor::new(bytes))?;
    let (width, height) = decoder.dimensions();
    let frame_delays_ms = if decoder.has_animation() {
        decoder
            .into_frames()
            .map(|frame| {
                frame.map(|f| {
                    let (numer, denom) = f.delay().numer_denom_ms();
                    if denom == 0 { 0 } else { numer / denom }
                })
            })
            .collect::<image::ImageResult<Vec<u32>>>()?
    } else {
        Vec::new()
    };
    Ok(MediaInfo {
        format: ImageFormat::WebP,
        width,
        height,
        frame_delays_ms,
    })
}

/// Dimensions and format of any supported still image (tray icons).
pub fn inspect_still(bytes: &[u8]) -> image::ImageResult<MediaInfo> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = reader.format().ok_or_else(|| {
        ImageError::Unsupported(UnsupportedError::from(ImageFormatHint::Unknown))
    })?;
    let (width, height) = reader.into_dimensions()?;
    Ok(MediaInfo {
        format,
        width,
        height,
        frame_delays_ms: Vec::new(),
    })
}
