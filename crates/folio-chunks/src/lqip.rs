//! Low-quality image placeholders.
//!
//! A local image is shrunk to a fixed width, re-encoded as a small JPEG and
//! returned as a `data:` URI that can be inlined in the page.

use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use image::ImageReader;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};

/// Generated placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lqip {
    /// `data:image/jpeg;base64,...` URI of the thumbnail.
    pub data_uri: String,
    /// Width of the source image.
    pub width: u32,
    /// Height of the source image.
    pub height: u32,
}

/// Placeholder generation error.
#[derive(Debug, thiserror::Error)]
pub enum LqipError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("image has no pixels")]
    Empty,
}

/// Build a placeholder for the image at `path`.
///
/// The thumbnail is `width` pixels wide with the source aspect ratio kept
/// (height at least 1) and encoded at the given JPEG `quality` (1-100).
pub fn generate(path: &Path, width: u32, quality: u8) -> Result<Lqip, LqipError> {
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    let (source_width, source_height) = (image.width(), image.height());
    if source_width == 0 || source_height == 0 {
        return Err(LqipError::Empty);
    }

    let width = width.max(1);
    let height = thumbnail_height(source_width, source_height, width);
    let rgb = image.to_rgb8();
    let small = imageops::resize(&rgb, width, height, FilterType::CatmullRom);

    let mut bytes = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100)).encode_image(&small)?;

    Ok(Lqip {
        data_uri: format!(
            "data:image/jpeg;base64,{}",
            BASE64_STANDARD.encode(bytes.get_ref())
        ),
        width: source_width,
        height: source_height,
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn thumbnail_height(source_width: u32, source_height: u32, width: u32) -> u32 {
    let height = f64::from(source_height) * f64::from(width) / f64::from(source_width);
    (height.round() as u32).max(1)
}
