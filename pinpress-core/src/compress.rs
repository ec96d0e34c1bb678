//! Source image capture for orders.
//!
//! The order keeps a downscaled JPEG rather than the upload itself; 800px
//! wide is plenty for a 7cm pin at 300 DPI.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use std::io::Cursor;
use thiserror::Error;

use crate::order::ImageData;

pub const MAX_WIDTH: u32 = 800;
pub const JPEG_QUALITY: u8 = 70;

#[derive(Debug, Error)]
pub enum CompressError {
    #[error("Invalid image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to compress image: {0}")]
    Encode(#[source] image::ImageError),
}

/// Target dimensions: width capped at [`MAX_WIDTH`], aspect kept, floored.
pub fn target_size(width: u32, height: u32) -> (u32, u32) {
    if width <= MAX_WIDTH {
        return (width, height);
    }
    let factor = MAX_WIDTH as f64 / width as f64;
    let h = (height as f64 * factor).floor().max(1.0) as u32;
    (MAX_WIDTH, h)
}

pub fn compress_for_order(bytes: &[u8]) -> Result<ImageData, CompressError> {
    let img = image::load_from_memory(bytes).map_err(CompressError::Decode)?;
    let (w, h) = target_size(img.width(), img.height());
    let img = if (w, h) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(w, h, FilterType::Triangle)
    };

    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        let encoder = JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
        img.to_rgb8()
            .write_with_encoder(encoder)
            .map_err(CompressError::Encode)?;
    }
    tracing::debug!(width = w, height = h, bytes = buffer.len(), "source image compressed");
    Ok(ImageData::from_jpeg(&buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    #[test]
    fn test_target_size() {
        assert_eq!(target_size(640, 480), (640, 480));
        assert_eq!(target_size(1600, 1201), (800, 600));
        assert_eq!(target_size(4000, 2), (800, 1));
    }

    #[test]
    fn test_compress_downscales_to_jpeg() {
        let src = RgbImage::from_pixel(1000, 500, Rgb([200, 40, 40]));
        let mut png = Cursor::new(Vec::new());
        src.write_to(&mut png, ImageFormat::Png).unwrap();

        let data = compress_for_order(png.get_ref()).unwrap();
        assert_eq!(data.mime(), Some("image/jpeg"));
        let decoded = image::load_from_memory(&data.decode().unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (800, 400));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(compress_for_order(b"nope"), Err(CompressError::Decode(_))));
    }
}
