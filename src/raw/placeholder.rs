//! Placeholder preview synthesis
//!
//! Phocus expects two preview JPEGs next to every catalog record. The real
//! renders come from the app itself; the importer stands in solid-black
//! frames of the right dimensions so the grid and detail views work.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgba, RgbaImage};

use crate::error::ImportError;

/// Thumbnail tier dimensions expected by the host's grid view.
pub const THUMBNAIL_SIZE: (u32, u32) = (400, 300);

/// Middle preview tier dimensions.
pub const MIDDLE_SIZE: (u32, u32) = (1378, 1033);

/// JPEG quality used for every synthesized preview.
pub const PLACEHOLDER_QUALITY: f32 = 0.92;

/// Write a fully opaque solid-black JPEG of the given size.
///
/// The raster is built as 8-bit RGBA with alpha forced opaque, then encoded
/// without the alpha channel (JPEG carries none). `quality` is clamped to
/// [0, 1]. Deterministic for identical inputs; the only side effect is the
/// file itself.
pub fn write_black_jpeg(
    path: &Path,
    width: u32,
    height: u32,
    quality: f32,
) -> Result<(), ImportError> {
    assert!(width > 0 && height > 0);

    let canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
    let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();

    let quality = ((quality.clamp(0.0, 1.0) * 100.0).round() as u8).max(1);
    let file = File::create(path)?;
    let mut encoder = JpegEncoder::new_with_quality(BufWriter::new(file), quality);
    encoder.encode_image(&rgb)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_opaque_black_frames_at_requested_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Thumbnail_test.jpg");

        write_black_jpeg(&path, THUMBNAIL_SIZE.0, THUMBNAIL_SIZE.1, PLACEHOLDER_QUALITY).unwrap();

        assert_eq!(image::image_dimensions(&path).unwrap(), THUMBNAIL_SIZE);

        let decoded = image::open(&path).unwrap().to_rgb8();
        let center = decoded.get_pixel(THUMBNAIL_SIZE.0 / 2, THUMBNAIL_SIZE.1 / 2);
        assert!(center.0.iter().all(|&c| c <= 2), "not black: {center:?}");
    }

    #[test]
    fn middle_tier_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Middle_test.jpg");

        write_black_jpeg(&path, MIDDLE_SIZE.0, MIDDLE_SIZE.1, PLACEHOLDER_QUALITY).unwrap();

        assert_eq!(image::image_dimensions(&path).unwrap(), MIDDLE_SIZE);
    }

    #[test]
    fn out_of_range_quality_is_clamped() {
        let dir = tempfile::tempdir().unwrap();

        let high = dir.path().join("high.jpg");
        write_black_jpeg(&high, 16, 16, 7.5).unwrap();
        assert_eq!(image::image_dimensions(&high).unwrap(), (16, 16));

        let low = dir.path().join("low.jpg");
        write_black_jpeg(&low, 16, 16, -3.0).unwrap();
        assert_eq!(image::image_dimensions(&low).unwrap(), (16, 16));
    }
}
