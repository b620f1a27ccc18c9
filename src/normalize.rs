//! Image normalizer: turns one arbitrary image on disk into a square,
//! metadata-free, size-capped file, in place.
//!
//! The sequence is fixed: pad to a white square, resize to 1080×1080 when
//! oversized, then strip embedded metadata. Each step rewrites the file at
//! its own path; a failure part-way may leave intermediate state on disk,
//! which the caller treats as "this item failed" and moves on.

use std::fs;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{GenericImageView, Rgb, RgbImage};
use tracing::debug;

use crate::error::NormalizeError;

/// Neither dimension of a published image may exceed this.
pub const MAX_DIMENSION: u32 = 1080;

fn image_err(path: &Path, source: image::ImageError) -> NormalizeError {
    NormalizeError::Image {
        path: path.to_path_buf(),
        source,
    }
}

fn io_err(path: &Path, source: std::io::Error) -> NormalizeError {
    NormalizeError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Runs the full normalization sequence on `path`.
pub fn normalize(path: &Path) -> Result<(), NormalizeError> {
    pad_to_square(path)?;

    let (width, height) = image::image_dimensions(path).map_err(|e| image_err(path, e))?;
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        resize_to_cap(path)?;
    }

    strip_metadata(path)?;
    debug!(path = %path.display(), "image normalized");
    Ok(())
}

/// Draws the image centered on a white `D×D` canvas, `D = max(width, height)`,
/// and rewrites the file. Runs even when the image is already square; the
/// re-encode is a no-op dimension-wise, which keeps the step idempotent.
pub fn pad_to_square(path: &Path) -> Result<(), NormalizeError> {
    let img = image::open(path).map_err(|e| image_err(path, e))?;
    let (width, height) = img.dimensions();
    let side = width.max(height);

    let mut canvas = RgbImage::from_pixel(side, side, Rgb([255, 255, 255]));
    let offset_x = i64::from((side - width) / 2);
    let offset_y = i64::from((side - height) / 2);
    imageops::overlay(&mut canvas, &img.to_rgb8(), offset_x, offset_y);

    fs::remove_file(path).map_err(|e| io_err(path, e))?;
    canvas.save(path).map_err(|e| image_err(path, e))?;
    Ok(())
}

/// Resizes the (square by now) image to exactly 1080×1080. Catmull-Rom is the
/// bicubic filter in the `image` crate's filter set; it samples past the edge
/// with clamping, which behaves well for downscaling.
fn resize_to_cap(path: &Path) -> Result<(), NormalizeError> {
    let img = image::open(path).map_err(|e| image_err(path, e))?;
    let resized = imageops::resize(
        &img.to_rgb8(),
        MAX_DIMENSION,
        MAX_DIMENSION,
        FilterType::CatmullRom,
    );
    resized.save(path).map_err(|e| image_err(path, e))?;
    Ok(())
}

/// Drops every embedded profile and comment (EXIF, ICC, text chunks) by
/// decoding the pixel data and re-encoding only that. The encoders write no
/// ancillary blocks.
fn strip_metadata(path: &Path) -> Result<(), NormalizeError> {
    let img = image::open(path).map_err(|e| image_err(path, e))?;
    img.to_rgb8().save(path).map_err(|e| image_err(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn write_jpg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(width, height, Rgb([120, 90, 60]))
            .save(&path)
            .expect("write test jpg");
        path
    }

    /// Splices a minimal EXIF APP1 segment into an existing JPEG, right after
    /// the SOI marker, so tests have a metadata block to strip.
    fn inject_exif(path: &Path) {
        let original = fs::read(path).unwrap();
        assert_eq!(&original[..2], &[0xFF, 0xD8], "not a JPEG");
        let exif_body: &[u8] = b"Exif\0\0II*\x00\x08\x00\x00\x00\x00\x00";
        let len = (exif_body.len() + 2) as u16;
        let mut spliced = Vec::with_capacity(original.len() + exif_body.len() + 4);
        spliced.extend_from_slice(&original[..2]);
        spliced.extend_from_slice(&[0xFF, 0xE1]);
        spliced.extend_from_slice(&len.to_be_bytes());
        spliced.extend_from_slice(exif_body);
        spliced.extend_from_slice(&original[2..]);
        fs::write(path, spliced).unwrap();
    }

    #[test]
    fn portrait_image_pads_to_square_without_resize() {
        let tmp = tempdir().unwrap();
        let path = write_jpg(tmp.path(), "portrait.jpg", 600, 800);
        normalize(&path).expect("normalize succeeds");
        assert_eq!(image::image_dimensions(&path).unwrap(), (800, 800));
    }

    #[test]
    fn oversized_image_ends_up_exactly_at_the_cap() {
        let tmp = tempdir().unwrap();
        let path = write_jpg(tmp.path(), "wide.jpg", 2000, 1000);
        // After padding the canvas is 2000x2000, which exceeds the cap.
        normalize(&path).expect("normalize succeeds");
        assert_eq!(image::image_dimensions(&path).unwrap(), (1080, 1080));
    }

    #[test]
    fn padding_is_idempotent_on_square_images() {
        let tmp = tempdir().unwrap();
        let path = write_jpg(tmp.path(), "square.jpg", 500, 500);
        pad_to_square(&path).unwrap();
        pad_to_square(&path).unwrap();
        assert_eq!(image::image_dimensions(&path).unwrap(), (500, 500));
    }

    #[test]
    fn normalize_strips_exif_block() {
        let tmp = tempdir().unwrap();
        let path = write_jpg(tmp.path(), "tagged.jpg", 600, 800);
        inject_exif(&path);
        assert!(fs::read(&path)
            .unwrap()
            .windows(4)
            .any(|w| w == b"Exif"));

        normalize(&path).expect("normalize succeeds");
        let stripped = fs::read(&path).unwrap();
        assert!(!stripped.windows(4).any(|w| w == b"Exif"));
    }

    #[test]
    fn unreadable_file_surfaces_a_single_failure() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("garbage.jpg");
        fs::write(&path, b"definitely not an image").unwrap();
        assert!(normalize(&path).is_err());
    }

    #[test]
    fn png_input_is_padded_in_place_as_png() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("shot.png");
        RgbImage::from_pixel(30, 10, Rgb([1, 2, 3]))
            .save(&path)
            .unwrap();
        normalize(&path).expect("normalize succeeds");
        assert_eq!(image::image_dimensions(&path).unwrap(), (30, 30));
    }
}
