//! Best-effort image enhancement ahead of OCR.
//!
//! A rasterized page is converted to grayscale, then contrast and
//! sharpness are scaled. Both adjustments interpolate between the image and
//! a degenerate version of it: a flat image at the mean luminance for
//! contrast, a 3x3 smoothed copy for sharpness. A factor of 1.0 is the
//! identity, 0.0 yields the degenerate image and values above 1.0
//! extrapolate away from it.

use image::{DynamicImage, GrayImage, Luma};

use crate::error::{Error, Result};
use crate::options::EnhanceOptions;

/// Enhance an image for recognition.
///
/// Never fails: if the transform cannot be applied the original image is
/// returned untouched and a warning is logged. The result always has the
/// same pixel dimensions as the input.
pub fn enhance(image: DynamicImage, options: &EnhanceOptions) -> DynamicImage {
    match try_enhance(&image, options) {
        Ok(gray) => DynamicImage::ImageLuma8(gray),
        Err(e) => {
            log::warn!("Image enhancement skipped, using original image: {}", e);
            image
        }
    }
}

/// Grayscale, contrast and sharpness in that order.
pub fn try_enhance(image: &DynamicImage, options: &EnhanceOptions) -> Result<GrayImage> {
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::Other(format!(
            "cannot enhance a {}x{} image",
            image.width(),
            image.height()
        )));
    }
    for (name, factor) in [
        ("contrast", options.contrast),
        ("sharpness", options.sharpness),
    ] {
        if !factor.is_finite() || factor < 0.0 {
            return Err(Error::Other(format!("invalid {} factor {}", name, factor)));
        }
    }

    let gray = image.to_luma8();
    let gray = adjust_contrast(&gray, options.contrast);
    Ok(adjust_sharpness(&gray, options.sharpness))
}

/// Scale contrast around the mean luminance.
pub fn adjust_contrast(image: &GrayImage, factor: f32) -> GrayImage {
    let pixels = image.as_raw();
    if pixels.is_empty() {
        return image.clone();
    }
    let sum: u64 = pixels.iter().map(|&p| p as u64).sum();
    let mean = (sum as f64 / pixels.len() as f64 + 0.5).floor() as f32;

    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = blend(mean, pixel.0[0] as f32, factor);
    }
    out
}

/// Scale sharpness against a smoothed copy. Border pixels have no full
/// neighbourhood and keep their value in the smoothed copy.
pub fn adjust_sharpness(image: &GrayImage, factor: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut out = image.clone();
    if width < 3 || height < 3 {
        return out;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut acc = 0u32;
            for dy in 0..3 {
                for dx in 0..3 {
                    let weight = if dx == 1 && dy == 1 { 5 } else { 1 };
                    acc += weight * image.get_pixel(x + dx - 1, y + dy - 1).0[0] as u32;
                }
            }
            let smoothed = acc as f32 / 13.0;
            let original = image.get_pixel(x, y).0[0] as f32;
            out.put_pixel(x, y, Luma([blend(smoothed, original, factor)]));
        }
    }
    out
}

#[inline]
fn blend(degenerate: f32, value: f32, factor: f32) -> u8 {
    (degenerate + factor * (value - degenerate))
        .round()
        .clamp(0.0, 255.0) as u8
}
